//! Attachment embedding.
//!
//! Uploaded files are not stored on their own. [`embed`] turns the raw
//! payload into an [`Attachment`] fragment that the submission gateway nests
//! inside the parent lead or contact document, so the attachment never gets
//! an identifier of its own.
//!
//! The payload is kept inline as base64 in the JSON document. Large blobs
//! belong in external object storage, which this backend does not provide.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Logical bucket an attachment was uploaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Leads,
    Contacts,
    Uploads,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Leads => "leads",
            Bucket::Contacts => "contacts",
            Bucket::Uploads => "uploads",
        }
    }
}

/// Attachment fragment embedded in a parent document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Always `None`: the attachment lives inside its parent document.
    pub file_id: Option<String>,
    pub bucket: Bucket,
    pub filename: String,
    pub content_type: Option<String>,
    /// Byte length of `blob`, computed here and never taken from the client.
    pub size: u64,
    /// Hex-encoded SHA-256 of `blob`.
    pub sha256: String,
    #[serde(serialize_with = "blob_to_base64", deserialize_with = "blob_from_base64")]
    pub blob: Vec<u8>,
}

/// What callers see of an embedded attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentSummary {
    pub id: Option<String>,
    pub filename: String,
    pub size: u64,
}

impl Attachment {
    pub fn summary(&self) -> AttachmentSummary {
        AttachmentSummary {
            id: self.file_id.clone(),
            filename: self.filename.clone(),
            size: self.size,
        }
    }
}

/// Converts an uploaded payload into an embeddable attachment fragment.
///
/// Pure; touches no store.
pub fn embed(
    bucket: Bucket,
    raw: Vec<u8>,
    filename: impl Into<String>,
    content_type: Option<String>,
) -> Attachment {
    let sha256 = hex::encode(Sha256::digest(&raw));
    Attachment {
        file_id: None,
        bucket,
        filename: filename.into(),
        content_type,
        size: raw.len() as u64,
        sha256,
        blob: raw,
    }
}

fn blob_to_base64<S: Serializer>(blob: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(blob))
}

fn blob_from_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}
