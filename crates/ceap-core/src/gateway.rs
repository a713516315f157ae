//! Submission gateway: the three-outcome write policy.
//!
//! A write that yields no identifier is ambiguous on its own. It can mean
//! that no store is configured (or reachable), or that a working store
//! rejected the document. The gateway always re-checks availability after a
//! failed write and maps the result onto exactly one [`SubmissionOutcome`]:
//!
//! | Writer | Probe | Outcome |
//! |--------|-------|---------|
//! | id | not consulted | [`Saved`](SubmissionOutcome::Saved) |
//! | error | unavailable | [`Accepted`](SubmissionOutcome::Accepted) (success, null id, warning) |
//! | error | available | [`Failed`](SubmissionOutcome::Failed) (server error) |
//!
//! Each submission is written once, with no retry.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::attachment::{self, Bucket};
use crate::error::{ValidationError, WriteError};
use crate::models::{validate_fields, ChatbotLead, Collection, ContactMessage, Lead};
use crate::store::{to_document, Document, DocumentStore};

/// Warning returned with an acknowledged-but-not-saved submission.
pub const NOT_SAVED_WARNING: &str = "DB non configurato: richiesta ricevuta ma non salvata.";

/// Answers whether a usable store handle exists right now.
///
/// Re-evaluated on every call; the handle may be provisioned lazily and its
/// health may change between requests.
#[derive(Clone)]
pub struct StoreProbe {
    store: Option<Arc<dyn DocumentStore>>,
}

impl StoreProbe {
    pub fn new(store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self { store }
    }

    pub async fn is_available(&self) -> bool {
        match &self.store {
            Some(store) => store.ping().await,
            None => false,
        }
    }
}

/// Persists one document per call into a named collection.
#[derive(Clone)]
pub struct DocumentWriter {
    store: Option<Arc<dyn DocumentStore>>,
}

impl DocumentWriter {
    pub fn new(store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self { store }
    }

    /// Stamps `created_at`/`updated_at` and inserts `document`.
    ///
    /// Single attempt. Every failure, including a missing store, is a
    /// [`WriteError`].
    pub async fn write(&self, collection: &str, mut document: Document) -> Result<String, WriteError> {
        if collection.is_empty() {
            return Err(WriteError::EmptyCollection);
        }
        let store = self.store.as_ref().ok_or(WriteError::NoStore)?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        document.insert("created_at".to_string(), Value::String(now.clone()));
        document.insert("updated_at".to_string(), Value::String(now));

        store
            .insert(collection, document)
            .await
            .map_err(|source| WriteError::Store {
                collection: collection.to_string(),
                source,
            })
    }
}

/// Kind of inbound submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Lead,
    Contact,
    ChatbotLead,
}

impl SubmissionKind {
    pub fn collection(&self) -> Collection {
        match self {
            SubmissionKind::Lead | SubmissionKind::ChatbotLead => Collection::Lead,
            SubmissionKind::Contact => Collection::ContactMessage,
        }
    }

    /// Bucket for attachments uploaded with this kind of submission.
    pub fn bucket(&self) -> Bucket {
        match self {
            SubmissionKind::Lead => Bucket::Leads,
            SubmissionKind::Contact => Bucket::Contacts,
            SubmissionKind::ChatbotLead => Bucket::Uploads,
        }
    }

    /// Detail reported to the caller when a reachable store rejects the write.
    pub fn failure_detail(&self) -> &'static str {
        match self {
            SubmissionKind::Lead | SubmissionKind::ChatbotLead => {
                "Errore nel salvataggio della richiesta"
            }
            SubmissionKind::Contact => "Errore nel salvataggio del messaggio",
        }
    }
}

/// A file received alongside a form submission, before embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Caller-visible result of a submission.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Persisted under the given identifier.
    Saved(String),
    /// Accepted while no store is available; nothing was persisted.
    Accepted { warning: &'static str },
    /// The store is reachable but the write failed.
    Failed {
        kind: SubmissionKind,
        error: WriteError,
    },
}

impl SubmissionOutcome {
    /// Identifier to report to the caller, `None` unless saved.
    pub fn id(&self) -> Option<&str> {
        match self {
            SubmissionOutcome::Saved(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, SubmissionOutcome::Failed { .. })
    }
}

/// Errors that stop a submission before the outcome policy runs.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Orchestrates embedding, writing and probing for every submission kind.
#[derive(Clone)]
pub struct SubmissionGateway {
    writer: DocumentWriter,
    probe: StoreProbe,
}

impl SubmissionGateway {
    pub fn new(store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self {
            writer: DocumentWriter::new(store.clone()),
            probe: StoreProbe::new(store),
        }
    }

    pub fn probe(&self) -> &StoreProbe {
        &self.probe
    }

    pub async fn submit_lead(
        &self,
        mut lead: Lead,
        upload: Option<Upload>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        validate_fields(&lead)?;
        let kind = SubmissionKind::Lead;
        lead.attachment = upload.map(|u| embed_upload(kind, u));
        let doc = to_document(&lead)?;
        Ok(self.submit(kind, doc).await)
    }

    pub async fn submit_contact(
        &self,
        mut message: ContactMessage,
        upload: Option<Upload>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        validate_fields(&message)?;
        let kind = SubmissionKind::Contact;
        message.attachment = upload.map(|u| embed_upload(kind, u));
        let doc = to_document(&message)?;
        Ok(self.submit(kind, doc).await)
    }

    pub async fn submit_chatbot_lead(
        &self,
        lead: ChatbotLead,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        validate_fields(&lead)?;
        let doc = to_document(&lead)?;
        Ok(self.submit(SubmissionKind::ChatbotLead, doc).await)
    }

    async fn submit(&self, kind: SubmissionKind, doc: Document) -> SubmissionOutcome {
        let collection = kind.collection();
        match self.writer.write(collection.as_str(), doc).await {
            Ok(id) => {
                tracing::info!(%collection, %id, "submission saved");
                SubmissionOutcome::Saved(id)
            }
            Err(error) => {
                if self.probe.is_available().await {
                    tracing::error!(%collection, %error, "store reachable but write failed");
                    SubmissionOutcome::Failed { kind, error }
                } else {
                    tracing::warn!(%collection, %error, "store unavailable, submission accepted without persistence");
                    SubmissionOutcome::Accepted {
                        warning: NOT_SAVED_WARNING,
                    }
                }
            }
        }
    }
}

fn embed_upload(kind: SubmissionKind, upload: Upload) -> attachment::Attachment {
    let att = attachment::embed(kind.bucket(), upload.bytes, upload.filename, upload.content_type);
    let summary = att.summary();
    tracing::debug!(filename = %summary.filename, size = summary.size, "attachment embedded");
    att
}
