//! Multipart form intake.
//!
//! Collects the text fields and the optional `file` part of a form
//! submission, then turns them into validated-shape models. Field-level
//! validation proper happens in the core models; this module only checks
//! presence and decodes `items_json`.

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use ceap_core::error::ValidationError;
use ceap_core::gateway::Upload;
use ceap_core::models::{ContactMessage, Lead, LeadItem, DEFAULT_CONTACT_TOPIC, DEFAULT_LEAD_SOURCE};

/// Name of the multipart part carrying the attachment.
pub const FILE_FIELD: &str = "file";

/// Raw contents of a submitted form.
#[derive(Debug, Default)]
pub struct FormSubmission {
    fields: HashMap<String, String>,
    upload: Option<Upload>,
}

impl FormSubmission {
    pub fn new(fields: HashMap<String, String>, upload: Option<Upload>) -> Self {
        Self { fields, upload }
    }

    /// Reads every part of `multipart`.
    ///
    /// A `file` part with neither a filename nor any bytes is how browsers
    /// send an empty file input; it is treated as no upload.
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = FormSubmission::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == FILE_FIELD {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?.to_vec();
                if filename.as_deref().unwrap_or("").is_empty() && bytes.is_empty() {
                    continue;
                }
                form.upload = Some(Upload {
                    filename: filename.unwrap_or_else(|| "upload".to_string()),
                    content_type,
                    bytes,
                });
            } else {
                let text = field.text().await?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    fn required(&self, name: &str) -> Result<String, ValidationError> {
        self.optional(name)
            .ok_or_else(|| ValidationError::missing(name))
    }

    fn optional(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Builds a web-form lead. `items_json`, when present, must be a JSON
    /// array of lead items.
    pub fn into_lead(self) -> Result<(Lead, Option<Upload>), ValidationError> {
        let items = match self.optional("items_json") {
            Some(raw) => parse_items(&raw)?,
            None => Vec::new(),
        };
        let lead = Lead {
            company: self.required("company")?,
            name: self.required("name")?,
            email: self.required("email")?,
            phone: self.optional("phone"),
            items,
            message: self.optional("message"),
            source: DEFAULT_LEAD_SOURCE.to_string(),
            attachment: None,
        };
        Ok((lead, self.upload))
    }

    pub fn into_contact(self) -> Result<(ContactMessage, Option<Upload>), ValidationError> {
        let message = ContactMessage {
            company: self.required("company")?,
            name: self.required("name")?,
            email: self.required("email")?,
            phone: self.optional("phone"),
            topic: self
                .optional("topic")
                .unwrap_or_else(|| DEFAULT_CONTACT_TOPIC.to_string()),
            message: self.required("message")?,
            attachment: None,
        };
        Ok((message, self.upload))
    }
}

fn parse_items(raw: &str) -> Result<Vec<LeadItem>, ValidationError> {
    serde_json::from_str::<Vec<LeadItem>>(raw)
        .map_err(|e| ValidationError::new("items_json", format!("invalid JSON array of items: {}", e)))
}
