//! Inquiry and catalog data models.
//!
//! Field rules are declared with `validator` derives and checked through
//! [`validate_fields`], so a document is never assembled from fields that
//! failed their schema. Serialized field names match the documents stored
//! in each collection.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::attachment::Attachment;
use crate::error::ValidationError;

/// Source tag stamped on leads coming from the web form.
pub const DEFAULT_LEAD_SOURCE: &str = "webform";
/// Topic used when a contact message does not name one.
pub const DEFAULT_CONTACT_TOPIC: &str = "Generale";
/// Channel tag stamped on chatbot leads.
pub const DEFAULT_CHATBOT_CHANNEL: &str = "chatbot";

/// Named document collections.
///
/// Names are the lowercased entity names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Lead,
    ContactMessage,
    ComponentItem,
    File,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Lead => "lead",
            Collection::ContactMessage => "contactmessage",
            Collection::ComponentItem => "componentitem",
            Collection::File => "file",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested part inside a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LeadItem {
    /// Manufacturer code or part number.
    #[validate(length(min = 1, message = "field required"))]
    pub code: String,
    #[serde(default)]
    #[validate(range(min = 1, message = "must be greater than or equal to 1"))]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub brand_preference: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "must be greater than or equal to 0"))]
    pub target_price: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Sales lead submitted through the web form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Lead {
    #[validate(length(min = 1, message = "field required"))]
    pub company: String,
    #[validate(length(min = 1, message = "field required"))]
    pub name: String,
    #[validate(email(message = "value is not a valid email address"))]
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<LeadItem>,
    pub message: Option<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl Lead {
    /// Builds a web-form lead with the default source tag and no attachment.
    pub fn new(
        company: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            name: name.into(),
            email: email.into(),
            phone: None,
            items: Vec::new(),
            message: None,
            source: DEFAULT_LEAD_SOURCE.to_string(),
            attachment: None,
        }
    }
}

/// Message submitted through the contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ContactMessage {
    #[validate(length(min = 1, message = "field required"))]
    pub company: String,
    #[validate(length(min = 1, message = "field required"))]
    pub name: String,
    #[validate(email(message = "value is not a valid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub topic: String,
    #[validate(length(min = 1, message = "field required"))]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

/// Lead collected by the chatbot. Every contact field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChatbotLead {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "value is not a valid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<LeadItem>,
    #[serde(default = "default_chatbot_channel")]
    pub channel: String,
}

fn default_chatbot_channel() -> String {
    DEFAULT_CHATBOT_CHANNEL.to_string()
}

/// Catalog record. Populated out of band, only ever read by the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ComponentItem {
    #[validate(length(min = 1, message = "field required"))]
    pub code: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// `SMD` or `PTH`.
    #[serde(default)]
    pub mount: Option<String>,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Runs the derived field rules of `value`, naming the first failing field.
pub fn validate_fields<T: Validate>(value: &T) -> Result<(), ValidationError> {
    value.validate().map_err(ValidationError::from)
}
