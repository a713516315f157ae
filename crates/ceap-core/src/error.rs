//! Typed errors raised by the core gateways.
//!
//! Only two failures ever leave the core as errors: a submission that fails
//! validation before touching the store, and a write that the store
//! rejected. An unreachable store is never an error on its own; the
//! gateways absorb it into a degraded outcome.

use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// A submitted field is missing or malformed.
///
/// Raised before any store interaction and surfaced to callers as a client
/// error naming the offending field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending field as the caller sent it (e.g. `email`, `items[2].code`).
    pub field: String,
    /// Human-readable cause.
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a required field that was absent or blank.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "field required")
    }
}

impl From<ValidationErrors> for ValidationError {
    /// Reports the first failing field, by path, of a derived validation.
    fn from(errors: ValidationErrors) -> Self {
        let mut failures = Vec::new();
        collect_failures("", &errors, &mut failures);
        failures.sort();
        failures
            .into_iter()
            .next()
            .map(|(field, reason)| Self::new(field, reason))
            .unwrap_or_else(|| Self::new("body", "invalid value"))
    }
}

fn collect_failures(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for e in list {
                    let reason = match &e.message {
                        Some(message) => message.to_string(),
                        None => e.code.to_string(),
                    };
                    out.push((path.clone(), reason));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_failures(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (i, inner) in items {
                    collect_failures(&format!("{}[{}]", path, i), inner, out);
                }
            }
        }
    }
}

/// The document writer could not produce an identifier.
///
/// Connectivity, constraint and serialization failures all collapse into
/// this one kind. Callers consult the availability probe to tell an absent
/// store from a broken one.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("no document store configured")]
    NoStore,

    #[error("collection name must not be empty")]
    EmptyCollection,

    #[error("store rejected write to '{collection}': {source}")]
    Store {
        collection: String,
        #[source]
        source: anyhow::Error,
    },
}
