//! Component catalog reads with static fallback.
//!
//! [`CatalogGateway::list_components`] queries the `componentitem`
//! collection through a [`DocumentReader`]. When the query yields nothing
//! (no store, unreachable store, failed query or zero rows) the injected
//! [`FallbackCatalog`] answers instead, truncated to the same limit.
//!
//! Documents leaving this module never expose the store's internal
//! identifier: `_id` is renamed to `id` on every real result.

use std::sync::Arc;

use serde_json::Value;

use crate::models::{Collection, ComponentItem};
use crate::store::{to_document, Document, DocumentStore, Filter, INTERNAL_ID_FIELD};

/// Default number of catalog records returned.
pub const DEFAULT_LIMIT: usize = 50;

/// Equality query over the component catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentQuery {
    pub kind: Option<String>,
    pub mount: Option<String>,
    pub package: Option<String>,
    pub brand: Option<String>,
}

impl ComponentQuery {
    /// Builds the store filter from the supplied, non-empty fields only.
    ///
    /// An omitted or empty parameter is left out of the filter entirely, so
    /// it never matches documents holding an empty string.
    pub fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        let fields = [
            ("type", &self.kind),
            ("mount", &self.mount),
            ("package", &self.package),
            ("brand", &self.brand),
        ];
        for (key, value) in fields {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                filter.insert(key.to_string(), v.to_string());
            }
        }
        filter
    }
}

/// Version tag of the built-in demo dataset.
pub const DEMO_CATALOG_VERSION: &str = "demo-2024.1";

/// Fixed component records served when the real catalog yields nothing.
#[derive(Debug, Clone)]
pub struct FallbackCatalog {
    version: String,
    records: Vec<ComponentItem>,
}

impl FallbackCatalog {
    pub fn new(version: impl Into<String>, records: Vec<ComponentItem>) -> Self {
        Self {
            version: version.into(),
            records,
        }
    }

    /// The five canonical demo components.
    pub fn demo() -> Self {
        let record = |code: &str, brand: &str, kind: &str, mount: &str, package: &str, notes: &str| {
            ComponentItem {
                code: code.to_string(),
                brand: Some(brand.to_string()),
                kind: Some(kind.to_string()),
                mount: Some(mount.to_string()),
                package: Some(package.to_string()),
                notes: Some(notes.to_string()),
            }
        };
        Self::new(
            DEMO_CATALOG_VERSION,
            vec![
                record("BSS138", "ON Semi", "MOSFET", "SMD", "SOT-23", "N-MOSFET 50V"),
                record("LM358", "Texas Instruments", "IC", "PTH", "DIP-8", "Dual op-amp"),
                record("ATmega328P", "Microchip", "Microcontrollore", "SMD", "TQFP-32", "8-bit MCU"),
                record("1N4148", "Vishay", "Diodo", "PTH", "DO-35", "Small signal diode"),
                record("FUS-1206-1A", "Littelfuse", "Fusibile", "SMD", "1206", "Fuse 1A"),
            ],
        )
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn records(&self) -> &[ComponentItem] {
        &self.records
    }

    /// At most `limit` records, as documents.
    pub fn documents(&self, limit: usize) -> Vec<Document> {
        self.records
            .iter()
            .take(limit)
            .filter_map(|r| to_document(r).ok())
            .collect()
    }
}

impl Default for FallbackCatalog {
    fn default() -> Self {
        Self::demo()
    }
}

/// Bounded equality reads against a named collection.
#[derive(Clone)]
pub struct DocumentReader {
    store: Option<Arc<dyn DocumentStore>>,
}

impl DocumentReader {
    pub fn new(store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self { store }
    }

    /// Runs the query. A missing store or a failing query reads as empty.
    pub async fn query(&self, collection: &str, filter: &Filter, limit: usize) -> Vec<Document> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        match store.find(collection, filter, limit).await {
            Ok(mut docs) => {
                docs.truncate(limit);
                docs
            }
            Err(e) => {
                tracing::warn!(collection, error = %e, "catalog query failed, treating as empty");
                Vec::new()
            }
        }
    }
}

/// Catalog reads: real documents when there are any, fallback otherwise.
#[derive(Clone)]
pub struct CatalogGateway {
    reader: DocumentReader,
    fallback: FallbackCatalog,
}

impl CatalogGateway {
    pub fn new(store: Option<Arc<dyn DocumentStore>>, fallback: FallbackCatalog) -> Self {
        Self {
            reader: DocumentReader::new(store),
            fallback,
        }
    }

    /// Lists components matching `query`, never more than `limit`.
    pub async fn list_components(&self, query: &ComponentQuery, limit: usize) -> Vec<Document> {
        let filter = query.filter();
        let docs = self
            .reader
            .query(Collection::ComponentItem.as_str(), &filter, limit)
            .await;

        if docs.is_empty() {
            tracing::debug!(
                version = self.fallback.version(),
                "no catalog rows, serving fallback catalog"
            );
            return self.fallback.documents(limit);
        }

        docs.into_iter().map(publish_id).collect()
    }
}

/// Renames the internal identifier to the public `id` field.
pub fn publish_id(mut doc: Document) -> Document {
    if let Some(internal) = doc.remove(INTERNAL_ID_FIELD) {
        let id = match internal {
            Value::String(s) => s,
            other => other.to_string(),
        };
        doc.insert("id".to_string(), Value::String(id));
    }
    doc
}
