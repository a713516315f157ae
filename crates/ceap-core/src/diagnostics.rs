//! Store health introspection.
//!
//! [`probe_health`] never fails: every downstream problem is folded into the
//! report as a short message string.

use std::sync::Arc;

use serde::Serialize;

use crate::store::DocumentStore;

/// Maximum number of collection names included in a report.
pub const MAX_COLLECTIONS_PREVIEW: usize = 10;
/// Maximum length, in characters, of an error message included in a report.
pub const MAX_ERROR_CHARS: usize = 50;

/// Diagnostic report served by `GET /test` and `ceap check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

impl HealthReport {
    pub fn is_connected(&self) -> bool {
        self.connection_status == "Connected"
    }
}

/// Which connection settings are present, independent of whether they work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigPresence {
    pub url_set: bool,
    pub name_set: bool,
}

fn set_marker(set: bool) -> String {
    if set { "✅ Set" } else { "❌ Not Set" }.to_string()
}

/// Truncates `message` to at most [`MAX_ERROR_CHARS`] characters.
pub fn truncate_message(message: &str) -> String {
    message.chars().take(MAX_ERROR_CHARS).collect()
}

/// Builds the diagnostic report for `store`.
pub async fn probe_health(
    store: Option<&Arc<dyn DocumentStore>>,
    presence: ConfigPresence,
) -> HealthReport {
    let mut report = HealthReport {
        backend: "✅ Running".to_string(),
        database: "❌ Not Available".to_string(),
        database_url: set_marker(presence.url_set),
        database_name: set_marker(presence.name_set),
        connection_status: "Not Connected".to_string(),
        collections: Vec::new(),
    };

    let Some(store) = store else {
        return report;
    };

    if !store.ping().await {
        report.database = format!("⚠️  Configured but unreachable ({})", store.name());
        return report;
    }

    report.database = "✅ Available".to_string();
    report.connection_status = "Connected".to_string();

    match store.list_collections().await {
        Ok(mut names) => {
            names.truncate(MAX_COLLECTIONS_PREVIEW);
            report.collections = names;
            report.database = "✅ Connected & Working".to_string();
        }
        Err(e) => {
            report.database = format!("⚠️  Connected but Error: {}", truncate_message(&e.to_string()));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use crate::store::{Document, Filter};
    use anyhow::{bail, Result};
    use async_trait::async_trait;

    struct BrokenListing;

    #[async_trait]
    impl DocumentStore for BrokenListing {
        fn name(&self) -> &str {
            "broken"
        }
        async fn ping(&self) -> bool {
            true
        }
        async fn insert(&self, _: &str, _: Document) -> Result<String> {
            bail!("read-only")
        }
        async fn find(&self, _: &str, _: &Filter, _: usize) -> Result<Vec<Document>> {
            Ok(Vec::new())
        }
        async fn list_collections(&self) -> Result<Vec<String>> {
            bail!("listCollections not permitted for this user on database ceap_production_replica")
        }
    }

    #[tokio::test]
    async fn test_no_store() {
        let report = probe_health(None, ConfigPresence::default()).await;
        assert_eq!(report.backend, "✅ Running");
        assert_eq!(report.database, "❌ Not Available");
        assert_eq!(report.database_url, "❌ Not Set");
        assert!(!report.is_connected());
        assert!(report.collections.is_empty());
    }

    #[tokio::test]
    async fn test_collection_preview_is_capped() {
        let store = Arc::new(InMemoryStore::default());
        for i in 0..15 {
            store.insert(&format!("c{:02}", i), Document::new()).await.unwrap();
        }
        let handle: Arc<dyn DocumentStore> = store;
        let presence = ConfigPresence {
            url_set: true,
            name_set: true,
        };
        let report = probe_health(Some(&handle), presence).await;
        assert!(report.is_connected());
        assert_eq!(report.collections.len(), MAX_COLLECTIONS_PREVIEW);
        assert_eq!(report.database, "✅ Connected & Working");
        assert_eq!(report.database_name, "✅ Set");
    }

    #[tokio::test]
    async fn test_unreachable_store_reports_without_collections() {
        let store = Arc::new(InMemoryStore::new("ceap"));
        store.set_reachable(false);
        let handle: Arc<dyn DocumentStore> = store;
        let report = probe_health(Some(&handle), ConfigPresence::default()).await;
        assert!(!report.is_connected());
        assert!(report.database.contains("unreachable"));
        assert!(report.collections.is_empty());
    }

    #[tokio::test]
    async fn test_listing_error_is_truncated() {
        let handle: Arc<dyn DocumentStore> = Arc::new(BrokenListing);
        let report = probe_health(Some(&handle), ConfigPresence::default()).await;
        assert!(report.is_connected());
        let message = report
            .database
            .strip_prefix("⚠️  Connected but Error: ")
            .unwrap();
        assert_eq!(message.chars().count(), MAX_ERROR_CHARS);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let s = "è".repeat(80);
        assert_eq!(truncate_message(&s).chars().count(), MAX_ERROR_CHARS);
    }
}
