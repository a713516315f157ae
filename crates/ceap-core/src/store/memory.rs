//! In-memory [`DocumentStore`] for tests and demo deployments.
//!
//! Uses a `HashMap` of collections behind `std::sync::RwLock`. Two switches
//! let tests put the store into the states the gateways must tell apart:
//! unreachable (ping fails, every call errors) and reachable-but-failing
//! writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{matches_filter, Document, DocumentStore, Filter, INTERNAL_ID_FIELD};

/// In-memory document store.
pub struct InMemoryStore {
    name: String,
    collections: RwLock<HashMap<String, Vec<Document>>>,
    reachable: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: RwLock::new(HashMap::new()),
            reachable: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Simulates losing (or regaining) the connection.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Makes every insert fail while the store stays reachable.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of every document in `collection`, identifiers included.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .map(|c| c.get(collection).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn ensure_reachable(&self) -> Result<()> {
        if !self.reachable.load(Ordering::SeqCst) {
            bail!("store '{}' is unreachable", self.name);
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> Result<String> {
        self.ensure_reachable()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("write rejected by store '{}'", self.name);
        }
        let id = uuid::Uuid::new_v4().simple().to_string();
        doc.insert(INTERNAL_ID_FIELD.to_string(), Value::String(id.clone()));

        let mut collections = self
            .collections
            .write()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        Ok(id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Document>> {
        self.ensure_reachable()?;
        let collections = self
            .collections
            .read()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| matches_filter(d, filter))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        self.ensure_reachable()?;
        let collections = self
            .collections
            .read()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
