//! `ceap components` commands.
//!
//! The HTTP surface only reads the component catalog. `import` is the
//! out-of-band path that fills the `componentitem` collection from a JSON
//! file; `list` runs the same catalog query the API serves.

use anyhow::{bail, Context, Result};
use std::path::Path;

use ceap_core::catalog::{CatalogGateway, ComponentQuery, FallbackCatalog};
use ceap_core::models::{validate_fields, Collection, ComponentItem};
use ceap_core::store::to_document;

use crate::config::Config;
use crate::store::open_store;

/// Imports every component of the JSON array at `path`.
///
/// All records are validated before the first insert, so a bad file
/// writes nothing. Returns the number of imported records.
pub async fn run_import(config: &Config, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read components file: {}", path.display()))?;
    let items: Vec<ComponentItem> = serde_json::from_str(&content)
        .with_context(|| format!("{} must contain a JSON array of components", path.display()))?;

    for (i, item) in items.iter().enumerate() {
        validate_fields(item)
            .with_context(|| format!("invalid component at index {}", i))?;
    }

    let Some(store) = open_store(config, true).await? else {
        bail!("No document store configured. Set DATABASE_URL and DATABASE_NAME.");
    };
    if !store.ping().await {
        bail!("Document store '{}' is not reachable", store.name());
    }

    for item in &items {
        store
            .insert(Collection::ComponentItem.as_str(), to_document(item)?)
            .await
            .with_context(|| format!("Failed to import component {}", item.code))?;
    }

    println!("imported components: {}", items.len());
    Ok(items.len())
}

/// Prints the catalog answer for `query` as `{"items": [...]}`.
pub async fn run_list(config: &Config, query: ComponentQuery, limit: usize) -> Result<()> {
    let store = open_store(config, false).await?;
    let gateway = CatalogGateway::new(store, FallbackCatalog::demo());
    let items = gateway.list_components(&query, limit).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({ "items": items }))?
    );
    Ok(())
}
