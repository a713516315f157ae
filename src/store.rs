//! Store handle construction.
//!
//! Turns the `[store]` configuration into the explicit connection state the
//! gateways consume: `None` when no store is configured, otherwise a lazily
//! connecting [`SqliteStore`].

use std::sync::Arc;

use anyhow::Result;
use ceap_core::store::DocumentStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Opens the configured store, if any.
///
/// With `migrate` set, the schema is created eagerly. A database that cannot
/// be reached right now is logged and provisioned later, on its first
/// successful use.
pub async fn open_store(config: &Config, migrate: bool) -> Result<Option<Arc<dyn DocumentStore>>> {
    let Some(conn) = config.store.connection() else {
        return Ok(None);
    };

    let pool = db::connect_lazy(conn, config.store.timeout_secs)?;
    let store = SqliteStore::new(conn.name, pool);
    if migrate {
        if let Err(e) = store.ensure_schema().await {
            tracing::warn!(store = conn.name, error = %e, "could not prepare document store, continuing in degraded mode");
        }
    }

    Ok(Some(Arc::new(store)))
}
