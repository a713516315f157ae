//! SQLite connection management.
//!
//! The pool is created lazily: no connection is opened until the first
//! query. A misconfigured or unavailable database therefore never stops the
//! process from starting; it shows up as a failed ping instead, which is
//! what moves the gateways into degraded mode.
//!
//! WAL mode is enabled so catalog reads do not block intake writes.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::config::StoreConnection;

/// Builds a lazily-connecting pool for `conn`.
///
/// Creates the database file's parent directory when it is missing.
pub fn connect_lazy(conn: StoreConnection<'_>, timeout_secs: u64) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(conn.url)
        .with_context(|| format!("Invalid store url: {}", conn.url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %e, "could not create database directory");
            }
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(timeout_secs))
        .connect_lazy_with(options);

    Ok(pool)
}
