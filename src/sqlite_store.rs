//! SQLite-backed [`DocumentStore`].
//!
//! Every collection shares one `documents` table; each row keeps the
//! document as JSON text in `body`. Equality filters are evaluated with
//! `json_extract`, so only documents whose field holds exactly the requested
//! string match, and a missing field never matches.
//!
//! The schema is created on the first operation that reaches the database,
//! and retried on every operation until it succeeds. A database that was
//! unavailable at startup is provisioned as soon as it becomes reachable.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tokio::sync::OnceCell;

use ceap_core::store::{Document, DocumentStore, Filter, INTERNAL_ID_FIELD};
use serde_json::Value;

use crate::migrate;

/// SQLite implementation of the [`DocumentStore`] trait.
pub struct SqliteStore {
    name: String,
    pool: SqlitePool,
    schema: OnceCell<()>,
}

impl SqliteStore {
    pub fn new(name: impl Into<String>, pool: SqlitePool) -> Self {
        Self {
            name: name.into(),
            pool,
            schema: OnceCell::new(),
        }
    }

    /// Runs the migrations unless a previous call already succeeded.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.schema
            .get_or_try_init(|| async {
                migrate::run_migrations(&self.pool).await?;
                tracing::info!(store = %self.name, "document store schema ready");
                Ok::<(), anyhow::Error>(())
            })
            .await?;
        Ok(())
    }
}

/// JSON path addressing a top-level field, quoted so any key is literal.
fn json_path(key: &str) -> String {
    format!("$.\"{}\"", key.replace('"', ""))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> bool {
        match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(store = %self.name, error = %e, "ping failed");
                false
            }
        }
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> Result<String> {
        self.ensure_schema().await?;
        doc.remove(INTERNAL_ID_FIELD);
        let id = uuid::Uuid::new_v4().simple().to_string();
        let body = serde_json::to_string(&doc)?;

        sqlx::query(
            "INSERT INTO documents (id, collection, body, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(collection)
        .bind(&body)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Document>> {
        self.ensure_schema().await?;
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, body FROM documents WHERE collection = ");
        qb.push_bind(collection);
        for (key, value) in filter {
            qb.push(" AND json_extract(body, ")
                .push_bind(json_path(key))
                .push(") = ")
                .push_bind(value.as_str());
        }
        qb.push(" ORDER BY seq LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));

        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let body: String = row.try_get("body")?;
            let mut doc: Document = serde_json::from_str(&body)?;
            doc.insert(INTERNAL_ID_FIELD.to_string(), Value::String(id));
            docs.push(doc);
        }
        Ok(docs)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        self.ensure_schema().await?;
        let names = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT collection FROM documents ORDER BY collection",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }
}
