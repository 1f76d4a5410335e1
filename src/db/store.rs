//! Document store
//!
//! Raw JSON document access over the `documents` table. Documents are JSON
//! objects without their id; the id lives in its own column.
//!
//! This module provides:
//! - `DocumentStore` trait defining the interface for document access
//! - `SqlxDocumentStore` implementing the trait for SQLite and MySQL

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::query::{self, Cursor, Filter, Query, Rendered};
use super::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::config::DatabaseDriver;

/// A JSON object as stored in the `data` column
pub type JsonObject = Map<String, Value>;

/// Rows removed per statement by `delete_all`
pub const DELETE_BATCH_SIZE: usize = 300;

/// A document read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: JsonObject,
}

/// Document store trait
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get a document by id
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>>;

    /// Insert a document under a freshly generated id and return the id
    async fn create(&self, collection: &str, data: &JsonObject) -> Result<String>;

    /// Insert or replace the document with this id
    async fn set(&self, collection: &str, id: &str, data: &JsonObject) -> Result<()>;

    /// Merge top-level fields into an existing document.
    ///
    /// Returns false when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: &JsonObject) -> Result<bool>;

    /// Delete a document, returning whether it existed
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Run a query over one collection
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>>;

    /// Count the documents matching all filters
    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64>;

    /// Atomically add 1 to a numeric field and set `updatedAt`.
    ///
    /// A missing field counts as 0. Returns false when the document does
    /// not exist.
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &'static str,
        updated_at: &str,
    ) -> Result<bool>;

    /// Delete up to `limit` documents of a collection, returning how many
    async fn delete_batch(&self, collection: &str, limit: usize) -> Result<u64>;

    /// Delete every document of a collection in batches
    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let mut total = 0;
        loop {
            let deleted = self.delete_batch(collection, DELETE_BATCH_SIZE).await?;
            total += deleted;
            if deleted < DELETE_BATCH_SIZE as u64 {
                break;
            }
        }
        tracing::info!("Deleted {} document(s) from {}", total, collection);
        Ok(total)
    }
}

/// Shared document store handle
pub type DynDocumentStore = Arc<dyn DocumentStore>;

/// SQLx-based document store
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxDocumentStore {
    pool: DynDatabasePool,
}

impl SqlxDocumentStore {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared store for use with dependency injection
    pub fn shared(pool: DynDatabasePool) -> DynDocumentStore {
        Arc::new(Self::new(pool))
    }

    /// Resolve `startAfter` into a position in the current order.
    ///
    /// Unknown ids, and cursor documents whose order field is not a
    /// string, yield no cursor.
    async fn resolve_cursor(&self, collection: &str, query: &Query) -> Result<Option<Cursor>> {
        let Some(id) = query.start_after.as_deref() else {
            return Ok(None);
        };
        let Some(doc) = self.get(collection, id).await? else {
            tracing::debug!("Ignoring unknown cursor {} in {}", id, collection);
            return Ok(None);
        };

        match query.order {
            Some((field, _)) => Ok(doc
                .data
                .get(field)
                .and_then(Value::as_str)
                .map(|value| Cursor {
                    value: value.to_string(),
                    id: doc.id.clone(),
                })),
            None => Ok(Some(Cursor {
                value: String::new(),
                id: doc.id,
            })),
        }
    }
}

#[async_trait]
impl DocumentStore for SqlxDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(sqlite_pool(&self.pool)?, collection, id).await,
            DatabaseDriver::Mysql => get_mysql(mysql_pool(&self.pool)?, collection, id).await,
        }
    }

    async fn create(&self, collection: &str, data: &JsonObject) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let json = encode(data)?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                insert_sqlite(sqlite_pool(&self.pool)?, collection, &id, &json).await?
            }
            DatabaseDriver::Mysql => {
                insert_mysql(mysql_pool(&self.pool)?, collection, &id, &json).await?
            }
        }
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: &JsonObject) -> Result<()> {
        let json = encode(data)?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                upsert_sqlite(sqlite_pool(&self.pool)?, collection, id, &json).await
            }
            DatabaseDriver::Mysql => {
                upsert_mysql(mysql_pool(&self.pool)?, collection, id, &json).await
            }
        }
    }

    async fn update(&self, collection: &str, id: &str, fields: &JsonObject) -> Result<bool> {
        let Some(mut doc) = self.get(collection, id).await? else {
            return Ok(false);
        };
        for (key, value) in fields {
            doc.data.insert(key.clone(), value.clone());
        }
        self.set(collection, id, &doc.data).await?;
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let sql = "DELETE FROM documents WHERE collection = ? AND id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(collection)
                .bind(id)
                .execute(sqlite_pool(&self.pool)?)
                .await
                .context("Failed to delete document")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(collection)
                .bind(id)
                .execute(mysql_pool(&self.pool)?)
                .await
                .context("Failed to delete document")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>> {
        let cursor = self.resolve_cursor(collection, query).await?;
        let driver = self.pool.driver();
        let rendered = query::render(driver, collection, query, cursor.as_ref());
        match driver {
            DatabaseDriver::Sqlite => query_sqlite(sqlite_pool(&self.pool)?, &rendered).await,
            DatabaseDriver::Mysql => query_mysql(mysql_pool(&self.pool)?, &rendered).await,
        }
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64> {
        let driver = self.pool.driver();
        let rendered = query::render_count(driver, collection, filters);
        let count: i64 = match driver {
            DatabaseDriver::Sqlite => {
                let mut q = sqlx::query_scalar(&rendered.sql);
                for bind in &rendered.binds {
                    q = q.bind(bind);
                }
                q.fetch_one(sqlite_pool(&self.pool)?)
                    .await
                    .context("Failed to count documents")?
            }
            DatabaseDriver::Mysql => {
                let mut q = sqlx::query_scalar(&rendered.sql);
                for bind in &rendered.binds {
                    q = q.bind(bind);
                }
                q.fetch_one(mysql_pool(&self.pool)?)
                    .await
                    .context("Failed to count documents")?
            }
        };
        Ok(count.max(0) as u64)
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &'static str,
        updated_at: &str,
    ) -> Result<bool> {
        debug_assert!(field.chars().all(|c| c.is_ascii_alphanumeric()));
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let sql = format!(
                    "UPDATE documents SET data = json_set(data, '$.{f}', \
                     COALESCE(CAST(json_extract(data, '$.{f}') AS INTEGER), 0) + 1, \
                     '$.updatedAt', ?) WHERE collection = ? AND id = ?",
                    f = field
                );
                sqlx::query(&sql)
                    .bind(updated_at)
                    .bind(collection)
                    .bind(id)
                    .execute(sqlite_pool(&self.pool)?)
                    .await
                    .context("Failed to increment document field")?
                    .rows_affected()
            }
            DatabaseDriver::Mysql => {
                let sql = format!(
                    "UPDATE documents SET data = JSON_SET(data, '$.{f}', \
                     COALESCE(CAST(JSON_EXTRACT(data, '$.{f}') AS SIGNED), 0) + 1, \
                     '$.updatedAt', ?) WHERE collection = ? AND id = ?",
                    f = field
                );
                sqlx::query(&sql)
                    .bind(updated_at)
                    .bind(collection)
                    .bind(id)
                    .execute(mysql_pool(&self.pool)?)
                    .await
                    .context("Failed to increment document field")?
                    .rows_affected()
            }
        };
        Ok(affected > 0)
    }

    async fn delete_batch(&self, collection: &str, limit: usize) -> Result<u64> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let sql = format!(
                    "DELETE FROM documents WHERE collection = ? AND id IN \
                     (SELECT id FROM documents WHERE collection = ? LIMIT {})",
                    limit
                );
                sqlx::query(&sql)
                    .bind(collection)
                    .bind(collection)
                    .execute(sqlite_pool(&self.pool)?)
                    .await
                    .context("Failed to delete document batch")?
                    .rows_affected()
            }
            DatabaseDriver::Mysql => {
                let sql = format!("DELETE FROM documents WHERE collection = ? LIMIT {}", limit);
                sqlx::query(&sql)
                    .bind(collection)
                    .execute(mysql_pool(&self.pool)?)
                    .await
                    .context("Failed to delete document batch")?
                    .rows_affected()
            }
        };
        Ok(affected)
    }
}

fn encode(data: &JsonObject) -> Result<String> {
    serde_json::to_string(data).context("Failed to encode document")
}

fn decode(id: String, data: &str) -> Result<StoredDocument> {
    let data: JsonObject = serde_json::from_str(data)
        .with_context(|| format!("Corrupt document data for id {}", id))?;
    Ok(StoredDocument { id, data })
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_sqlite(pool: &SqlitePool, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
    let row = sqlx::query("SELECT id, data FROM documents WHERE collection = ? AND id = ?")
        .bind(collection)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get document")?;

    row.map(|r| decode(r.get("id"), &r.get::<String, _>("data")))
        .transpose()
}

async fn insert_sqlite(pool: &SqlitePool, collection: &str, id: &str, json: &str) -> Result<()> {
    sqlx::query("INSERT INTO documents (collection, id, data) VALUES (?, ?, ?)")
        .bind(collection)
        .bind(id)
        .bind(json)
        .execute(pool)
        .await
        .context("Failed to insert document")?;
    Ok(())
}

async fn upsert_sqlite(pool: &SqlitePool, collection: &str, id: &str, json: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO documents (collection, id, data) VALUES (?, ?, ?) \
         ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data",
    )
    .bind(collection)
    .bind(id)
    .bind(json)
    .execute(pool)
    .await
    .context("Failed to write document")?;
    Ok(())
}

async fn query_sqlite(pool: &SqlitePool, rendered: &Rendered) -> Result<Vec<StoredDocument>> {
    let mut q = sqlx::query(&rendered.sql);
    for bind in &rendered.binds {
        q = q.bind(bind);
    }
    let rows = q.fetch_all(pool).await.context("Failed to query documents")?;

    rows.iter()
        .map(|r| decode(r.get("id"), &r.get::<String, _>("data")))
        .collect()
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_mysql(pool: &MySqlPool, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
    let row = sqlx::query(
        "SELECT id, CAST(data AS CHAR) AS data FROM documents WHERE collection = ? AND id = ?",
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get document")?;

    row.map(|r| decode(r.get("id"), &r.get::<String, _>("data")))
        .transpose()
}

async fn insert_mysql(pool: &MySqlPool, collection: &str, id: &str, json: &str) -> Result<()> {
    sqlx::query("INSERT INTO documents (collection, id, data) VALUES (?, ?, ?)")
        .bind(collection)
        .bind(id)
        .bind(json)
        .execute(pool)
        .await
        .context("Failed to insert document")?;
    Ok(())
}

async fn upsert_mysql(pool: &MySqlPool, collection: &str, id: &str, json: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO documents (collection, id, data) VALUES (?, ?, ?) \
         ON DUPLICATE KEY UPDATE data = VALUES(data)",
    )
    .bind(collection)
    .bind(id)
    .bind(json)
    .execute(pool)
    .await
    .context("Failed to write document")?;
    Ok(())
}

async fn query_mysql(pool: &MySqlPool, rendered: &Rendered) -> Result<Vec<StoredDocument>> {
    let mut q = sqlx::query(&rendered.sql);
    for bind in &rendered.binds {
        q = q.bind(bind);
    }
    let rows = q.fetch_all(pool).await.context("Failed to query documents")?;

    rows.iter()
        .map(|r| decode(r.get("id"), &r.get::<String, _>("data")))
        .collect()
}
