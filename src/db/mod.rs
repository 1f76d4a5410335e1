//! Database layer
//!
//! Persistence runs on SQLite (default, single-file deployment) or MySQL,
//! selected by configuration. Every resource is stored as a JSON document
//! in one `documents` table keyed by `(collection, id)`.
//!
//! # Architecture
//!
//! - [`DatabasePool`] hides the driver behind a trait object.
//! - [`DocumentStore`] reads and writes raw JSON documents.
//! - [`Collection`] is the typed view services use.
//!
//! # Usage
//!
//! ```ignore
//! use legal_backend::config::DatabaseConfig;
//! use legal_backend::db::{create_pool, migrations, Collection, SqlxDocumentStore};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//!
//! let store = SqlxDocumentStore::shared(pool);
//! let cases: Collection<Case> = Collection::new(store);
//! ```

pub mod collection;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod store;

use anyhow::{anyhow, Result};
use sqlx::{MySqlPool, SqlitePool};

pub use collection::{Collection, Document};
pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
pub use query::{Cmp, Direction, Filter, Query};
pub use store::{DocumentStore, DynDocumentStore, SqlxDocumentStore};

/// The SQLite pool behind `pool`, or an error when the driver differs.
pub(crate) fn sqlite_pool(pool: &DynDatabasePool) -> Result<&SqlitePool> {
    pool.as_sqlite()
        .ok_or_else(|| anyhow!("database pool is not SQLite"))
}

/// The MySQL pool behind `pool`, or an error when the driver differs.
pub(crate) fn mysql_pool(pool: &DynDatabasePool) -> Result<&MySqlPool> {
    pool.as_mysql()
        .ok_or_else(|| anyhow!("database pool is not MySQL"))
}
