//! # Database Handle
//!
//! Opens the back office's SQLite file and hands out repositories.
//!
//! ```text
//!   keystone.toml [database]
//!        │
//!        ▼
//!   DbConfig::new(path)  ──►  Database::open  ──►  migrations::apply
//!                                  │
//!                                  ├── documents()  estimates, orders, invoices
//!                                  ├── products()   catalog
//!                                  └── customers()  accounts + markup rules
//! ```
//!
//! The journal runs in WAL mode: a `receivables` report keeps reading while
//! a bulk payment's transaction writes.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::customer::CustomerRepository;
use crate::repository::document::DocumentRepository;
use crate::repository::product::ProductRepository;
use crate::repository::{CatalogStore, DocumentFilter, DocumentStore};
use keystone_core::{Customer, Document, Product};

// =============================================================================
// Configuration
// =============================================================================

/// Where the data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// A database file, created on first open.
    File(PathBuf),
    /// A private in-memory database that disappears with its pool.
    Memory,
}

impl fmt::Display for DbLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbLocation::File(path) => write!(f, "{}", path.display()),
            DbLocation::Memory => f.write_str(":memory:"),
        }
    }
}

/// How to open the database.
///
/// ```rust,ignore
/// let config = DbConfig::new(config.database_path()?).max_connections(4);
/// let db = Database::open(config).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub location: DbLocation,
    /// Pool size for file databases; `[database] max_connections`.
    pub max_connections: u32,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 5,
        }
    }

    /// Fresh, empty, fully migrated database for tests.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            max_connections: 1,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        match self.location {
            DbLocation::File(_) => SqlitePoolOptions::new()
                .max_connections(self.max_connections)
                .acquire_timeout(Duration::from_secs(10)),
            // Each connection to :memory: is a separate database; keep exactly one alive
            DbLocation::Memory => SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// An open, migrated SQLite database.
///
/// Implements [`DocumentStore`] and [`CatalogStore`] by delegating to the
/// repositories, so commands are written once against the traits and run
/// on SQLite or on the in-memory store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and applies any pending schema migrations.
    pub async fn open(config: DbConfig) -> DbResult<Self> {
        debug!(location = %config.location, "Opening database");

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("{}: {}", config.location, e)))?;

        migrations::apply(&pool).await?;

        info!(location = %config.location, max_connections = config.max_connections, "Database ready");
        Ok(Database { pool })
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    /// Waits for in-flight queries, then closes every connection.
    pub async fn close(&self) {
        debug!("Closing database");
        self.pool.close().await;
    }
}

// =============================================================================
// Store Traits
// =============================================================================

impl DocumentStore for Database {
    async fn list_documents(&self, filter: &DocumentFilter) -> DbResult<Vec<Document>> {
        self.documents().list(filter).await
    }

    async fn get_document(&self, id: &str) -> DbResult<Option<Document>> {
        self.documents().get_by_id(id).await
    }

    async fn save_document(&self, document: &Document) -> DbResult<Document> {
        self.documents().save(document).await
    }

    async fn save_documents(&self, documents: &[Document]) -> DbResult<Vec<Document>> {
        self.documents().save_all(documents).await
    }

    async fn delete_document(&self, id: &str) -> DbResult<()> {
        self.documents().delete(id).await
    }
}

impl CatalogStore for Database {
    async fn list_products(&self) -> DbResult<Vec<Product>> {
        self.products().list().await
    }

    async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        self.products().get_by_id(id).await
    }

    async fn save_product(&self, product: &Product) -> DbResult<Product> {
        self.products().upsert(product).await
    }

    async fn list_customers(&self) -> DbResult<Vec<Customer>> {
        self.customers().list().await
    }

    async fn get_customer(&self, id: &str) -> DbResult<Option<Customer>> {
        self.customers().get_by_id(id).await
    }

    async fn save_customer(&self, customer: &Customer) -> DbResult<Customer> {
        self.customers().upsert(customer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_database_survives_idle_pool() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        db.save_customer(&Customer::new("c-1", "Acme")).await.unwrap();

        assert_eq!(db.list_customers().await.unwrap().len(), 1);
        assert!(db.get_document("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_database_keeps_data_between_opens() {
        let path = std::env::temp_dir().join(format!("keystone-pool-{}.db", crate::generate_id()));

        let db = Database::open(DbConfig::new(&path).max_connections(2)).await.unwrap();
        db.save_customer(&Customer::new("c-1", "Acme")).await.unwrap();
        db.close().await;

        let reopened = Database::open(DbConfig::new(&path)).await.unwrap();
        let customer = reopened.get_customer("c-1").await.unwrap().unwrap();
        assert_eq!(customer.name, "Acme");
        reopened.close().await;

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[test]
    fn test_pool_size_is_at_least_one() {
        let config = DbConfig::new("/tmp/k.db").max_connections(0);
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.location.to_string(), "/tmp/k.db");
        assert_eq!(DbConfig::in_memory().location.to_string(), ":memory:");
    }
}
