//! # keystone-db: Persistence Layer for Keystone
//!
//! Stores documents, products and customers. SQLite (via sqlx) in
//! production, an in-memory store for fixtures and tests; both behind the
//! same two traits.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Keystone Data Flow                               │
//! │                                                                         │
//! │  keystone-cli command (pay, auto-cost, bulk-pay ...)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   keystone-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │  │   │
//! │  │   │               │    │ DocumentRepository │  │            │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepository  │  │ 001_init   │  │   │
//! │  │   │               │    │ CustomerRepository │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   MemoryStore ── same traits, BTreeMaps behind RwLock          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │      <platform data dir>/keystone.db                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - `migrations` - Embedded schema, applied on open
//! - [`error`] - Database error types
//! - [`repository`] - Store traits, SQLite repositories, in-memory store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keystone_db::{Database, DbConfig, DocumentStore};
//!
//! let db = Database::open(DbConfig::new("path/to/keystone.db")).await?;
//! let invoice = db.get_document("inv-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};

pub use repository::customer::CustomerRepository;
pub use repository::document::DocumentRepository;
pub use repository::memory::MemoryStore;
pub use repository::product::ProductRepository;
pub use repository::{commit, CatalogStore, DocumentFilter, DocumentStore};

/// Generates a new id for a document, product or payment.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
