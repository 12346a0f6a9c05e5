//! # Repository Module
//!
//! Store traits and their implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Backends, One Interface                          │
//! │                                                                         │
//! │  keystone-cli command                                                  │
//! │       │                                                                 │
//! │       │  store.get_document(id) / store.save_document(&doc)            │
//! │       ▼                                                                 │
//! │  DocumentStore + CatalogStore (traits, this module)                    │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  Database (SQLite)                   MemoryStore                       │
//! │  ├── DocumentRepository              tokio RwLock over BTreeMaps       │
//! │  ├── ProductRepository               (fixtures and tests)              │
//! │  └── CustomerRepository                                                │
//! │                                                                         │
//! │  Every save is a merge-write: the whole document replaces whatever is  │
//! │  stored under its id. There is no version check, last writer wins.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`DocumentRepository`](document::DocumentRepository) - estimates, orders, invoices
//! - [`ProductRepository`](product::ProductRepository) - catalog
//! - [`CustomerRepository`](customer::CustomerRepository) - customers and markup rules
//! - [`MemoryStore`](memory::MemoryStore) - in-memory implementation of both traits

pub mod customer;
pub mod document;
pub mod memory;
pub mod product;

use chrono::NaiveDate;
use keystone_core::draft::DocumentDraft;
use keystone_core::validation::{validate_customer, validate_document, validate_product};
use keystone_core::{Customer, Document, DocumentKind, Product};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

// =============================================================================
// Filter
// =============================================================================

/// Criteria for [`DocumentStore::list_documents`]. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub kind: Option<DocumentKind>,
    pub customer_id: Option<String>,
    /// Inclusive lower bound on the document date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the document date.
    pub to: Option<NaiveDate>,
}

impl DocumentFilter {
    pub fn all() -> Self {
        DocumentFilter::default()
    }

    pub fn kind(mut self, kind: DocumentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.kind.map_or(true, |k| doc.kind == k)
            && self.customer_id.as_ref().map_or(true, |c| &doc.customer_id == c)
            && self.from.map_or(true, |from| doc.date >= from)
            && self.to.map_or(true, |to| doc.date <= to)
    }
}

// =============================================================================
// Store Traits
// =============================================================================

/// Persistence for estimates, orders and invoices.
///
/// Listings are ordered newest date first, then by id.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn list_documents(&self, filter: &DocumentFilter) -> DbResult<Vec<Document>>;

    async fn get_document(&self, id: &str) -> DbResult<Option<Document>>;

    /// Merge-write: recalculates the document, stamps `updated_at` and
    /// replaces whatever is stored under its id. Returns what was written.
    async fn save_document(&self, document: &Document) -> DbResult<Document>;

    /// Saves several documents together (bulk payments). The SQLite store
    /// writes them in one transaction.
    async fn save_documents(&self, documents: &[Document]) -> DbResult<Vec<Document>> {
        let mut saved = Vec::with_capacity(documents.len());
        for doc in documents {
            saved.push(self.save_document(doc).await?);
        }
        Ok(saved)
    }

    /// Hard delete. Deleting a missing id is a `NotFound` error.
    async fn delete_document(&self, id: &str) -> DbResult<()>;
}

/// Persistence for the product catalog and customer accounts.
#[allow(async_fn_in_trait)]
pub trait CatalogStore {
    async fn list_products(&self) -> DbResult<Vec<Product>>;

    async fn get_product(&self, id: &str) -> DbResult<Option<Product>>;

    /// Upsert by id.
    async fn save_product(&self, product: &Product) -> DbResult<Product>;

    async fn list_customers(&self) -> DbResult<Vec<Customer>>;

    async fn get_customer(&self, id: &str) -> DbResult<Option<Customer>>;

    /// Upsert by id, markup rules included.
    async fn save_customer(&self, customer: &Customer) -> DbResult<Customer>;
}

// =============================================================================
// Save Validation
// =============================================================================

/// Rejects a product that could not have come from the catalog form.
pub(crate) fn check_product(product: &Product) -> DbResult<()> {
    let errors = validate_product(product);
    if errors.is_empty() {
        return Ok(());
    }

    warn!(id = %product.id, count = errors.len(), "Product failed validation");
    Err(DbError::invalid("Product", &product.id, errors))
}

/// Rejects a customer whose markup rules would break pricing or auto-cost.
pub(crate) fn check_customer(customer: &Customer) -> DbResult<()> {
    let errors = validate_customer(customer);
    if errors.is_empty() {
        return Ok(());
    }

    warn!(id = %customer.id, count = errors.len(), "Customer failed validation");
    Err(DbError::invalid("Customer", &customer.id, errors))
}

// =============================================================================
// Draft Commit
// =============================================================================

/// Validates and writes a draft's working copy, then marks the draft clean.
///
/// A clean draft is not written. On validation failure nothing is written
/// and the draft keeps its edits.
pub async fn commit<S: DocumentStore>(store: &S, draft: &mut DocumentDraft) -> DbResult<Document> {
    if !draft.is_dirty() {
        debug!(id = %draft.id(), "Draft unchanged, skipping write");
        return Ok(draft.working().clone());
    }

    let errors = validate_document(draft.working());
    if !errors.is_empty() {
        warn!(id = %draft.id(), count = errors.len(), "Draft failed validation");
        return Err(DbError::invalid("Document", draft.id(), errors));
    }

    debug!(id = %draft.id(), fields = ?draft.changed_fields(), "Committing draft");
    let saved = store.save_document(draft.working()).await?;
    draft.mark_committed(saved.clone());
    Ok(saved)
}
