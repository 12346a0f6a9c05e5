//! # Commands Module
//!
//! One function per CLI command, each generic over the store so the same
//! code runs against SQLite and the in-memory fixtures in tests.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── dispatch + shared lookups
//! ├── document.rs  ◄─── list, show, auto-cost, promote
//! ├── payment.rs   ◄─── pay, unpay, outstanding, bulk-pay
//! ├── catalog.rs   ◄─── price, products, customers
//! └── report.rs    ◄─── receivables
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  argv ──► clap (Cli) ──► Command::Pay(PayArgs { .. })                  │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │  execute(&AppState<S>, command)                                        │
//! │       │                                                                 │
//! │       ├── store.get_document(id)          (keystone-db)                │
//! │       ├── DocumentDraft::add_payment(..)  (keystone-core)              │
//! │       └── commit(store, &mut draft)       validate + merge-write       │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │  Result<serde_json::Value, ApiError>  ──►  stdout / stderr as JSON     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod document;
pub mod payment;
pub mod report;

use keystone_core::{Customer, Document, DocumentKind, DocumentStatus, Money, Product};
use keystone_db::{CatalogStore, DocumentStore};
use serde::Serialize;
use serde_json::Value;

use crate::cli::Command;
use crate::error::ApiError;
use crate::state::AppState;

/// One row of a document listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub kind: DocumentKind,
    pub customer_id: String,
    pub customer_name: String,
    pub date: String,
    pub status: DocumentStatus,
    pub total_cents: i64,
    pub amount_paid_cents: i64,
    pub balance_due_cents: i64,
    pub line_count: usize,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        DocumentSummary {
            id: doc.id.clone(),
            kind: doc.kind,
            customer_id: doc.customer_id.clone(),
            customer_name: doc.customer_name.clone(),
            date: doc.date.format("%Y-%m-%d").to_string(),
            status: doc.status,
            total_cents: doc.total.cents(),
            amount_paid_cents: doc.amount_paid.cents(),
            balance_due_cents: doc.balance_due.cents(),
            line_count: doc.line_items.len(),
        }
    }
}

/// Runs one parsed command and returns its JSON output.
pub async fn execute<S>(state: &AppState<S>, command: Command) -> Result<Value, ApiError>
where
    S: DocumentStore + CatalogStore,
{
    let value = match command {
        Command::List(args) => to_json(document::list(state, args).await?)?,
        Command::Show { document_id } => to_json(document::show(state, &document_id).await?)?,
        Command::AutoCost {
            document_id,
            dry_run,
        } => to_json(document::auto_cost(state, &document_id, dry_run).await?)?,
        Command::Promote { document_id } => to_json(document::promote(state, &document_id).await?)?,
        Command::Pay(args) => to_json(payment::pay(state, args).await?)?,
        Command::Unpay {
            document_id,
            payment_id,
        } => to_json(payment::unpay(state, &document_id, &payment_id).await?)?,
        Command::Outstanding { customer_id } => {
            to_json(payment::outstanding(state, &customer_id).await?)?
        }
        Command::BulkPay(args) => to_json(payment::bulk_pay(state, args).await?)?,
        Command::Price {
            product_id,
            customer_id,
        } => to_json(catalog::price(state, &product_id, customer_id.as_deref()).await?)?,
        Command::Products => to_json(catalog::products(state).await?)?,
        Command::Customers => to_json(catalog::customers(state).await?)?,
        Command::Receivables { customer_id } => {
            to_json(report::receivables(state, customer_id.as_deref()).await?)?
        }
        Command::Config => to_json(&state.config)?,
    };
    Ok(value)
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(value)?)
}

// =============================================================================
// Shared Lookups
// =============================================================================

pub(crate) async fn load_document<S: DocumentStore>(store: &S, id: &str) -> Result<Document, ApiError> {
    store
        .get_document(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Document", id))
}

pub(crate) async fn load_customer<S: CatalogStore>(store: &S, id: &str) -> Result<Customer, ApiError> {
    store
        .get_customer(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))
}

pub(crate) async fn load_product<S: CatalogStore>(store: &S, id: &str) -> Result<Product, ApiError> {
    store
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// Money with the configured currency symbol.
pub(crate) fn display<S>(state: &AppState<S>, amount: Money) -> String {
    state.config.format_currency(amount.cents())
}

// =============================================================================
// Test Fixtures
// =============================================================================
