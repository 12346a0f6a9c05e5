//! # Document Commands
//!
//! Listing, detail, auto-cost and catalog promotion.

use chrono::Utc;
use keystone_core::auto_cost::auto_cost as run_auto_cost;
use keystone_core::catalog::promote_document;
use keystone_core::draft::DocumentDraft;
use keystone_core::{Document, Product};
use keystone_db::{commit, generate_id, CatalogStore, DocumentFilter, DocumentStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{display, load_document, DocumentSummary};
use crate::cli::ListArgs;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowResponse {
    pub document: Document,
    pub total_display: String,
    pub balance_due_display: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoCostResponse {
    pub document_id: String,
    /// Lines that received a cost.
    pub updated: Vec<String>,
    /// Lines whose resolved markup was -100% or lower.
    pub skipped: Vec<String>,
    pub saved: bool,
    pub document: Document,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteResponse {
    pub document_id: String,
    pub products: Vec<Product>,
}

pub async fn list<S: DocumentStore>(
    state: &AppState<S>,
    args: ListArgs,
) -> Result<Vec<DocumentSummary>, ApiError> {
    debug!(?args, "list command");

    let mut filter = DocumentFilter::all().between(args.from, args.to);
    if let Some(kind) = args.kind {
        filter = filter.kind(kind);
    }
    if let Some(customer_id) = args.customer_id {
        filter = filter.customer(customer_id);
    }

    let documents = state.store.list_documents(&filter).await?;
    Ok(documents.iter().map(DocumentSummary::from).collect())
}

pub async fn show<S: DocumentStore>(state: &AppState<S>, id: &str) -> Result<ShowResponse, ApiError> {
    debug!(id = %id, "show command");

    let document = load_document(&state.store, id).await?;
    Ok(ShowResponse {
        total_display: display(state, document.total),
        balance_due_display: display(state, document.balance_due),
        document,
    })
}

/// Back-calculates missing non-stock costs and saves the result.
///
/// With `dry_run` the outcome is returned without writing.
pub async fn auto_cost<S>(state: &AppState<S>, id: &str, dry_run: bool) -> Result<AutoCostResponse, ApiError>
where
    S: DocumentStore + CatalogStore,
{
    debug!(id = %id, dry_run, "auto-cost command");

    let document = load_document(&state.store, id).await?;
    let customers = state.store.list_customers().await?;
    let products = state.store.list_products().await?;

    let outcome = run_auto_cost(&document, &customers, &products, &state.config.pricing_policy());

    for line in &outcome.skipped {
        warn!(document = %id, line = %line, "Markup of -100% or lower, cost left blank");
    }

    let mut draft = DocumentDraft::new(document);
    draft.replace_line_items(outcome.document.line_items);

    let saved = !dry_run && draft.is_dirty();
    let document = if saved {
        let saved = commit(&state.store, &mut draft).await?;
        info!(document = %id, lines = outcome.updated.len(), "Auto-cost saved");
        saved
    } else {
        draft.into_working()
    };

    Ok(AutoCostResponse {
        document_id: id.to_string(),
        updated: outcome.updated,
        skipped: outcome.skipped,
        saved,
        document,
    })
}

/// Creates catalog products for every flagged non-stock line and links the
/// lines to them.
///
/// Products are written before the document. A failed document write
/// leaves the new products in the catalog.
pub async fn promote<S>(state: &AppState<S>, id: &str) -> Result<PromoteResponse, ApiError>
where
    S: DocumentStore + CatalogStore,
{
    debug!(id = %id, "promote command");

    let document = load_document(&state.store, id).await?;
    let (promoted, products) = promote_document(&document, generate_id, Utc::now());

    if products.is_empty() {
        info!(document = %id, "No lines flagged for the catalog");
        return Ok(PromoteResponse {
            document_id: id.to_string(),
            products,
        });
    }

    let mut saved_products = Vec::with_capacity(products.len());
    for product in &products {
        saved_products.push(state.store.save_product(product).await?);
    }

    let mut draft = DocumentDraft::new(document);
    draft.replace_line_items(promoted.line_items);
    commit(&state.store, &mut draft).await?;

    info!(document = %id, count = saved_products.len(), "Lines promoted to catalog");
    Ok(PromoteResponse {
        document_id: id.to_string(),
        products: saved_products,
    })
}
