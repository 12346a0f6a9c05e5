//! # Report Commands

use keystone_core::reports::{summarize_receivables, ReceivablesSummary};
use keystone_core::DocumentKind;
use keystone_db::{DocumentFilter, DocumentStore};
use serde::Serialize;
use tracing::debug;

use super::display;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablesResponse {
    pub business: String,
    pub customer_id: Option<String>,
    #[serde(flatten)]
    pub summary: ReceivablesSummary,
    pub total_outstanding_display: String,
}

/// Billed, paid and outstanding totals over invoices, optionally for one
/// customer.
pub async fn receivables<S: DocumentStore>(
    state: &AppState<S>,
    customer_id: Option<&str>,
) -> Result<ReceivablesResponse, ApiError> {
    debug!(customer = ?customer_id, "receivables command");

    let mut filter = DocumentFilter::all().kind(DocumentKind::Invoice);
    if let Some(id) = customer_id {
        filter = filter.customer(id);
    }

    let invoices = state.store.list_documents(&filter).await?;
    let summary = summarize_receivables(&invoices);

    Ok(ReceivablesResponse {
        business: state.config.business.name.clone(),
        customer_id: customer_id.map(str::to_string),
        total_outstanding_display: display(state, summary.total_outstanding),
        summary,
    })
}
