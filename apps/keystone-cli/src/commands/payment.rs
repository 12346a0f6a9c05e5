//! # Payment Commands
//!
//! Single payments go through a draft so validation runs before the write.
//! Bulk payments are allocated in core and saved together in one
//! transaction.
//!
//! ## Bulk Allocation
//! ```text
//!   bulk-pay c-1 300.00 check inv-1 inv-2
//!
//!   full_amount_each (default)      proportional
//!   ──────────────────────────      ───────────────────────────────
//!   inv-1  +300.00                  inv-1 (bal 100)  + 75.00
//!   inv-2  +300.00                  inv-2 (bal 300)  +225.00
//!   credited 600.00  ⚠ warn         credited 300.00
//! ```

use chrono::Utc;
use keystone_core::allocation::{allocate_bulk_payment, AllocationPolicy, BulkPayment};
use keystone_core::draft::DocumentDraft;
use keystone_core::reports::outstanding_invoices;
use keystone_core::{Document, DocumentKind, DocumentStatus, Payment};
use keystone_db::{commit, generate_id, CatalogStore, DocumentFilter, DocumentStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{display, load_customer, load_document, DocumentSummary};
use crate::cli::{BulkPayArgs, PayArgs};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub document_id: String,
    pub payment: Payment,
    pub amount_paid_cents: i64,
    pub balance_due_cents: i64,
    pub balance_due_display: String,
    pub status: DocumentStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPayResponse {
    pub customer_id: String,
    pub policy: AllocationPolicy,
    pub entered_cents: i64,
    pub credited_cents: i64,
    /// More was credited across the invoices than was entered.
    pub over_credited: bool,
    pub invoices: Vec<DocumentSummary>,
}

pub async fn pay<S: DocumentStore>(state: &AppState<S>, args: PayArgs) -> Result<PaymentResponse, ApiError> {
    debug!(document = %args.document_id, amount = %args.amount, "pay command");

    let document = load_document(&state.store, &args.document_id).await?;

    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let mut payment = Payment::new(generate_id(), date, args.amount, args.method);
    payment.notes = args.notes;

    let mut draft = DocumentDraft::new(document);
    draft.add_payment(payment.clone())?;
    let saved = commit(&state.store, &mut draft).await?;

    info!(
        document = %saved.id,
        payment = %payment.id,
        amount = %payment.amount,
        balance = %saved.balance_due,
        status = %saved.status,
        "Payment recorded"
    );

    Ok(PaymentResponse {
        document_id: saved.id.clone(),
        payment,
        amount_paid_cents: saved.amount_paid.cents(),
        balance_due_cents: saved.balance_due.cents(),
        balance_due_display: display(state, saved.balance_due),
        status: saved.status,
    })
}

/// Hard-deletes a payment. No reversal record is kept.
pub async fn unpay<S: DocumentStore>(
    state: &AppState<S>,
    document_id: &str,
    payment_id: &str,
) -> Result<PaymentResponse, ApiError> {
    debug!(document = %document_id, payment = %payment_id, "unpay command");

    let document = load_document(&state.store, document_id).await?;

    let mut draft = DocumentDraft::new(document);
    let removed = draft.remove_payment(payment_id)?;
    let saved = commit(&state.store, &mut draft).await?;

    info!(document = %saved.id, payment = %removed.id, amount = %removed.amount, "Payment removed");

    Ok(PaymentResponse {
        document_id: saved.id.clone(),
        payment: removed,
        amount_paid_cents: saved.amount_paid.cents(),
        balance_due_cents: saved.balance_due.cents(),
        balance_due_display: display(state, saved.balance_due),
        status: saved.status,
    })
}

/// The customer's invoices that can take a payment, oldest first.
pub async fn outstanding<S>(state: &AppState<S>, customer_id: &str) -> Result<Vec<DocumentSummary>, ApiError>
where
    S: DocumentStore + CatalogStore,
{
    debug!(customer = %customer_id, "outstanding command");

    load_customer(&state.store, customer_id).await?;
    let invoices = customer_invoices(state, customer_id).await?;

    Ok(outstanding_invoices(&invoices, customer_id)
        .into_iter()
        .map(DocumentSummary::from)
        .collect())
}

pub async fn bulk_pay<S>(state: &AppState<S>, args: BulkPayArgs) -> Result<BulkPayResponse, ApiError>
where
    S: DocumentStore + CatalogStore,
{
    let policy = args.policy.unwrap_or_else(|| state.config.allocation_policy());
    debug!(
        customer = %args.customer_id,
        amount = %args.amount,
        invoices = args.invoice_ids.len(),
        ?policy,
        "bulk-pay command"
    );

    load_customer(&state.store, &args.customer_id).await?;
    let invoices = customer_invoices(state, &args.customer_id).await?;

    let payment = BulkPayment {
        date: args.date.unwrap_or_else(|| Utc::now().date_naive()),
        amount: args.amount,
        method: args.method,
        notes: args.notes,
    };
    let allocation = allocate_bulk_payment(
        &invoices,
        &args.customer_id,
        &args.invoice_ids,
        &payment,
        policy,
        generate_id,
    )?;

    if allocation.is_over_credited() {
        warn!(
            customer = %args.customer_id,
            entered = %allocation.entered,
            credited = %allocation.credited,
            invoices = allocation.documents.len(),
            "Bulk payment credited the full amount to every invoice"
        );
    }

    let saved = state.store.save_documents(&allocation.documents).await?;
    info!(customer = %args.customer_id, invoices = saved.len(), credited = %allocation.credited, "Bulk payment applied");

    Ok(BulkPayResponse {
        customer_id: args.customer_id,
        policy,
        entered_cents: allocation.entered.cents(),
        credited_cents: allocation.credited.cents(),
        over_credited: allocation.is_over_credited(),
        invoices: saved.iter().map(DocumentSummary::from).collect(),
    })
}

async fn customer_invoices<S: DocumentStore>(
    state: &AppState<S>,
    customer_id: &str,
) -> Result<Vec<Document>, ApiError> {
    let filter = DocumentFilter::all()
        .kind(DocumentKind::Invoice)
        .customer(customer_id);
    Ok(state.store.list_documents(&filter).await?)
}
