//! # Bulk Payment Allocation
//!
//! Applies one payment entered by a customer across several of that
//! customer's outstanding invoices.
//!
//! ## Policies
//! ```text
//! ┌──────────────────┬───────────────────────────────────────────────────────┐
//! │ FullAmountEach   │ every selected invoice gets a payment record for the │
//! │ (default)        │ full entered amount. $100 over 3 invoices credits    │
//! │                  │ $300 in total.                                        │
//! ├──────────────────┼───────────────────────────────────────────────────────┤
//! │ Proportional     │ the entered amount is split by balance due; the      │
//! │                  │ remainder cent goes to the last invoice. $100 over 3 │
//! │                  │ invoices credits exactly $100.                        │
//! └──────────────────┴───────────────────────────────────────────────────────┘
//! ```
//!
//! `FullAmountEach` is what the back office has always done, so it stays
//! the default. [`BulkAllocation::is_over_credited`] lets the caller flag it.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::ledger::record_payment;
use crate::money::Money;
use crate::reports::is_outstanding;
use crate::types::{Document, DocumentKind, Payment, PaymentMethod};

/// How a bulk payment is spread over the selected invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    #[default]
    FullAmountEach,
    Proportional,
}

impl std::str::FromStr for AllocationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "full_amount_each" | "full" => Ok(AllocationPolicy::FullAmountEach),
            "proportional" => Ok(AllocationPolicy::Proportional),
            _ => Err(format!("Unknown allocation policy: {}", s)),
        }
    }
}

/// The payment as entered on the bulk payment form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkPayment {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub amount: Money,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

/// Updated invoices ready to be saved, with the money actually credited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkAllocation {
    pub documents: Vec<Document>,
    /// Amount typed into the form.
    pub entered: Money,
    /// Sum of every payment record created.
    pub credited: Money,
}

impl BulkAllocation {
    /// True when more was credited than entered (full-amount policy over
    /// several invoices).
    pub fn is_over_credited(&self) -> bool {
        self.credited > self.entered
    }
}

/// Attaches `payment` to each selected invoice according to `policy`.
///
/// `documents` is the pool to pick from (typically the customer's
/// invoices); `next_id` supplies payment ids. Each returned document is
/// recalculated. Selected ids are deduplicated, order preserved.
///
/// ## Errors
/// - `NoInvoicesSelected` when `selected_ids` is empty
/// - `DocumentNotFound` for an id not in `documents`
/// - `InvoiceNotOutstanding` for a non-invoice, another customer's invoice,
///   or one that is Paid, Voided or has nothing left to pay
/// - `Validation` when the entered amount is not positive
pub fn allocate_bulk_payment(
    documents: &[Document],
    customer_id: &str,
    selected_ids: &[String],
    payment: &BulkPayment,
    policy: AllocationPolicy,
    mut next_id: impl FnMut() -> String,
) -> CoreResult<BulkAllocation> {
    crate::validation::validate_payment_amount(payment.amount)?;

    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for id in selected_ids.iter().filter(|id| seen.insert(id.as_str())) {
        let doc = documents
            .iter()
            .find(|d| &d.id == id)
            .ok_or_else(|| CoreError::DocumentNotFound(id.clone()))?;
        check_eligible(doc, customer_id)?;
        selected.push(doc.clone());
    }

    if selected.is_empty() {
        return Err(CoreError::NoInvoicesSelected);
    }

    let amounts = match policy {
        AllocationPolicy::FullAmountEach => vec![payment.amount; selected.len()],
        AllocationPolicy::Proportional => {
            let balances: Vec<Money> = selected.iter().map(|d| d.balance_due).collect();
            payment.amount.split_by_weights(&balances)
        }
    };

    let mut credited = Money::zero();
    for (doc, amount) in selected.iter_mut().zip(amounts) {
        // A tiny balance can round down to a zero share
        if !amount.is_positive() {
            continue;
        }
        let mut record = Payment::new(next_id(), payment.date, amount, payment.method);
        record.notes = payment.notes.clone();
        record_payment(doc, record)?;
        credited += amount;
    }

    Ok(BulkAllocation {
        documents: selected,
        entered: payment.amount,
        credited,
    })
}

fn check_eligible(doc: &Document, customer_id: &str) -> CoreResult<()> {
    let reason = if doc.kind != DocumentKind::Invoice {
        Some(format!("{} is not an invoice", doc.kind))
    } else if doc.customer_id != customer_id {
        Some("belongs to another customer".to_string())
    } else if !is_outstanding(doc) {
        Some(format!("status {} with balance {}", doc.status, doc.balance_due))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CoreError::InvoiceNotOutstanding {
            invoice_id: doc.id.clone(),
            reason,
        }),
        None => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Customer, DocumentStatus, LineItem};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 10).unwrap()
    }

    fn invoice(id: &str, customer: &Customer, cents: i64) -> Document {
        let mut doc = Document::new(id, DocumentKind::Invoice, customer, day());
        doc.status = DocumentStatus::Sent;
        doc.line_items.push(LineItem::non_stock("li", "Fence job", 1, Money::from_cents(cents)));
        doc.recalculate();
        doc
    }

    fn entered(cents: i64) -> BulkPayment {
        BulkPayment {
            date: day(),
            amount: Money::from_cents(cents),
            method: PaymentMethod::Check,
            notes: Some("check #1042".to_string()),
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("pay-{}", n)
        }
    }

    fn fixtures() -> (Customer, Vec<Document>) {
        let acme = Customer::new("c-1", "Acme");
        let other = Customer::new("c-2", "Other");
        let docs = vec![
            invoice("inv-1", &acme, 10000),
            invoice("inv-2", &acme, 30000),
            invoice("inv-3", &other, 5000),
        ];
        (acme, docs)
    }

    #[test]
    fn test_full_amount_each_credits_every_invoice() {
        let (_, docs) = fixtures();
        let result = allocate_bulk_payment(
            &docs,
            "c-1",
            &ids(&["inv-1", "inv-2"]),
            &entered(10000),
            AllocationPolicy::FullAmountEach,
            counter(),
        )
        .unwrap();

        assert_eq!(result.documents.len(), 2);
        assert_eq!(result.documents[0].status, DocumentStatus::Paid);
        assert_eq!(result.documents[1].status, DocumentStatus::PartiallyPaid);
        assert_eq!(result.documents[1].balance_due.cents(), 20000);
        assert_eq!(result.credited.cents(), 20000);
        assert!(result.is_over_credited());
        assert_eq!(result.documents[0].payments[0].notes.as_deref(), Some("check #1042"));
    }

    #[test]
    fn test_proportional_split_by_balance() {
        let (_, docs) = fixtures();
        let result = allocate_bulk_payment(
            &docs,
            "c-1",
            &ids(&["inv-1", "inv-2"]),
            &entered(10001),
            AllocationPolicy::Proportional,
            counter(),
        )
        .unwrap();

        assert_eq!(result.documents[0].amount_paid.cents(), 2500);
        assert_eq!(result.documents[1].amount_paid.cents(), 7501);
        assert_eq!(result.credited, result.entered);
        assert!(!result.is_over_credited());
    }

    #[test]
    fn test_payment_ids_come_from_generator() {
        let (_, docs) = fixtures();
        let result = allocate_bulk_payment(
            &docs,
            "c-1",
            &ids(&["inv-2", "inv-1", "inv-2"]),
            &entered(100),
            AllocationPolicy::FullAmountEach,
            counter(),
        )
        .unwrap();

        assert_eq!(result.documents.len(), 2);
        assert_eq!(result.documents[0].id, "inv-2");
        assert_eq!(result.documents[0].payments[0].id, "pay-1");
        assert_eq!(result.documents[1].payments[0].id, "pay-2");
    }

    #[test]
    fn test_other_customers_invoice_rejected() {
        let (_, docs) = fixtures();
        let err = allocate_bulk_payment(
            &docs,
            "c-1",
            &ids(&["inv-1", "inv-3"]),
            &entered(100),
            AllocationPolicy::FullAmountEach,
            counter(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvoiceNotOutstanding { ref invoice_id, .. } if invoice_id == "inv-3"));
    }

    #[test]
    fn test_paid_and_voided_invoices_rejected() {
        let (acme, mut docs) = fixtures();
        let mut voided = invoice("inv-4", &acme, 1000);
        voided.status = DocumentStatus::Voided;
        voided.recalculate();
        docs.push(voided);

        let mut paid = invoice("inv-5", &acme, 1000);
        record_payment(&mut paid, Payment::new("p", day(), Money::from_cents(1000), PaymentMethod::Cash)).unwrap();
        docs.push(paid);

        for id in ["inv-4", "inv-5"] {
            let err = allocate_bulk_payment(
                &docs,
                "c-1",
                &ids(&[id]),
                &entered(100),
                AllocationPolicy::FullAmountEach,
                counter(),
            )
            .unwrap_err();
            assert!(matches!(err, CoreError::InvoiceNotOutstanding { .. }), "{}", id);
        }
    }

    #[test]
    fn test_empty_selection_and_unknown_id() {
        let (_, docs) = fixtures();
        let err = allocate_bulk_payment(&docs, "c-1", &[], &entered(100), AllocationPolicy::default(), counter())
            .unwrap_err();
        assert!(matches!(err, CoreError::NoInvoicesSelected));

        let err = allocate_bulk_payment(
            &docs,
            "c-1",
            &ids(&["nope"]),
            &entered(100),
            AllocationPolicy::default(),
            counter(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::DocumentNotFound(_)));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let (_, docs) = fixtures();
        let err = allocate_bulk_payment(
            &docs,
            "c-1",
            &ids(&["inv-1"]),
            &entered(0),
            AllocationPolicy::default(),
            counter(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("proportional".parse::<AllocationPolicy>().unwrap(), AllocationPolicy::Proportional);
        assert_eq!("full-amount-each".parse::<AllocationPolicy>().unwrap(), AllocationPolicy::FullAmountEach);
        assert!("split".parse::<AllocationPolicy>().is_err());
    }
}
