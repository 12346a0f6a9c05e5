//! # Reports
//!
//! Read-only summaries over a set of documents.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Document, DocumentKind, DocumentStatus};

/// True for an invoice that can still take a payment: positive balance and
/// not Paid or Voided.
pub fn is_outstanding(doc: &Document) -> bool {
    doc.kind == DocumentKind::Invoice
        && doc.balance_due.is_positive()
        && !matches!(doc.status, DocumentStatus::Paid | DocumentStatus::Voided)
}

/// The customer's invoices a bulk payment may be applied to, oldest first.
pub fn outstanding_invoices<'a>(documents: &'a [Document], customer_id: &str) -> Vec<&'a Document> {
    let mut invoices: Vec<&Document> = documents
        .iter()
        .filter(|d| d.customer_id == customer_id && is_outstanding(d))
        .collect();
    invoices.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    invoices
}

/// Receivables across all invoices. Voided invoices are left out entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceivablesSummary {
    pub invoice_count: usize,
    pub outstanding_count: usize,
    pub total_billed: Money,
    pub total_paid: Money,
    pub total_outstanding: Money,
}

/// Summarizes every non-voided invoice in `documents`.
///
/// Overpaid invoices contribute their payments to `total_paid` but nothing
/// to `total_outstanding`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use keystone_core::reports::summarize_receivables;
/// use keystone_core::{Customer, Document, DocumentKind, LineItem, Money};
///
/// let day = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
/// let mut doc = Document::new("inv-1", DocumentKind::Invoice, &Customer::new("c-1", "Acme"), day);
/// doc.line_items.push(LineItem::non_stock("li-1", "Gate", 1, Money::from_cents(5000)));
/// doc.recalculate();
///
/// let summary = summarize_receivables(&[doc]);
/// assert_eq!(summary.total_outstanding.cents(), 5000);
/// ```
pub fn summarize_receivables(documents: &[Document]) -> ReceivablesSummary {
    documents
        .iter()
        .filter(|d| d.kind == DocumentKind::Invoice && d.status != DocumentStatus::Voided)
        .fold(ReceivablesSummary::default(), |mut summary, doc| {
            summary.invoice_count += 1;
            summary.total_billed += doc.total;
            summary.total_paid += doc.amount_paid;
            if is_outstanding(doc) {
                summary.outstanding_count += 1;
                summary.total_outstanding += doc.balance_due;
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::record_payment;
    use crate::types::{Customer, LineItem, Payment, PaymentMethod};
    use chrono::NaiveDate;

    fn doc(id: &str, kind: DocumentKind, customer: &str, day: u32, cents: i64) -> Document {
        let date = NaiveDate::from_ymd_opt(2026, 7, day).unwrap();
        let mut doc = Document::new(id, kind, &Customer::new(customer, "Someone"), date);
        doc.line_items.push(LineItem::non_stock("li", "Work", 1, Money::from_cents(cents)));
        doc.recalculate();
        doc
    }

    fn pay(doc: &mut Document, cents: i64) {
        let date = doc.date;
        record_payment(doc, Payment::new("p", date, Money::from_cents(cents), PaymentMethod::Cash)).unwrap();
    }

    #[test]
    fn test_summarize_receivables() {
        let mut partly = doc("inv-1", DocumentKind::Invoice, "c-1", 1, 10000);
        pay(&mut partly, 4000);
        let mut paid = doc("inv-2", DocumentKind::Invoice, "c-1", 2, 2000);
        pay(&mut paid, 2000);
        let mut voided = doc("inv-3", DocumentKind::Invoice, "c-1", 3, 9900);
        voided.status = DocumentStatus::Voided;
        let estimate = doc("est-1", DocumentKind::Estimate, "c-1", 4, 50000);

        let summary = summarize_receivables(&[partly, paid, voided, estimate]);
        assert_eq!(summary.invoice_count, 2);
        assert_eq!(summary.outstanding_count, 1);
        assert_eq!(summary.total_billed.cents(), 12000);
        assert_eq!(summary.total_paid.cents(), 6000);
        assert_eq!(summary.total_outstanding.cents(), 6000);
    }

    #[test]
    fn test_outstanding_invoices_filter_and_order() {
        let later = doc("inv-b", DocumentKind::Invoice, "c-1", 20, 1000);
        let earlier = doc("inv-a", DocumentKind::Invoice, "c-1", 5, 1000);
        let other = doc("inv-c", DocumentKind::Invoice, "c-2", 1, 1000);
        let order = doc("ord-1", DocumentKind::Order, "c-1", 1, 1000);
        let mut paid = doc("inv-d", DocumentKind::Invoice, "c-1", 1, 1000);
        pay(&mut paid, 1000);
        let docs = vec![later, earlier, other, order, paid];

        let open: Vec<&str> = outstanding_invoices(&docs, "c-1").iter().map(|d| d.id.as_str()).collect();
        assert_eq!(open, vec!["inv-a", "inv-b"]);
    }

    #[test]
    fn test_zero_balance_invoice_is_not_outstanding() {
        let empty = doc("inv-1", DocumentKind::Invoice, "c-1", 1, 0);
        assert!(!is_outstanding(&empty));
    }
}
