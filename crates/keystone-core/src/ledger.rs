//! # Payment Ledger
//!
//! Turns a document total and its payment list into amount paid, balance
//! due and (for invoices) a derived status.
//!
//! ## Invoice Status Table
//! ```text
//! ┌──────────────────────────────────────────────┬───────────────────────┐
//! │ Condition (checked top to bottom)            │ Status                │
//! ├──────────────────────────────────────────────┼───────────────────────┤
//! │ user selected Voided                         │ Voided                │
//! │ balance_due ≤ 0  and  total > 0              │ Paid                  │
//! │ amount_paid > 0  and  balance_due > 0        │ Partially Paid        │
//! │ otherwise                                    │ user-selected status  │
//! └──────────────────────────────────────────────┴───────────────────────┘
//! ```
//!
//! Amounts are whole cents, so the half-cent tolerance a floating point
//! ledger needs collapses to "≤ 0".
//!
//! Payments are an unordered list against the whole document. Removing one
//! is a hard delete followed by recalculation; no reversal record is kept.
//! An invoice whose Paid / Partially Paid status came from payments goes
//! back to Sent when a removal leaves it unsettled.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Document, DocumentStatus, Payment};
use crate::validation::validate_payment;

/// Result of [`reconcile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reconciliation {
    pub amount_paid: Money,
    pub balance_due: Money,
    pub status: DocumentStatus,
}

/// Sums payments and derives balance and invoice status.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use keystone_core::ledger::reconcile;
/// use keystone_core::{DocumentStatus, Money, Payment, PaymentMethod};
///
/// let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
/// let payments = vec![Payment::new("p1", day, Money::from_cents(5000), PaymentMethod::Cash)];
///
/// let r = reconcile(Money::from_cents(10000), &payments, DocumentStatus::Sent);
/// assert_eq!(r.balance_due.cents(), 5000);
/// assert_eq!(r.status, DocumentStatus::PartiallyPaid);
/// ```
pub fn reconcile(total: Money, payments: &[Payment], selected: DocumentStatus) -> Reconciliation {
    let amount_paid: Money = payments.iter().map(|p| p.amount).sum();
    let balance_due = total - amount_paid;

    Reconciliation {
        amount_paid,
        balance_due,
        status: derive_invoice_status(total, amount_paid, balance_due, selected),
    }
}

/// Applies the invoice status table to already-computed ledger figures.
pub fn derive_invoice_status(
    total: Money,
    amount_paid: Money,
    balance_due: Money,
    selected: DocumentStatus,
) -> DocumentStatus {
    if selected == DocumentStatus::Voided {
        DocumentStatus::Voided
    } else if !balance_due.is_positive() && total.is_positive() {
        DocumentStatus::Paid
    } else if amount_paid.is_positive() && balance_due.is_positive() {
        DocumentStatus::PartiallyPaid
    } else {
        selected
    }
}

/// Appends a payment to an order or invoice and recalculates it.
///
/// ## Errors
/// - `UnsupportedForKind` for estimates
/// - `Validation` when the amount is not positive or the id is blank
pub fn record_payment(doc: &mut Document, payment: Payment) -> CoreResult<()> {
    if !doc.kind.accepts_payments() {
        return Err(CoreError::UnsupportedForKind {
            kind: doc.kind,
            operation: "Recording a payment".to_string(),
        });
    }
    validate_payment(&payment)?;

    doc.payments.push(payment);
    doc.recalculate();
    Ok(())
}

/// Hard-deletes a payment and recalculates the document.
///
/// Returns the removed payment.
pub fn remove_payment(doc: &mut Document, payment_id: &str) -> CoreResult<Payment> {
    let index = doc
        .payments
        .iter()
        .position(|p| p.id == payment_id)
        .ok_or_else(|| CoreError::PaymentNotFound(payment_id.to_string()))?;

    let removed = doc.payments.remove(index);

    // Paid / Partially Paid was derived from the payment list
    if doc.kind.derives_status_from_payments()
        && matches!(doc.status, DocumentStatus::Paid | DocumentStatus::PartiallyPaid)
    {
        doc.status = DocumentStatus::Sent;
    }
    doc.recalculate();
    Ok(removed)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Customer, DocumentKind, LineItem, PaymentMethod};
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    fn pay(id: &str, cents: i64) -> Payment {
        Payment::new(id, day(), Money::from_cents(cents), PaymentMethod::Check)
    }

    fn invoice(total_cents: i64) -> Document {
        let customer = Customer::new("c-1", "Acme");
        let mut doc = Document::new("inv-1", DocumentKind::Invoice, &customer, day());
        doc.status = DocumentStatus::Sent;
        doc.line_items.push(LineItem::non_stock("a", "Work", 1, Money::from_cents(total_cents)));
        doc.recalculate();
        doc
    }

    #[test]
    fn test_status_boundaries() {
        let total = Money::from_cents(10000);

        let r = reconcile(total, &[pay("p1", 10000)], DocumentStatus::Sent);
        assert_eq!(r.status, DocumentStatus::Paid);

        let r = reconcile(total, &[pay("p1", 5000)], DocumentStatus::Sent);
        assert_eq!(r.status, DocumentStatus::PartiallyPaid);

        let r = reconcile(total, &[], DocumentStatus::Sent);
        assert_eq!(r.status, DocumentStatus::Sent);
    }

    #[test]
    fn test_unsettled_falls_through_to_selected_status() {
        let total = Money::from_cents(10000);

        let r = reconcile(total, &[], DocumentStatus::Paid);
        assert_eq!(r.status, DocumentStatus::Paid);

        let r = reconcile(total, &[], DocumentStatus::PartiallyPaid);
        assert_eq!(r.status, DocumentStatus::PartiallyPaid);

        let r = reconcile(total, &[], DocumentStatus::Overdue);
        assert_eq!(r.status, DocumentStatus::Overdue);
    }

    #[test]
    fn test_split_payments_settle_exactly() {
        let r = reconcile(
            Money::from_cents(10000),
            &[pay("a", 3333), pay("b", 3333), pay("c", 3334)],
            DocumentStatus::Sent,
        );
        assert!(r.balance_due.is_zero());
        assert_eq!(r.status, DocumentStatus::Paid);
    }

    #[test]
    fn test_voided_is_sticky() {
        let r = reconcile(Money::from_cents(10000), &[pay("p1", 10000)], DocumentStatus::Voided);
        assert_eq!(r.status, DocumentStatus::Voided);
    }

    #[test]
    fn test_overpayment_is_paid_with_negative_balance() {
        let r = reconcile(Money::from_cents(10000), &[pay("p1", 12000)], DocumentStatus::Sent);
        assert_eq!(r.status, DocumentStatus::Paid);
        assert_eq!(r.balance_due.cents(), -2000);
    }

    #[test]
    fn test_zero_total_is_never_paid() {
        let r = reconcile(Money::zero(), &[], DocumentStatus::Draft);
        assert_eq!(r.status, DocumentStatus::Draft);
    }

    #[test]
    fn test_balance_identity() {
        for (total, paid) in [(10000, 0), (10000, 2550), (999, 1500), (0, 0), (-500, 0)] {
            let payments = if paid > 0 { vec![pay("p", paid)] } else { vec![] };
            let r = reconcile(Money::from_cents(total), &payments, DocumentStatus::Sent);
            assert_eq!((r.amount_paid + r.balance_due).cents(), total);
        }
    }

    #[test]
    fn test_record_and_remove_payment() {
        let mut doc = invoice(10000);
        record_payment(&mut doc, pay("p1", 10000)).unwrap();
        assert_eq!(doc.status, DocumentStatus::Paid);

        let removed = remove_payment(&mut doc, "p1").unwrap();
        assert_eq!(removed.amount.cents(), 10000);
        assert!(doc.payments.is_empty());
        assert_eq!(doc.balance_due.cents(), 10000);
        assert_eq!(doc.status, DocumentStatus::Sent);
    }

    #[test]
    fn test_remove_one_of_two_payments_stays_partially_paid() {
        let mut doc = invoice(10000);
        record_payment(&mut doc, pay("p1", 6000)).unwrap();
        record_payment(&mut doc, pay("p2", 4000)).unwrap();
        assert_eq!(doc.status, DocumentStatus::Paid);

        remove_payment(&mut doc, "p2").unwrap();
        assert_eq!(doc.status, DocumentStatus::PartiallyPaid);
    }

    #[test]
    fn test_remove_payment_keeps_voided() {
        let mut doc = invoice(10000);
        record_payment(&mut doc, pay("p1", 10000)).unwrap();
        doc.status = DocumentStatus::Voided;
        doc.recalculate();

        remove_payment(&mut doc, "p1").unwrap();
        assert_eq!(doc.status, DocumentStatus::Voided);
    }

    #[test]
    fn test_remove_unknown_payment() {
        let mut doc = invoice(10000);
        let err = remove_payment(&mut doc, "missing").unwrap_err();
        assert!(matches!(err, CoreError::PaymentNotFound(_)));
    }

    #[test]
    fn test_estimates_reject_payments() {
        let customer = Customer::new("c-1", "Acme");
        let mut doc = Document::new("est-1", DocumentKind::Estimate, &customer, day());
        let err = record_payment(&mut doc, pay("p1", 100)).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedForKind { .. }));
    }

    #[test]
    fn test_oversized_payments_rejected_before_summing() {
        let mut doc = invoice(10000);
        let pasted = Money::parse("92233720368547758.07").unwrap();
        let payment = |id: &str| Payment::new(id, day(), pasted, PaymentMethod::Cash);

        assert!(matches!(
            record_payment(&mut doc, payment("p1")),
            Err(CoreError::Validation(_))
        ));
        assert!(record_payment(&mut doc, payment("p2")).is_err());
        assert!(doc.payments.is_empty());
        assert_eq!(doc.balance_due.cents(), 10000);
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let mut doc = invoice(10000);
        let err = record_payment(&mut doc, pay("p1", 0)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(doc.payments.is_empty());
    }
}
