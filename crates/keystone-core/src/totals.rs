//! # Totals Module
//!
//! Line totals and document aggregation.
//!
//! ```text
//!   line.total  = quantity × unit_price × (is_return ? -1 : 1)
//!   subtotal    = Σ line.total
//!   tax_amount  = subtotal × tax_rate          (zero rate in practice)
//!   total       = subtotal + tax_amount
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger::reconcile;
use crate::money::Money;
use crate::types::{Document, LineItem, TaxRate};

/// Signed total of a single line.
///
/// ```rust
/// use keystone_core::money::Money;
/// use keystone_core::totals::line_total;
///
/// assert_eq!(line_total(3, Money::from_cents(250), false).cents(), 750);
/// assert_eq!(line_total(3, Money::from_cents(250), true).cents(), -750);
/// ```
pub fn line_total(quantity: i64, unit_price: Money, is_return: bool) -> Money {
    let gross = unit_price.multiply_quantity(quantity);
    if is_return {
        -gross
    } else {
        gross
    }
}

impl LineItem {
    /// Recomputes `total` from quantity, unit price and the return flag.
    pub fn refresh_total(&mut self) {
        self.total = line_total(self.quantity, self.unit_price, self.is_return);
    }
}

/// Subtotal, tax and total of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentTotals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub total: Money,
}

impl DocumentTotals {
    /// Aggregates line totals. Each line's total is recomputed rather than
    /// trusted, so a stale stored total cannot leak into the subtotal.
    pub fn compute(items: &[LineItem], tax_rate: TaxRate) -> Self {
        let subtotal: Money = items
            .iter()
            .map(|item| line_total(item.quantity, item.unit_price, item.is_return))
            .sum();
        let tax_amount = subtotal.calculate_tax(tax_rate);

        DocumentTotals {
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
        }
    }
}

impl Document {
    /// Refreshes every derived field: line totals, subtotal, tax, total,
    /// amount paid, balance due and (for invoices) status.
    ///
    /// Call after any edit to lines, payments or status; the store layer
    /// also calls it before every write.
    pub fn recalculate(&mut self) {
        for item in &mut self.line_items {
            item.refresh_total();
        }

        let totals = DocumentTotals::compute(&self.line_items, self.tax_rate);
        self.subtotal = totals.subtotal;
        self.tax_amount = totals.tax_amount;
        self.total = totals.total;

        let reconciliation = reconcile(self.total, &self.payments, self.status);
        self.amount_paid = reconciliation.amount_paid;
        self.balance_due = reconciliation.balance_due;
        if self.kind.derives_status_from_payments() {
            self.status = reconciliation.status;
        }
    }

    /// Returns a recalculated copy, leaving `self` untouched.
    pub fn recalculated(&self) -> Document {
        let mut doc = self.clone();
        doc.recalculate();
        doc
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Customer, DocumentKind, DocumentStatus, Payment, PaymentMethod};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn test_line_total_sign() {
        for (qty, cents) in [(1, 0), (1, 1), (7, 1999), (120, 45)] {
            let price = Money::from_cents(cents);
            assert_eq!(line_total(qty, price, false).cents(), qty * cents);
            assert_eq!(line_total(qty, price, true).cents(), -(qty * cents));
        }
    }

    #[test]
    fn test_compute_with_return_line() {
        let items = vec![
            LineItem::non_stock("a", "Panel", 4, Money::from_cents(2500)),
            LineItem::non_stock("b", "Damaged panel", 1, Money::from_cents(2500)).as_return(),
        ];
        let totals = DocumentTotals::compute(&items, TaxRate::zero());
        assert_eq!(totals.subtotal.cents(), 7500);
        assert!(totals.tax_amount.is_zero());
        assert_eq!(totals.total.cents(), 7500);
    }

    #[test]
    fn test_compute_ignores_stale_line_totals() {
        let mut item = LineItem::non_stock("a", "Panel", 2, Money::from_cents(1000));
        item.total = Money::from_cents(1);
        let totals = DocumentTotals::compute(&[item], TaxRate::zero());
        assert_eq!(totals.subtotal.cents(), 2000);
    }

    #[test]
    fn test_compute_with_tax() {
        let items = vec![LineItem::non_stock("a", "Panel", 1, Money::from_cents(1000))];
        let totals = DocumentTotals::compute(&items, TaxRate::from_bps(825));
        assert_eq!(totals.tax_amount.cents(), 83);
        assert_eq!(totals.total.cents(), 1083);
    }

    #[test]
    fn test_recalculate_invoice() {
        let customer = Customer::new("c-1", "Acme");
        let mut doc = Document::new("inv-1", DocumentKind::Invoice, &customer, date());
        doc.status = DocumentStatus::Sent;
        doc.line_items.push(LineItem::non_stock("a", "Gate", 1, Money::from_cents(10000)));
        doc.payments.push(Payment::new("pay-1", date(), Money::from_cents(4000), PaymentMethod::Check));
        doc.recalculate();

        assert_eq!(doc.subtotal.cents(), 10000);
        assert_eq!(doc.total.cents(), 10000);
        assert_eq!(doc.amount_paid.cents(), 4000);
        assert_eq!(doc.balance_due.cents(), 6000);
        assert_eq!(doc.status, DocumentStatus::PartiallyPaid);
        assert_eq!(doc.amount_paid + doc.balance_due, doc.total);
    }

    #[test]
    fn test_recalculate_order_keeps_selected_status() {
        let customer = Customer::new("c-1", "Acme");
        let mut doc = Document::new("ord-1", DocumentKind::Order, &customer, date());
        doc.status = DocumentStatus::Processing;
        doc.line_items.push(LineItem::non_stock("a", "Gate", 1, Money::from_cents(10000)));
        doc.payments.push(Payment::new("pay-1", date(), Money::from_cents(10000), PaymentMethod::Cash));
        doc.recalculate();

        assert!(doc.balance_due.is_zero());
        assert_eq!(doc.status, DocumentStatus::Processing);
    }

    #[test]
    fn test_recalculated_does_not_mutate() {
        let customer = Customer::new("c-1", "Acme");
        let mut doc = Document::new("est-1", DocumentKind::Estimate, &customer, date());
        doc.line_items.push(LineItem::non_stock("a", "Gate", 2, Money::from_cents(500)));
        let fresh = doc.recalculated();
        assert!(doc.total.is_zero());
        assert_eq!(fresh.total.cents(), 1000);
        assert_eq!(fresh.balance_due, fresh.total);
    }
}
