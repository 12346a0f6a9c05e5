//! # Auto-Cost
//!
//! Back-calculates missing costs on non-stock lines from the price the user
//! typed in and the markup that would have produced it.
//!
//! ```text
//!   for each line where is_non_stock && cost is absent or zero:
//!
//!     category = new_product_category
//!             ?? category of the matching catalog product
//!             ?? none
//!     markup   = customer rule for category (exact, then all-categories)
//!             ?? policy default (35%)
//!     cost     = unit_price / (1 + markup / 100)        rounded to cents
//! ```
//!
//! Lines that already have a non-zero cost are left untouched. The input
//! document is never mutated; persisting the result is up to the caller.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::pricing::{resolve_markup_or_default, PricingPolicy};
use crate::types::{Customer, Document, LineItem, Product};

/// Result of an auto-cost pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AutoCostOutcome {
    /// The recalculated copy with costs filled in.
    pub document: Document,
    /// Ids of lines that received a cost.
    pub updated: Vec<String>,
    /// Ids of lines that needed a cost but resolved to a markup of -100% or
    /// lower, where dividing by the markup factor has no meaning.
    pub skipped: Vec<String>,
}

impl AutoCostOutcome {
    pub fn changed(&self) -> bool {
        !self.updated.is_empty()
    }
}

/// Fills in missing non-stock costs on a copy of `document`.
///
/// The customer is looked up in `customers` by `document.customer_id`; an
/// unknown customer simply has no rules, so every line falls back to the
/// policy default.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use keystone_core::auto_cost::auto_cost;
/// use keystone_core::pricing::PricingPolicy;
/// use keystone_core::{CategoryScope, Customer, CustomerMarkupRule, Document, DocumentKind, LineItem, Money};
///
/// let mut customer = Customer::new("c-1", "Acme");
/// customer.markup_rules.push(CustomerMarkupRule::new(CategoryScope::category("Fence"), 40.0));
///
/// let day = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
/// let mut doc = Document::new("inv-1", DocumentKind::Invoice, &customer, day);
/// let mut gate = LineItem::non_stock("li-1", "Custom gate", 1, Money::from_cents(1400));
/// gate.new_product_category = Some("Fence".to_string());
/// doc.line_items.push(gate);
///
/// let outcome = auto_cost(&doc, &[customer], &[], &PricingPolicy::default());
/// assert_eq!(outcome.document.line_items[0].cost, Some(Money::from_cents(1000)));
/// assert_eq!(outcome.updated, vec!["li-1".to_string()]);
/// ```
pub fn auto_cost(
    document: &Document,
    customers: &[Customer],
    products: &[Product],
    policy: &PricingPolicy,
) -> AutoCostOutcome {
    let customer = customers.iter().find(|c| c.id == document.customer_id);
    let mut result = document.clone();
    let mut updated = Vec::new();
    let mut skipped = Vec::new();

    for item in result.line_items.iter_mut().filter(|item| item.needs_cost()) {
        let category = item_category(item, products);
        let markup = resolve_markup_or_default(customer, category.as_deref(), policy);

        match item.unit_price.remove_markup(markup.markup_percentage) {
            Some(cost) => {
                item.cost = Some(cost);
                item.markup_percentage = Some(markup.markup_percentage);
                updated.push(item.id.clone());
            }
            None => skipped.push(item.id.clone()),
        }
    }

    if !updated.is_empty() {
        result.recalculate();
    }

    AutoCostOutcome {
        document: result,
        updated,
        skipped,
    }
}

/// Category used for markup lookup: the one typed on the line, else the
/// category of the catalog product it matches by id or by exact name.
fn item_category(item: &LineItem, products: &[Product]) -> Option<String> {
    if let Some(category) = &item.new_product_category {
        return Some(category.clone());
    }

    products
        .iter()
        .find(|p| match &item.product_id {
            Some(id) => &p.id == id,
            None => p.name == item.product_name,
        })
        .map(|p| p.category.clone())
}

// =============================================================================
// Unit Tests
// =============================================================================
