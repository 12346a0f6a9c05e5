//! # Pricing Module
//!
//! Markup resolution and the non-stock cost/markup/price triangle.
//!
//! ## Rule Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_unit_price(product, customer)                                  │
//! │                                                                         │
//! │  customer? ── no ──────────────────────────────► product.price          │
//! │     │ yes                                                               │
//! │     ▼                                                                   │
//! │  rule for product.category? ── yes ──► cost × (1 + rule% / 100)        │
//! │     │ no                                                                │
//! │     ▼                                                                   │
//! │  "all categories" rule? ────── yes ──► cost × (1 + rule% / 100)        │
//! │     │ no                                                                │
//! │     ▼                                                                   │
//! │  product.price (catalog price, unchanged)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every result is rounded to whole cents.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Customer, LineItem, Product};
use crate::DEFAULT_MARKUP_PERCENTAGE;

// =============================================================================
// Policy
// =============================================================================

/// Tunables for pricing that are configuration rather than business data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Markup assumed by auto-cost when no customer rule applies.
    pub default_markup_percentage: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            default_markup_percentage: DEFAULT_MARKUP_PERCENTAGE,
        }
    }
}

// =============================================================================
// Rule Lookup
// =============================================================================

/// Where a resolved markup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MarkupSource {
    CategoryRule,
    AllCategoriesRule,
    Default,
}

/// A markup percentage together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedMarkup {
    pub markup_percentage: f64,
    pub source: MarkupSource,
}

/// Looks up the customer's markup for `category`.
///
/// Exact category rule first, then the all-categories rule. With no
/// customer, no category match and no all-categories rule, returns `None`;
/// the caller decides the fallback (catalog price, or the default markup).
/// A `None` category can only match the all-categories rule.
///
/// When a customer has several rules for the same scope, the first one wins.
pub fn resolve_markup(customer: Option<&Customer>, category: Option<&str>) -> Option<ResolvedMarkup> {
    let rules = &customer?.markup_rules;

    if let Some(category) = category {
        if let Some(rule) = rules.iter().find(|r| r.scope.matches_exactly(category)) {
            return Some(ResolvedMarkup {
                markup_percentage: rule.markup_percentage,
                source: MarkupSource::CategoryRule,
            });
        }
    }

    rules
        .iter()
        .find(|r| r.scope.is_all_categories())
        .map(|rule| ResolvedMarkup {
            markup_percentage: rule.markup_percentage,
            source: MarkupSource::AllCategoriesRule,
        })
}

/// Like [`resolve_markup`] but falls back to the policy default.
pub fn resolve_markup_or_default(
    customer: Option<&Customer>,
    category: Option<&str>,
    policy: &PricingPolicy,
) -> ResolvedMarkup {
    resolve_markup(customer, category).unwrap_or(ResolvedMarkup {
        markup_percentage: policy.default_markup_percentage,
        source: MarkupSource::Default,
    })
}

// =============================================================================
// Markup Resolver
// =============================================================================

/// Effective unit sale price of `product` for `customer`.
///
/// ## Example
/// ```rust
/// use keystone_core::pricing::resolve_unit_price;
/// use keystone_core::{CategoryScope, Customer, CustomerMarkupRule, Money, Product};
///
/// let mut product = Product::new("p-1", "Vinyl panel", "Fence", "each");
/// product.cost = Money::from_cents(1000);
/// product.price = Money::from_cents(1500);
///
/// let mut customer = Customer::new("c-1", "Contractor");
/// customer.markup_rules.push(CustomerMarkupRule::new(CategoryScope::AllCategories, 20.0));
///
/// assert_eq!(resolve_unit_price(&product, Some(&customer)).cents(), 1200);
/// ```
pub fn resolve_unit_price(product: &Product, customer: Option<&Customer>) -> Money {
    match resolve_markup(customer, Some(&product.category)) {
        Some(markup) => product.cost.apply_markup(markup.markup_percentage),
        None => product.price,
    }
}

/// Builds a catalog line for `product` priced for `customer`.
pub fn price_line_item(
    id: impl Into<String>,
    product: &Product,
    customer: Option<&Customer>,
    quantity: i64,
) -> LineItem {
    let unit_price = resolve_unit_price(product, customer);
    LineItem::for_product(id, product, unit_price, quantity)
}

// =============================================================================
// Cost / Markup / Price Triangle
// =============================================================================

/// The three mutually dependent pricing fields of a non-stock line (or a
/// product being edited).
///
/// The last edited field is authoritative and cost is the anchor: editing
/// cost or markup recomputes price, editing price recomputes markup. Cost is
/// never solved for.
///
/// ```text
///   edit cost   ──►  price  = cost × (1 + markup/100)
///   edit markup ──►  price  = cost × (1 + markup/100)
///   edit price  ──►  markup = cost > 0 ? (price/cost − 1) × 100 : 0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceTriangle {
    pub cost: Money,
    pub markup_percentage: f64,
    pub price: Money,
}

impl PriceTriangle {
    /// A consistent triangle derived from cost and markup.
    pub fn from_cost(cost: Money, markup_percentage: f64) -> Self {
        PriceTriangle {
            cost,
            markup_percentage,
            price: cost.apply_markup(markup_percentage),
        }
    }

    pub fn edit_cost(&mut self, cost: Money) {
        self.cost = cost;
        self.price = cost.apply_markup(self.markup_percentage);
    }

    pub fn edit_markup(&mut self, markup_percentage: f64) {
        self.markup_percentage = markup_percentage;
        self.price = self.cost.apply_markup(markup_percentage);
    }

    pub fn edit_price(&mut self, price: Money) {
        self.price = price;
        self.markup_percentage = derive_markup(self.cost, price);
    }

    /// Reads the triangle off a line item. Missing cost/markup read as zero.
    pub fn from_line_item(item: &LineItem) -> Self {
        PriceTriangle {
            cost: item.cost.unwrap_or_default(),
            markup_percentage: item.markup_percentage.unwrap_or(0.0),
            price: item.unit_price,
        }
    }

    /// Writes the triangle back onto a line item and refreshes its total.
    pub fn apply_to_line_item(&self, item: &mut LineItem) {
        item.cost = Some(self.cost);
        item.markup_percentage = Some(self.markup_percentage);
        item.unit_price = self.price;
        item.refresh_total();
    }

    pub fn from_product(product: &Product) -> Self {
        PriceTriangle {
            cost: product.cost,
            markup_percentage: product.markup_percentage,
            price: product.price,
        }
    }

    pub fn apply_to_product(&self, product: &mut Product) {
        product.cost = self.cost;
        product.markup_percentage = self.markup_percentage;
        product.price = self.price;
    }
}

/// Markup implied by a cost and price; zero when cost is not positive.
pub fn derive_markup(cost: Money, price: Money) -> f64 {
    if cost.is_positive() {
        (price.cents() as f64 / cost.cents() as f64 - 1.0) * 100.0
    } else {
        0.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
