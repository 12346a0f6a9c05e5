//! # keystone-core: Pricing & Ledger Rules for Keystone Back Office
//!
//! This crate is the single home of the back-office arithmetic: markup
//! resolution, line and document totals, payment reconciliation and status
//! derivation. Estimate, order and invoice forms all call into it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Keystone Back Office                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  keystone-cli (commands)                        │   │
//! │  │   save_document, run_auto_cost, record_payment, bulk_pay ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ keystone-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐  │   │
//! │  │  │ pricing │ │ totals  │ │ ledger  │ │allocation│ │ catalog │  │   │
//! │  │  │ markup  │ │ lines   │ │ paid /  │ │ bulk pay │ │ promote │  │   │
//! │  │  │ triangle│ │ subtotal│ │ status  │ │          │ │ nonstock│  │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └──────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 keystone-db (Persistence Layer)                 │   │
//! │  │        DocumentStore / CatalogStore, SQLite + in-memory         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, LineItem, Payment, Document)
//! - [`money`] - Integer-cent money type
//! - [`pricing`] - Markup resolver and the non-stock cost/markup/price triangle
//! - [`auto_cost`] - Batch back-calculation of missing non-stock costs
//! - [`totals`] - Line totals and document aggregation
//! - [`ledger`] - Payment reconciliation and invoice status derivation
//! - [`allocation`] - Bulk payment allocation across invoices
//! - [`catalog`] - Promotion of non-stock items into the catalog
//! - [`draft`] - Staged edits against a loaded document snapshot
//! - [`reports`] - Receivables summaries
//! - [`validation`] - Form-level validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use keystone_core::pricing::resolve_unit_price;
//! use keystone_core::{CategoryScope, Customer, CustomerMarkupRule, Money, Product};
//!
//! let mut product = Product::new("p-1", "Cedar picket", "Fence", "each");
//! product.cost = Money::from_cents(1000);
//! product.price = Money::from_cents(1350);
//!
//! let mut customer = Customer::new("c-1", "Acme Builders");
//! customer.markup_rules.push(CustomerMarkupRule::new(CategoryScope::category("Fence"), 40.0));
//!
//! // Customer rule wins over the catalog price
//! assert_eq!(resolve_unit_price(&product, Some(&customer)).cents(), 1400);
//! // No customer: catalog price unchanged
//! assert_eq!(resolve_unit_price(&product, None).cents(), 1350);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod auto_cost;
pub mod catalog;
pub mod draft;
pub mod error;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod reports;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Markup applied when neither a category rule nor an all-categories rule
/// matches during auto-cost.
pub const DEFAULT_MARKUP_PERCENTAGE: f64 = 35.0;

/// Category given to promoted non-stock items that did not name one.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Unit given to promoted non-stock items that did not name one.
pub const DEFAULT_UNIT: &str = "each";

/// Maximum quantity on a single line item.
///
/// ## Business Reason
/// Catches typos like 10000 instead of 100 on bulk material orders.
pub const MAX_ITEM_QUANTITY: i64 = 99_999;

/// Maximum number of line items on one document.
pub const MAX_LINE_ITEMS: usize = 500;

/// Largest price, cost or payment accepted, in cents ($10,000,000.00).
///
/// ## Business Reason
/// Catches a pasted account or check number in an amount field, and keeps
/// document and ledger sums well inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000;
