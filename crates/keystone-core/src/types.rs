//! # Domain Types
//!
//! Core domain types shared by every Keystone form.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │    Document     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  category       │   │  markup_rules ──┼─┐ │  kind           │       │
//! │  │  cost           │   └─────────────────┘ │ │  line_items[]   │       │
//! │  │  price          │                       │ │  payments[]     │       │
//! │  │  markup %       │   ┌─────────────────┐ │ │  subtotal/total │       │
//! │  └─────────────────┘   │ CustomerMarkup  │◄┘ │  amount_paid    │       │
//! │                        │      Rule       │   │  balance_due    │       │
//! │                        │  scope, markup% │   │  status         │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  DocumentKind: Estimate | Order | Invoice                              │
//! │  DocumentStatus: shared enum, each kind allows a subset                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Documents are replaced wholesale on every save: the line-item and payment
//! arrays travel with the document, there are no per-row updates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (825 = 8.25%).
///
/// Documents default to a zero rate; most customers are billed tax-free and
/// the tax column stays at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (8.25 → 825 bps).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// `price` is normally `cost × (1 + markup_percentage/100)`, but the product
/// form lets any of the three be edited independently; see
/// [`crate::pricing::PriceTriangle`] for how the other two follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Selling unit ("each", "ft", "bag", ...).
    pub unit: String,
    pub cost: Money,
    /// Catalog sale price, used when no customer rule applies.
    pub price: Money,
    pub markup_percentage: f64,
    /// `None` for products that are not stock-tracked.
    pub quantity_in_stock: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a zero-priced product; callers fill in cost/price.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Product {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            unit: unit.into(),
            cost: Money::zero(),
            price: Money::zero(),
            markup_percentage: 0.0,
            quantity_in_stock: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks if `quantity` can be supplied from stock.
    /// Untracked products are always available.
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        match self.quantity_in_stock {
            Some(stock) => stock >= quantity,
            None => true,
        }
    }
}

// =============================================================================
// Customers & Markup Rules
// =============================================================================

/// Which products a markup rule covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "scope", content = "name", rename_all = "snake_case")]
pub enum CategoryScope {
    /// The "all categories" sentinel: applies when no exact category rule does.
    AllCategories,
    /// Exact (case-sensitive) category name.
    Category(String),
}

impl CategoryScope {
    pub fn category(name: impl Into<String>) -> Self {
        CategoryScope::Category(name.into())
    }

    /// True when this is an exact-category rule for `category`.
    pub fn matches_exactly(&self, category: &str) -> bool {
        matches!(self, CategoryScope::Category(name) if name == category)
    }

    pub fn is_all_categories(&self) -> bool {
        matches!(self, CategoryScope::AllCategories)
    }
}

/// A customer-specific markup applied to product cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerMarkupRule {
    pub scope: CategoryScope,
    pub markup_percentage: f64,
}

impl CustomerMarkupRule {
    pub fn new(scope: CategoryScope, markup_percentage: f64) -> Self {
        CustomerMarkupRule {
            scope,
            markup_percentage,
        }
    }
}

/// A customer account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Zero or more markup rules; see [`crate::pricing::resolve_markup`].
    pub markup_rules: Vec<CustomerMarkupRule>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Customer {
            id: id.into(),
            name: name.into(),
            email: None,
            phone: None,
            markup_rules: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Document Kind & Status
// =============================================================================

/// The three document types built from the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Estimate,
    Order,
    Invoice,
}

impl DocumentKind {
    /// Statuses a user may select (or the ledger may derive) for this kind.
    pub fn allowed_statuses(&self) -> &'static [DocumentStatus] {
        use DocumentStatus::*;
        match self {
            DocumentKind::Estimate => &[Draft, Sent, Accepted, Declined],
            DocumentKind::Order => &[Pending, Processing, Completed, Cancelled],
            DocumentKind::Invoice => &[Draft, Sent, PartiallyPaid, Paid, Overdue, Voided],
        }
    }

    pub fn allows_status(&self, status: DocumentStatus) -> bool {
        self.allowed_statuses().contains(&status)
    }

    /// Status a freshly created document starts in.
    pub fn default_status(&self) -> DocumentStatus {
        match self {
            DocumentKind::Estimate | DocumentKind::Invoice => DocumentStatus::Draft,
            DocumentKind::Order => DocumentStatus::Pending,
        }
    }

    /// Orders and invoices carry a payment ledger; estimates do not.
    pub fn accepts_payments(&self) -> bool {
        matches!(self, DocumentKind::Order | DocumentKind::Invoice)
    }

    /// Only invoices have their status derived from the ledger.
    pub fn derives_status_from_payments(&self) -> bool {
        matches!(self, DocumentKind::Invoice)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Estimate => "estimate",
            DocumentKind::Order => "order",
            DocumentKind::Invoice => "invoice",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "estimate" | "estimates" => Ok(DocumentKind::Estimate),
            "order" | "orders" => Ok(DocumentKind::Order),
            "invoice" | "invoices" => Ok(DocumentKind::Invoice),
            _ => Err(format!("Unknown document kind: {}", s)),
        }
    }
}

/// Shared status enum; each [`DocumentKind`] allows a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
    Pending,
    Processing,
    Completed,
    Cancelled,
    PartiallyPaid,
    Paid,
    Overdue,
    Voided,
}

impl DocumentStatus {
    /// Human label as shown on status badges.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "Draft",
            DocumentStatus::Sent => "Sent",
            DocumentStatus::Accepted => "Accepted",
            DocumentStatus::Declined => "Declined",
            DocumentStatus::Pending => "Pending",
            DocumentStatus::Processing => "Processing",
            DocumentStatus::Completed => "Completed",
            DocumentStatus::Cancelled => "Cancelled",
            DocumentStatus::PartiallyPaid => "Partially Paid",
            DocumentStatus::Paid => "Paid",
            DocumentStatus::Overdue => "Overdue",
            DocumentStatus::Voided => "Voided",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Payments
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Check,
    CreditCard,
    BankTransfer,
    Other,
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "check" | "cheque" => Ok(PaymentMethod::Check),
            "credit_card" | "card" => Ok(PaymentMethod::CreditCard),
            "bank_transfer" | "transfer" | "ach" => Ok(PaymentMethod::BankTransfer),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(format!("Unknown payment method: {}", s)),
        }
    }
}

/// A payment recorded against an order or invoice.
///
/// Payments reduce the document's aggregate balance; they are not applied
/// to individual line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub amount: Money,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

impl Payment {
    pub fn new(id: impl Into<String>, date: NaiveDate, amount: Money, method: PaymentMethod) -> Self {
        Payment {
            id: id.into(),
            date,
            amount,
            method,
            notes: None,
        }
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// A line on an estimate, order or invoice.
///
/// Catalog lines carry a `product_id`. Non-stock lines do not; their cost,
/// markup and price are typed in per document, and they may be flagged for
/// promotion into the catalog (`unit`, `new_product_category`,
/// `add_to_product_list`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    pub product_id: Option<String>,
    pub product_name: String,
    /// Always ≥ 1; returns are expressed with `is_return`, not a negative quantity.
    pub quantity: i64,
    pub unit_price: Money,
    /// Signed: negative when `is_return`.
    pub total: Money,
    #[serde(default)]
    pub is_return: bool,
    #[serde(default)]
    pub is_non_stock: bool,
    pub cost: Option<Money>,
    pub markup_percentage: Option<f64>,
    pub unit: Option<String>,
    pub new_product_category: Option<String>,
    #[serde(default)]
    pub add_to_product_list: bool,
}

impl LineItem {
    /// A line backed by a catalog product at the given unit price.
    pub fn for_product(id: impl Into<String>, product: &Product, unit_price: Money, quantity: i64) -> Self {
        let mut item = LineItem {
            id: id.into(),
            product_id: Some(product.id.clone()),
            product_name: product.name.clone(),
            quantity,
            unit_price,
            total: Money::zero(),
            is_return: false,
            is_non_stock: false,
            cost: None,
            markup_percentage: None,
            unit: Some(product.unit.clone()),
            new_product_category: None,
            add_to_product_list: false,
        };
        item.refresh_total();
        item
    }

    /// A manually priced line with no catalog product behind it.
    pub fn non_stock(
        id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        let mut item = LineItem {
            id: id.into(),
            product_id: None,
            product_name: product_name.into(),
            quantity,
            unit_price,
            total: Money::zero(),
            is_return: false,
            is_non_stock: true,
            cost: None,
            markup_percentage: None,
            unit: None,
            new_product_category: None,
            add_to_product_list: false,
        };
        item.refresh_total();
        item
    }

    /// Marks the line as a return and refreshes its signed total.
    pub fn as_return(mut self) -> Self {
        self.is_return = true;
        self.refresh_total();
        self
    }

    /// True when auto-cost should back-calculate this line's cost.
    pub fn needs_cost(&self) -> bool {
        self.is_non_stock && self.cost.map_or(true, |c| c.is_zero())
    }
}

// =============================================================================
// Documents
// =============================================================================

/// An estimate, order or invoice.
///
/// Derived fields (`subtotal`, `tax_amount`, `total`, `amount_paid`,
/// `balance_due`, and for invoices `status`) are refreshed by
/// [`Document::recalculate`](crate::totals); callers should not set them by
/// hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Document {
    pub id: String,
    pub kind: DocumentKind,
    pub customer_id: String,
    pub customer_name: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub line_items: Vec<LineItem>,
    pub subtotal: Money,
    #[serde(default)]
    pub tax_rate: TaxRate,
    pub tax_amount: Money,
    pub total: Money,
    pub status: DocumentStatus,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub amount_paid: Money,
    #[serde(default)]
    pub balance_due: Money,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates an empty document in its kind's default status.
    pub fn new(id: impl Into<String>, kind: DocumentKind, customer: &Customer, date: NaiveDate) -> Self {
        let now = Utc::now();
        Document {
            id: id.into(),
            kind,
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            date,
            line_items: Vec::new(),
            subtotal: Money::zero(),
            tax_rate: TaxRate::zero(),
            tax_amount: Money::zero(),
            total: Money::zero(),
            status: kind.default_status(),
            payments: Vec::new(),
            amount_paid: Money::zero(),
            balance_due: Money::zero(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn find_line_item(&self, id: &str) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.id == id)
    }

    pub fn find_payment(&self, id: &str) -> Option<&Payment> {
        self.payments.iter().find(|p| p.id == id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(8.25);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_status_subsets() {
        assert!(DocumentKind::Invoice.allows_status(DocumentStatus::Paid));
        assert!(!DocumentKind::Estimate.allows_status(DocumentStatus::Paid));
        assert!(DocumentKind::Estimate.allows_status(DocumentStatus::Accepted));
        assert!(!DocumentKind::Order.allows_status(DocumentStatus::Voided));
        for kind in [DocumentKind::Estimate, DocumentKind::Order, DocumentKind::Invoice] {
            assert!(kind.allows_status(kind.default_status()));
        }
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Invoice".parse::<DocumentKind>().unwrap(), DocumentKind::Invoice);
        assert_eq!("orders".parse::<DocumentKind>().unwrap(), DocumentKind::Order);
        assert!("quote".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("credit-card".parse::<PaymentMethod>().unwrap(), PaymentMethod::CreditCard);
        assert_eq!("Bank Transfer".parse::<PaymentMethod>().unwrap(), PaymentMethod::BankTransfer);
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_category_scope_serialization() {
        let json = serde_json::to_string(&CategoryScope::AllCategories).unwrap();
        assert_eq!(json, r#"{"scope":"all_categories"}"#);

        let json = serde_json::to_string(&CategoryScope::category("Fence")).unwrap();
        assert_eq!(json, r#"{"scope":"category","name":"Fence"}"#);

        let back: CategoryScope = serde_json::from_str(&json).unwrap();
        assert!(back.matches_exactly("Fence"));
        assert!(!back.matches_exactly("fence"));
    }

    #[test]
    fn test_needs_cost() {
        let mut item = LineItem::non_stock("li-1", "Custom gate", 1, Money::from_cents(25000));
        assert!(item.needs_cost());
        item.cost = Some(Money::zero());
        assert!(item.needs_cost());
        item.cost = Some(Money::from_cents(100));
        assert!(!item.needs_cost());

        let product = Product::new("p-1", "Post", "Fence", "each");
        let catalog = LineItem::for_product("li-2", &product, Money::from_cents(500), 2);
        assert!(!catalog.needs_cost());
    }

    #[test]
    fn test_has_stock_for() {
        let mut product = Product::new("p-1", "Post", "Fence", "each");
        assert!(product.has_stock_for(1_000));
        product.quantity_in_stock = Some(3);
        assert!(product.has_stock_for(3));
        assert!(!product.has_stock_for(4));
    }

    #[test]
    fn test_constructors_stamp_timestamps_only() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        let doc = Document::new("inv-1", DocumentKind::Invoice, &Customer::new("c-1", "Acme"), date);
        assert_eq!(doc.date, date);
        assert_eq!(doc.created_at, doc.updated_at);
        assert_eq!(doc.id, "inv-1");

        let product = Product::new("p-1", "Post", "Fence", "each");
        assert_eq!(product.created_at, product.updated_at);
        assert_eq!(product.id, "p-1");
    }
}
