//! # Validation Module
//!
//! Form-level validation rules for Keystone documents, products and
//! customers.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form schema (per field, before submit)                       │
//! │  ├── required names, non-negative numbers                              │
//! │  └── cross-field rules ("method required if amount entered")           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (the same rules, shared by every form)           │
//! │  ├── single-field validators → ValidationResult<()>                    │
//! │  └── whole-record validators → Vec<ValidationError> (all at once)      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (SQLite NOT NULL / PRIMARY KEY only)                   │
//! │                                                                         │
//! │  The document store applies no schema of its own, so nothing below     │
//! │  this module checks business rules.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use keystone_core::validation::{validate_quantity, validate_payment_entry};
//! use keystone_core::{Money, PaymentMethod};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_payment_entry(Some(Money::from_cents(100)), None).is_err());
//! assert!(validate_payment_entry(None, None).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    CategoryScope, Customer, CustomerMarkupRule, Document, DocumentKind, DocumentStatus, LineItem,
    Payment, PaymentMethod, Product,
};
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_LINE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required, length-limited text field.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product or line item name.
///
/// ```rust
/// use keystone_core::validation::validate_product_name;
///
/// assert!(validate_product_name("6ft cedar picket").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, MAX_NAME_LEN)
}

pub fn validate_category(category: &str) -> ValidationResult<()> {
    validate_required_text("category", category, MAX_CATEGORY_LEN)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: 1 to MAX_ITEM_QUANTITY.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 || qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or cost: zero to MAX_AMOUNT_CENTS. Zero is allowed
/// (free items, unknown cost).
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    validate_max_amount(field, 0, amount)
}

/// Validates a payment amount: greater than zero, at most MAX_AMOUNT_CENTS.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    validate_max_amount("payment amount", 1, amount)
}

fn validate_max_amount(field: &str, min: i64, amount: Money) -> ValidationResult<()> {
    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a payment as typed into a form, where both fields are optional
/// until the user fills one in.
///
/// ## Rules
/// - Nothing entered: valid (no payment recorded)
/// - Amount entered: must be positive, and a method is required
/// - Method without amount: amount is required
pub fn validate_payment_entry(
    amount: Option<Money>,
    method: Option<PaymentMethod>,
) -> ValidationResult<()> {
    match (amount, method) {
        (None, None) => Ok(()),
        (Some(amount), Some(_)) => validate_payment_amount(amount),
        (Some(amount), None) => {
            validate_payment_amount(amount)?;
            Err(ValidationError::RequiredWhen {
                field: "payment method".to_string(),
                when: "amount".to_string(),
            })
        }
        (None, Some(_)) => Err(ValidationError::RequiredWhen {
            field: "payment amount".to_string(),
            when: "payment method".to_string(),
        }),
    }
}

/// Validates a stored payment record.
pub fn validate_payment(payment: &Payment) -> ValidationResult<()> {
    if payment.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "payment id".to_string(),
        });
    }
    validate_payment_amount(payment.amount)
}

/// Validates that a status belongs to the document kind's subset.
pub fn validate_status(kind: DocumentKind, status: DocumentStatus) -> ValidationResult<()> {
    if kind.allows_status(status) {
        return Ok(());
    }

    Err(ValidationError::NotAllowed {
        field: "status".to_string(),
        allowed: kind
            .allowed_statuses()
            .iter()
            .map(|s| s.label().to_string())
            .collect(),
    })
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a single line item, returning every failure.
pub fn validate_line_item(item: &LineItem) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    push_err(&mut errors, validate_product_name(&item.product_name));
    push_err(&mut errors, validate_quantity(item.quantity));
    push_err(&mut errors, validate_non_negative("unit price", item.unit_price));
    if let Some(cost) = item.cost {
        push_err(&mut errors, validate_non_negative("cost", cost));
    }

    if item.add_to_product_list && !item.is_non_stock {
        errors.push(ValidationError::InvalidFormat {
            field: "add to product list".to_string(),
            reason: "only non-stock items can be added to the product list".to_string(),
        });
    }
    if item.is_non_stock && item.product_id.is_some() {
        errors.push(ValidationError::InvalidFormat {
            field: "product".to_string(),
            reason: "non-stock items cannot reference a catalog product".to_string(),
        });
    }
    if let Some(category) = &item.new_product_category {
        push_err(&mut errors, validate_category(category));
    }

    errors
}

/// Validates a whole document. Line and payment errors are prefixed with
/// their position, e.g. `line 2: quantity must be between 1 and 99999`.
pub fn validate_document(doc: &Document) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    push_err(&mut errors, validate_required_text("customer", &doc.customer_id, 100));
    push_err(&mut errors, validate_status(doc.kind, doc.status));

    if doc.line_items.len() > MAX_LINE_ITEMS {
        errors.push(ValidationError::OutOfRange {
            field: "line items".to_string(),
            min: 0,
            max: MAX_LINE_ITEMS as i64,
        });
    }

    for (index, item) in doc.line_items.iter().enumerate() {
        for err in validate_line_item(item) {
            errors.push(prefixed(&format!("line {}", index + 1), err));
        }
    }

    if !doc.kind.accepts_payments() && !doc.payments.is_empty() {
        errors.push(ValidationError::InvalidFormat {
            field: "payments".to_string(),
            reason: format!("a {} cannot carry payments", doc.kind),
        });
    }
    for (index, payment) in doc.payments.iter().enumerate() {
        if let Err(err) = validate_payment(payment) {
            errors.push(prefixed(&format!("payment {}", index + 1), err));
        }
    }

    errors
}

/// Validates a catalog product.
pub fn validate_product(product: &Product) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    push_err(&mut errors, validate_product_name(&product.name));
    push_err(&mut errors, validate_category(&product.category));
    push_err(&mut errors, validate_required_text("unit", &product.unit, 20));
    push_err(&mut errors, validate_non_negative("cost", product.cost));
    push_err(&mut errors, validate_non_negative("price", product.price));

    errors
}

/// Validates a markup rule.
///
/// Markup may be negative (selling below cost), but not -100% or lower,
/// which would make auto-cost undefined.
pub fn validate_markup_rule(rule: &CustomerMarkupRule) -> ValidationResult<()> {
    if let CategoryScope::Category(name) = &rule.scope {
        validate_category(name)?;
    }

    if !rule.markup_percentage.is_finite() || rule.markup_percentage <= -100.0 {
        return Err(ValidationError::InvalidFormat {
            field: "markup percentage".to_string(),
            reason: "must be a number greater than -100".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer and its markup rules.
pub fn validate_customer(customer: &Customer) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    push_err(&mut errors, validate_required_text("customer name", &customer.name, MAX_NAME_LEN));
    for (index, rule) in customer.markup_rules.iter().enumerate() {
        if let Err(err) = validate_markup_rule(rule) {
            errors.push(prefixed(&format!("rule {}", index + 1), err));
        }
    }

    errors
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string (document, product and payment ids).
///
/// ```rust
/// use keystone_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn push_err(errors: &mut Vec<ValidationError>, result: ValidationResult<()>) {
    if let Err(err) = result {
        errors.push(err);
    }
}

fn prefixed(prefix: &str, err: ValidationError) -> ValidationError {
    let rename = |field: String| format!("{}: {}", prefix, field);
    match err {
        ValidationError::Required { field } => ValidationError::Required { field: rename(field) },
        ValidationError::RequiredWhen { field, when } => ValidationError::RequiredWhen {
            field: rename(field),
            when,
        },
        ValidationError::TooLong { field, max } => ValidationError::TooLong {
            field: rename(field),
            max,
        },
        ValidationError::OutOfRange { field, min, max } => ValidationError::OutOfRange {
            field: rename(field),
            min,
            max,
        },
        ValidationError::MustBePositive { field } => {
            ValidationError::MustBePositive { field: rename(field) }
        }
        ValidationError::MustBeNonNegative { field } => {
            ValidationError::MustBeNonNegative { field: rename(field) }
        }
        ValidationError::InvalidFormat { field, reason } => ValidationError::InvalidFormat {
            field: rename(field),
            reason,
        },
        ValidationError::NotAllowed { field, allowed } => ValidationError::NotAllowed {
            field: rename(field),
            allowed,
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("price", Money::zero()).is_ok());
        assert!(validate_non_negative("price", Money::from_cents(-1)).is_err());
        assert!(validate_non_negative("price", Money::from_cents(MAX_AMOUNT_CENTS)).is_ok());
        assert!(matches!(
            validate_non_negative("price", Money::from_cents(MAX_AMOUNT_CENTS + 1)),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_payment_amount_limit() {
        assert!(validate_payment_amount(Money::from_cents(MAX_AMOUNT_CENTS)).is_ok());
        let pasted = Money::parse("92233720368547758.07").unwrap();
        assert!(matches!(
            validate_payment_amount(pasted),
            Err(ValidationError::OutOfRange { max: MAX_AMOUNT_CENTS, .. })
        ));
    }

    #[test]
    fn test_payment_entry_cross_field_rule() {
        let amount = Some(Money::from_cents(2500));
        assert!(validate_payment_entry(amount, Some(PaymentMethod::Cash)).is_ok());

        let err = validate_payment_entry(amount, None).unwrap_err();
        assert_eq!(err.field(), "payment method");

        let err = validate_payment_entry(None, Some(PaymentMethod::Check)).unwrap_err();
        assert_eq!(err.field(), "payment amount");

        let err = validate_payment_entry(Some(Money::zero()), Some(PaymentMethod::Cash)).unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));
    }

    #[test]
    fn test_validate_status() {
        assert!(validate_status(DocumentKind::Invoice, DocumentStatus::Overdue).is_ok());
        let err = validate_status(DocumentKind::Order, DocumentStatus::Paid).unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { .. }));
    }

    #[test]
    fn test_validate_line_item_collects_all_errors() {
        let mut item = LineItem::non_stock("li-1", "", 0, Money::from_cents(-5));
        item.cost = Some(Money::from_cents(-1));
        let errors = validate_line_item(&item);
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_promotion_flag_requires_non_stock() {
        let product = Product::new("p-1", "Post", "Fence", "each");
        let mut item = LineItem::for_product("li-1", &product, Money::from_cents(500), 1);
        item.add_to_product_list = true;
        assert_eq!(validate_line_item(&item).len(), 1);
    }

    #[test]
    fn test_validate_document_prefixes_positions() {
        let customer = Customer::new("c-1", "Acme");
        let mut doc = Document::new("inv-1", DocumentKind::Invoice, &customer, day());
        doc.line_items.push(LineItem::non_stock("a", "Gate", 1, Money::from_cents(100)));
        doc.line_items.push(LineItem::non_stock("b", "Hinge", 0, Money::from_cents(100)));

        let errors = validate_document(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field(), "line 2: quantity");
    }

    #[test]
    fn test_estimate_with_payments_is_invalid() {
        let customer = Customer::new("c-1", "Acme");
        let mut doc = Document::new("est-1", DocumentKind::Estimate, &customer, day());
        doc.payments.push(Payment::new("p1", day(), Money::from_cents(100), PaymentMethod::Cash));
        let errors = validate_document(&doc);
        assert!(errors.iter().any(|e| e.field() == "payments"));
    }

    #[test]
    fn test_validate_markup_rule() {
        assert!(validate_markup_rule(&CustomerMarkupRule::new(CategoryScope::AllCategories, -20.0)).is_ok());
        assert!(validate_markup_rule(&CustomerMarkupRule::new(CategoryScope::AllCategories, -100.0)).is_err());
        assert!(validate_markup_rule(&CustomerMarkupRule::new(CategoryScope::category(""), 10.0)).is_err());
        assert!(validate_markup_rule(&CustomerMarkupRule::new(CategoryScope::AllCategories, f64::NAN)).is_err());
    }

    #[test]
    fn test_validate_product() {
        let mut product = Product::new("p-1", "Post", "Fence", "each");
        assert!(validate_product(&product).is_empty());
        product.price = Money::from_cents(-100);
        product.category = String::new();
        assert_eq!(validate_product(&product).len(), 2);
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
