//! # Error Types
//!
//! Domain-specific error types for keystone-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  keystone-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Per-field form validation failures             │
//! │                                                                         │
//! │  keystone-db errors (separate crate)                                   │
//! │  └── DbError          - Store operation failures                       │
//! │                                                                         │
//! │  keystone-cli errors                                                   │
//! │  └── ApiError         - What the caller sees (code + message)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::{DocumentKind, DocumentStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the pricing and ledger code.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// A status outside the document kind's allowed subset.
    #[error("Status {status} is not valid for a {kind}")]
    InvalidStatus {
        kind: DocumentKind,
        status: DocumentStatus,
    },

    /// The operation only applies to some document kinds
    /// (e.g. recording a payment on an estimate).
    #[error("{operation} is not supported for a {kind}")]
    UnsupportedForKind {
        kind: DocumentKind,
        operation: String,
    },

    /// Bulk payment selected an invoice that is not open for payment.
    ///
    /// ## When This Occurs
    /// - Invoice already Paid or Voided
    /// - Balance due is zero or negative
    /// - Invoice belongs to a different customer
    #[error("Invoice {invoice_id} is not outstanding for this customer: {reason}")]
    InvoiceNotOutstanding { invoice_id: String, reason: String },

    #[error("No invoices selected for payment")]
    NoInvoicesSelected,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, one per offending field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    /// Cross-field rule: `field` becomes required once `when` is filled in.
    #[error("{field} is required when {when} is entered")]
    RequiredWhen { field: String, when: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} cannot be negative")]
    MustBeNonNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// The form field this error should be shown next to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::RequiredWhen { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustBeNonNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
