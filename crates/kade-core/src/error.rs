//! # Error Types
//!
//! Domain-specific error types for kade-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kade-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kade-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ApiError         - What the operator sees                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Operator     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rejection here happens before any mutation: a caller that gets an
//! `Err` can assume nothing was written.

use thiserror::Error;

use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No product matched the lookup.
    ///
    /// ## When This Occurs
    /// - Barcode doesn't exist in the catalog
    /// - Name query matched nothing, not even as a substring
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product has some stock, but not enough for the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Bill (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Sugar 1kg", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Counter shows: "Insufficient stock. Available: 3"
    /// ```
    ///
    /// A product at exactly zero stock is treated as untracked and never
    /// produces this error.
    #[error("Insufficient stock for {product}. Available: {available}, requested: {requested}")]
    InsufficientStock {
        product: String,
        available: Quantity,
        requested: Quantity,
    },

    /// Loan customer code doesn't resolve.
    #[error("Loan customer not found: {0}")]
    CustomerNotFound(String),

    /// A repayment would push the balance below zero.
    #[error("Repayment of {amount} exceeds outstanding balance of {balance}")]
    RepaymentExceedsBalance { balance: Money, amount: Money },

    /// Cash tendered does not cover the bill.
    #[error("Paid amount {tendered} is less than the bill total {total}")]
    InsufficientTender { total: Money, tendered: Money },

    /// Settlement was attempted on a bill with no lines.
    #[error("The bill has no items")]
    EmptyBill,

    /// Bill has reached the maximum number of lines.
    #[error("A bill cannot have more than {max} lines")]
    BillTooLarge { max: usize },

    /// Line quantity exceeds the maximum.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: Quantity, max: i64 },

    /// A bill total or balance left the range money can represent.
    #[error("Amount too large: {0} overflowed")]
    AmountOverflow(String),

    /// Line number doesn't exist on the bill.
    #[error("Bill has no line {0}")]
    LineNotFound(usize),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Amount above the shop's limit.
    #[error("{field} must be at most {max}")]
    AmountTooLarge { field: String, max: Money },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., "12.3.4" as an amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., barcode already in the catalog).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::MustBePositive`].
    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Sugar 1kg".to_string(),
            available: Quantity::from_units(3),
            requested: Quantity::from_units(5),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Sugar 1kg. Available: 3, requested: 5"
        );

        let err = CoreError::RepaymentExceedsBalance {
            balance: Money::from_cents(75_000),
            amount: Money::from_cents(100_000),
        };
        assert_eq!(
            err.to_string(),
            "Repayment of 1000.00 exceeds outstanding balance of 750.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("barcode").to_string(),
            "barcode is required"
        );
        assert_eq!(
            ValidationError::must_be_positive("amount").to_string(),
            "amount must be positive"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
