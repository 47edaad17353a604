//! # Validation Module
//!
//! Input validation for everything the operator types.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI (clap)                                                   │
//! │  ├── Argument presence and parsing (Money, Quantity, UnitType)         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Business rule validation (positive, ranges, lengths)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE barcode and customer code                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kade_core::validation::{validate_barcode, validate_quantity};
//! use kade_core::Quantity;
//!
//! assert!(validate_barcode("4792024011234").is_ok());
//! assert!(validate_quantity(Quantity::from_milli(250)).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::UnitType;
use crate::{MAX_BILL_LINES, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a barcode.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
///
/// Shop-printed barcodes are free text, so no digit check is made.
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    required_text("barcode", barcode, 64)
}

/// Validates a product name (1-200 characters).
///
/// ## Example
/// ```rust
/// use kade_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Samba Rice 5kg").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, 200)
}

/// Validates a person's name on a loan account or temporary balance.
pub fn validate_person_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, 120)
}

/// Validates a loan customer code.
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - Letters, numbers, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use kade_core::validation::validate_customer_code;
///
/// assert!(validate_customer_code("C001").is_ok());
/// assert!(validate_customer_code("C 001").is_err());
/// ```
pub fn validate_customer_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();
    required_text("customer_code", code, 32)?;

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "customer_code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates that the measure belongs to the unit type.
pub fn validate_unit_measure(unit_type: UnitType, measure: &str) -> ValidationResult<()> {
    if unit_type.measures().contains(&measure) {
        return Ok(());
    }

    Err(ValidationError::NotAllowed {
        field: "unit_measure".to_string(),
        allowed: unit_type.measures().iter().map(|m| m.to_string()).collect(),
    })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity being put on a bill.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY whole units
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Counter: add "sugar" --qty 1.5                                        │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(1.500) ← THIS FUNCTION                              │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → Error: "quantity must be positive"              │
/// │       ├── qty > 999? → Error: "quantity must be between ..."           │
/// │       └── OK → stock check                                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: Quantity) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::must_be_positive("quantity"));
    }

    if qty > Quantity::from_units(MAX_ITEM_QUANTITY) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Stock figures (on hand, reorder level) may be zero but never negative.
pub fn validate_stock_level(field: &str, qty: Quantity) -> ValidationResult<()> {
    if qty.milli() < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

fn within_limit(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.abs() > Money::MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge {
            field: field.to_string(),
            max: Money::MAX_AMOUNT,
        });
    }

    Ok(())
}

/// Selling prices must be greater than zero and within `Money::MAX_AMOUNT`.
pub fn validate_selling_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::must_be_positive("price"));
    }

    within_limit("price", price)
}

/// Marked prices may be zero (no discount shown) but never negative.
pub fn validate_marked_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "marked_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    within_limit("marked_price", price)
}

/// Validates a payment, purchase or repayment amount.
///
/// ## Rules
/// - Must be positive (> 0)
/// - At most `Money::MAX_AMOUNT`
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::must_be_positive("amount"));
    }

    within_limit("amount", amount)
}

/// A stored balance, in either direction, stays within `Money::MAX_AMOUNT`.
pub fn validate_balance(balance: Money) -> ValidationResult<()> {
    within_limit("balance", balance)
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that another line still fits on the bill.
pub fn validate_bill_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_BILL_LINES {
        return Err(ValidationError::OutOfRange {
            field: "bill lines".to_string(),
            min: 0,
            max: MAX_BILL_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
