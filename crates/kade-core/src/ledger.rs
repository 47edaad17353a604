//! # Loan Ledger Rules
//!
//! The balance arithmetic behind every loan transaction, and the retention
//! policy for transaction history.
//!
//! ## Balance Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   How a Loan Balance Moves                              │
//! │                                                                         │
//! │   PURCHASE  (bill charged to loan)                                      │
//! │     new_balance = old_balance + amount                                  │
//! │                                                                         │
//! │   REPAYMENT (customer pays back)                                        │
//! │     amount <= old_balance, else rejected                                │
//! │     new_balance = old_balance - amount                                  │
//! │                                                                         │
//! │   History: insert row ──► count > 15? ──► keep newest 10               │
//! │            (pruning never touches the balance)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database layer applies a [`BalanceChange`] and its audit row inside a
//! single SQL transaction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_balance, validate_payment_amount};

/// History is pruned once a customer has more rows than this.
pub const PRUNE_THRESHOLD: i64 = 15;

/// Rows kept per customer after pruning (most recent first).
pub const RETAINED_TRANSACTIONS: i64 = 10;

/// Note stored on purchases charged from the counter.
pub const PURCHASE_NOTE: &str = "Purchase on loan";

/// Note stored on repayments when the operator gives none.
pub const REPAYMENT_NOTE: &str = "Manual repayment";

// =============================================================================
// Transaction Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Goods taken on credit; balance goes up.
    Purchase,
    /// Money paid back; balance goes down.
    Repayment,
}

impl TransactionType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "PURCHASE",
            TransactionType::Repayment => "REPAYMENT",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PURCHASE" => Ok(TransactionType::Purchase),
            "REPAYMENT" => Ok(TransactionType::Repayment),
            _ => Err(ValidationError::NotAllowed {
                field: "transaction_type".to_string(),
                allowed: vec!["PURCHASE".to_string(), "REPAYMENT".to_string()],
            }),
        }
    }
}

// =============================================================================
// Balance Change
// =============================================================================

/// A validated balance movement, ready to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub old_balance: Money,
    pub new_balance: Money,
}

/// Computes the effect of a transaction on a balance.
///
/// ## Rules
/// - `amount` must be positive and within `Money::MAX_AMOUNT`
/// - a repayment may not exceed `balance`
/// - the new balance must stay within `Money::MAX_AMOUNT`
///
/// ## Example
/// ```rust
/// use kade_core::ledger::{apply_transaction, TransactionType};
/// use kade_core::Money;
///
/// let balance = Money::from_cents(75_000);
/// let err = apply_transaction(balance, TransactionType::Repayment, Money::from_cents(100_000));
/// assert!(err.is_err());
/// ```
pub fn apply_transaction(
    balance: Money,
    transaction_type: TransactionType,
    amount: Money,
) -> CoreResult<BalanceChange> {
    validate_payment_amount(amount)?;

    let new_balance = match transaction_type {
        TransactionType::Purchase => balance
            .checked_add(amount)
            .ok_or_else(|| CoreError::AmountOverflow("loan balance".to_string()))?,
        TransactionType::Repayment => {
            if amount > balance {
                return Err(CoreError::RepaymentExceedsBalance { balance, amount });
            }
            balance
                .checked_sub(amount)
                .ok_or_else(|| CoreError::AmountOverflow("loan balance".to_string()))?
        }
    };
    validate_balance(new_balance)?;

    Ok(BalanceChange {
        transaction_type,
        amount,
        old_balance: balance,
        new_balance,
    })
}

/// True once a customer's history has grown past the pruning threshold.
#[inline]
pub fn needs_pruning(transaction_count: i64) -> bool {
    transaction_count > PRUNE_THRESHOLD
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_adds_to_balance() {
        let change = apply_transaction(
            Money::from_cents(50_000),
            TransactionType::Purchase,
            Money::from_cents(25_000),
        )
        .unwrap();

        assert_eq!(change.old_balance.cents(), 50_000);
        assert_eq!(change.new_balance.cents(), 75_000);
    }

    #[test]
    fn test_repayment_subtracts_from_balance() {
        let change = apply_transaction(
            Money::from_cents(75_000),
            TransactionType::Repayment,
            Money::from_cents(75_000),
        )
        .unwrap();

        assert!(change.new_balance.is_zero());
    }

    #[test]
    fn test_overpayment_rejected() {
        let err = apply_transaction(
            Money::from_cents(75_000),
            TransactionType::Repayment,
            Money::from_cents(100_000),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CoreError::RepaymentExceedsBalance { balance, amount }
                if balance.cents() == 75_000 && amount.cents() == 100_000
        ));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        for kind in [TransactionType::Purchase, TransactionType::Repayment] {
            assert!(apply_transaction(Money::from_cents(1_000), kind, Money::zero()).is_err());
            assert!(
                apply_transaction(Money::from_cents(1_000), kind, Money::from_cents(-1)).is_err()
            );
        }
    }

    #[test]
    fn test_sign_rule_holds_across_amounts() {
        let balance = Money::from_cents(12_345);
        for cents in [1, 99, 12_345, 1_000_000] {
            let amount = Money::from_cents(cents);
            let purchase = apply_transaction(balance, TransactionType::Purchase, amount).unwrap();
            assert_eq!(purchase.new_balance, purchase.old_balance + amount);

            if let Ok(repay) = apply_transaction(balance, TransactionType::Repayment, amount) {
                assert_eq!(repay.new_balance, repay.old_balance - amount);
                assert!(!repay.new_balance.is_negative());
            } else {
                assert!(amount > balance);
            }
        }
    }

    #[test]
    fn test_purchase_cannot_push_balance_past_limit() {
        let err = apply_transaction(
            Money::MAX_AMOUNT,
            TransactionType::Purchase,
            Money::from_cents(1),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::AmountTooLarge { .. })
        ));

        let err = apply_transaction(
            Money::from_cents(i64::MAX),
            TransactionType::Purchase,
            Money::from_cents(1),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow(_)));
    }

    #[test]
    fn test_oversized_amount_rejected() {
        let huge = Money::from_cents(9_223_372_036_854_775_807);
        assert!(apply_transaction(Money::zero(), TransactionType::Purchase, huge).is_err());
    }

    #[test]
    fn test_pruning_hysteresis() {
        assert!(!needs_pruning(10));
        assert!(!needs_pruning(15));
        assert!(needs_pruning(16));
    }

    #[test]
    fn test_transaction_type_round_trips_text() {
        assert_eq!("purchase".parse::<TransactionType>().unwrap(), TransactionType::Purchase);
        assert_eq!(TransactionType::Repayment.to_string(), "REPAYMENT");
        assert!("refund".parse::<TransactionType>().is_err());
    }
}
