//! # Settlement
//!
//! Decides how a finished bill is paid. Exactly one path runs per bill:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Settlement Paths                                 │
//! │                                                                         │
//! │  Bill total ──┬──► CASH  tendered >= total ──► change = tendered-total  │
//! │               │         tendered <  total ──► rejected, nothing saved   │
//! │               │                                                         │
//! │               └──► LOAN  customer code ──► quote (old → new balance)    │
//! │                          operator confirms ──► PURCHASE recorded        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No split payments. The functions here only compute; persisting a loan
//! purchase is the ledger repository's job.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::ledger::{apply_transaction, BalanceChange, TransactionType};
use crate::money::Money;
use crate::types::LoanCustomer;
use crate::validation::validate_payment_amount;

/// How a settled bill was paid, as printed on the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Payment {
    Cash {
        tendered: Money,
        /// Handed back to the customer. Never persisted.
        change: Money,
    },
    Loan {
        customer_code: String,
        customer_name: String,
        old_balance: Money,
        new_balance: Money,
    },
}

/// Validates a cash tender against the bill total.
///
/// ## Example
/// ```rust
/// use kade_core::settlement::{settle_cash, Payment};
/// use kade_core::Money;
///
/// let paid = settle_cash(Money::from_cents(1_250), Money::from_cents(2_000)).unwrap();
/// assert_eq!(paid, Payment::Cash { tendered: Money::from_cents(2_000), change: Money::from_cents(750) });
/// ```
pub fn settle_cash(total: Money, tendered: Money) -> CoreResult<Payment> {
    if !total.is_positive() {
        return Err(CoreError::EmptyBill);
    }
    validate_payment_amount(tendered)?;
    if tendered < total {
        return Err(CoreError::InsufficientTender { total, tendered });
    }

    Ok(Payment::Cash {
        tendered,
        change: tendered - total,
    })
}

/// What charging a bill to a loan account would do, shown to the operator
/// before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanQuote {
    pub customer_code: String,
    pub customer_name: String,
    pub amount: Money,
    pub old_balance: Money,
    pub new_balance: Money,
}

impl LoanQuote {
    /// Confirmation text for the operator.
    pub fn prompt(&self) -> String {
        format!(
            "Add {} to {}'s loan balance?\nCurrent balance: {}\nNew balance will be: {}",
            self.amount, self.customer_name, self.old_balance, self.new_balance
        )
    }
}

/// Quotes a loan purchase of `total` against `customer`.
pub fn quote_loan(customer: &LoanCustomer, total: Money) -> CoreResult<LoanQuote> {
    if !total.is_positive() {
        return Err(CoreError::EmptyBill);
    }
    let change = apply_transaction(customer.balance(), TransactionType::Purchase, total)?;
    Ok(quote_from_change(customer, change))
}

/// Builds the quote for a balance change that has already been applied.
fn quote_from_change(customer: &LoanCustomer, change: BalanceChange) -> LoanQuote {
    LoanQuote {
        customer_code: customer.customer_code.clone(),
        customer_name: customer.name.clone(),
        amount: change.amount,
        old_balance: change.old_balance,
        new_balance: change.new_balance,
    }
}
