//! # kade-core: Pure Business Logic for Kade POS
//!
//! This crate holds every rule of the grocery counter as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Kade POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Counter Terminal (clap)                      │   │
//! │  │    Lookup ──► Bill ──► Settlement ──► Ledger ──► Receipt        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kade-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌────────────┐ ┌────────┐ ┌────────┐ │   │
//! │  │   │  types  │ │  bill   │ │ settlement │ │ ledger │ │receipt │ │   │
//! │  │   │ Product │ │ BillItem│ │ Cash/Loan  │ │ +/- bal│ │ render │ │   │
//! │  │   └─────────┘ └─────────┘ └────────────┘ └────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO PRINTER • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kade-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, LoanCustomer, BillSettings, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`quantity`] - Fixed-point quantities for weighed and counted goods
//! - [`bill`] - The open bill at the counter
//! - [`settlement`] - Cash or loan payment decision
//! - [`ledger`] - Loan balance arithmetic and history retention
//! - [`search`] - Lookup tiers and suggestion limits
//! - [`receipt`] - Receipt model and plain-text rendering
//! - [`report`] - Inventory, loan and balance summaries
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use kade_core::money::Money;
//! use kade_core::ledger::{apply_transaction, TransactionType};
//!
//! let balance = Money::from_cents(50_000); // 500.00
//! let change = apply_transaction(balance, TransactionType::Purchase, Money::from_cents(25_000)).unwrap();
//! assert_eq!(change.new_balance, Money::from_cents(75_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod error;
pub mod ledger;
pub mod money;
pub mod quantity;
pub mod receipt;
pub mod report;
pub mod search;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill::{AddOutcome, Bill, BillItem, BillTotals, StockWarning};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{BalanceChange, TransactionType};
pub use money::Money;
pub use quantity::Quantity;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines on a single bill.
///
/// ## Business Reason
/// Keeps a runaway scan loop from producing an unprintable receipt.
pub const MAX_BILL_LINES: usize = 100;

/// Maximum quantity of a single line, in whole units.
///
/// ## Business Reason
/// Catches typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Reorder threshold given to products that don't specify one.
pub const DEFAULT_REORDER_LEVEL: i64 = 10;
