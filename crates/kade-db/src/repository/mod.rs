//! # Repository Module
//!
//! Database repository implementations for Kade POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  db.loans().record_transaction("C001", Purchase, 250.00, ..)   │
//! │       ▼                                                                 │
//! │  LoanRepository                                                        │
//! │  ├── reads the customer row                                            │
//! │  ├── asks kade-core for the balance change                             │
//! │  └── writes transaction + balance in one SQL transaction               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD, lookup, stock
//! - [`LoanRepository`](loan::LoanRepository) - Loan customers and ledger
//! - [`TemporaryBalanceRepository`](balance::TemporaryBalanceRepository) - Named balances
//! - [`SettingsRepository`](settings::SettingsRepository) - Bill settings row

pub mod balance;
pub mod loan;
pub mod product;
pub mod settings;

/// Wraps a search query as a `%query%` LIKE pattern.
pub(crate) fn contains_pattern(query: &str) -> String {
    format!("%{}%", kade_core::search::escape_like(query))
}
