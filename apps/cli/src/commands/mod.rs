//! # Commands Module
//!
//! Every operation the counter terminal can perform. Each function takes
//! only the state it needs and returns a serializable result, so the same
//! command backs a one-shot CLI invocation, the interactive counter session
//! and `--json` output.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs         ◄─── You are here (exports)
//! ├── product.rs     ◄─── Catalog CRUD, lookup, stock
//! ├── bill.rs        ◄─── Open bill manipulation
//! ├── settlement.rs  ◄─── Cash / loan payment and receipt
//! ├── loan.rs        ◄─── Loan customers and ledger
//! ├── balance.rs     ◄─── Temporary balances
//! ├── settings.rs    ◄─── Bill settings
//! └── report.rs      ◄─── Summaries, CSV and schema export
//! ```
//!
//! ## State Injection
//! ```rust,ignore
//! // Only needs database
//! async fn search_products(db: &DbState, query: &str)
//!
//! // Needs database and the open bill
//! async fn add_to_bill(db: &DbState, bill: &BillState, ...)
//!
//! // Needs all three
//! async fn settle_cash(db: &DbState, bill: &BillState, config: &ConfigState, ...)
//! ```

pub mod balance;
pub mod bill;
pub mod loan;
pub mod product;
pub mod report;
pub mod settings;
pub mod settlement;

/// Shared fixtures for command tests.
#[cfg(test)]
pub(crate) mod test_support {
    use kade_core::{Money, ProductDraft, Quantity, UnitType};
    use kade_db::{Database, DbConfig};

    use crate::state::DbState;

    pub async fn db() -> DbState {
        DbState::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    pub fn product(name: &str, barcode: &str, price_cents: i64, stock_units: i64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            barcode: barcode.to_string(),
            price: Money::from_cents(price_cents),
            marked_price: Money::zero(),
            quantity: Quantity::from_units(stock_units),
            unit_type: UnitType::Unit,
            unit_measure: String::new(),
            category: None,
            supplier: None,
            description: None,
            reorder_level: Quantity::from_units(10),
        }
    }
}
