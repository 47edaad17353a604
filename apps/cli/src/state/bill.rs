//! # Bill State
//!
//! Holds the bill currently being rung up at the counter.
//!
//! ## Thread Safety
//! The bill is wrapped in `Arc<tokio::sync::Mutex<T>>`. Adding a catalog
//! item changes the bill and then reserves stock in the database; the lock
//! stays held across that await so no other command sees the line before
//! its reservation has either succeeded or been rolled back.
//!
//! ## Bill Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Bill State Operations                                │
//! │                                                                         │
//! │  Operator Action          Command                 Bill State Change     │
//! │  ───────────────          ───────                 ─────────────────     │
//! │                                                                         │
//! │  Scan / type item ───────► add_to_bill() ───────► merge or push line   │
//! │                                                                         │
//! │  Manual item ────────────► add_manual_item() ───► push line            │
//! │                                                                         │
//! │  Remove line ────────────► remove_from_bill() ──► remove, restock      │
//! │                                                                         │
//! │  Clear ──────────────────► clear_bill() ────────► empty, restock all   │
//! │                                                                         │
//! │  Pay ────────────────────► settle_cash/loan() ──► empty, stock final   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use kade_core::Bill;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct BillState {
    bill: Arc<Mutex<Bill>>,
}

impl BillState {
    pub fn new() -> Self {
        BillState {
            bill: Arc::new(Mutex::new(Bill::new())),
        }
    }

    /// Locks the bill for the duration of one command.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let mut bill = bill_state.lock().await;
    /// let outcome = bill.add_product(&product, qty, None)?;
    /// ```
    pub async fn lock(&self) -> MutexGuard<'_, Bill> {
        self.bill.lock().await
    }
}
