//! # State Module
//!
//! Application state for the counter terminal.
//!
//! Instead of a single `AppState` struct containing everything, each
//! concern has its own state type and each command takes only the ones it
//! needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   DbState    │  │  BillState   │  │   ConfigState    │              │
//! │  │              │  │              │  │                  │              │
//! │  │  Database    │  │  Arc<Mutex<  │  │  db_path         │              │
//! │  │  (SQLite     │  │    Bill      │  │  reports_dir     │              │
//! │  │   pool)      │  │  >>          │  │  receipt_width   │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • BillState: tokio Mutex, held across the stock reservation await     │
//! │  • ConfigState: Read-only after startup                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod bill;
mod config;
mod db;

pub use bill::BillState;
pub use config::ConfigState;
pub use db::DbState;
