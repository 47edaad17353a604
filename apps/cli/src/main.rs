//! # Kade POS Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kade POS                                         │
//! │                                                                         │
//! │  main.rs ────► starts the tokio runtime                                 │
//! │                                                                         │
//! │  lib.rs ─────► parses arguments, opens the database, dispatches        │
//! │                                                                         │
//! │  commands/ ──► find_product, add_to_bill, settle_loan, export_all      │
//! │                                                                         │
//! │  counter.rs ─► interactive billing at the till                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // The actual setup is in lib.rs for better testability
    kade_cli::run().await
}
