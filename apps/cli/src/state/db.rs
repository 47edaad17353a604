//! # Database State
//!
//! Wraps the `Database` connection for use in commands.
//!
//! The `Database` struct from `kade-db` contains a `SqlitePool`, which is
//! thread-safe; commands share it without explicit locking.

use kade_db::Database;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let customer = db_state.inner().loans().require("C001").await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
