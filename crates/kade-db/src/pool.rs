//! # Database Handle
//!
//! Opens the shop's SQLite file, applies the embedded schema and hands out
//! repositories.
//!
//! ```text
//!   DbConfig::new("kade.db")          DbConfig::in_memory()
//!            │                                 │
//!            └──────────────┬──────────────────┘
//!                           ▼
//!              Database::new(config).await
//!                WAL + foreign keys, migrations
//!                           │
//!      ┌──────────────┬─────┴────────┬──────────────┐
//!      ▼              ▼              ▼              ▼
//!  products()      loans()      balances()     settings()
//! ```
//!
//! The counter and a report run can share one file: WAL lets readers
//! proceed while a bill settles.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::balance::TemporaryBalanceRepository;
use crate::repository::loan::LoanRepository;
use crate::repository::product::ProductRepository;
use crate::repository::settings::SettingsRepository;

/// Where the database lives and how many connections to open.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    /// How long a command waits for a free connection.
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// A file-backed database, created on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 4,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// A private database that disappears with the pool. Used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            // every connection would get its own empty database
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

/// Shared handle to the shop database. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let options = if config.is_in_memory() {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };
        let options = options
            .synchronous(SqliteSynchronous::Normal)
            // loan history cascades on customer delete
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        migrations::run_migrations(&pool).await?;
        info!(max_connections = config.max_connections, "Database ready");

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn loans(&self) -> LoanRepository {
        LoanRepository::new(self.pool.clone())
    }

    pub fn balances(&self) -> TemporaryBalanceRepository {
        TemporaryBalanceRepository::new(self.pool.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Closes every connection; later queries fail with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_has_schema_and_settings() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(products, 0);

        let settings = db.settings().get().await.unwrap();
        assert_eq!(settings.currency_symbol, "Rs.");
    }

    #[tokio::test]
    async fn test_file_database_reopens_with_data() {
        let path = std::env::temp_dir().join(format!("kade-pool-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let mut settings = db.settings().get().await.unwrap();
        settings.grocery_name = "Kade Stores".to_string();
        db.settings().save(settings).await.unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(reopened.settings().get().await.unwrap().grocery_name, "Kade Stores");
        reopened.close().await;

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_closed_database_reports_connection_failure() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(matches!(
            db.products().list_all().await,
            Err(DbError::ConnectionFailed(_))
        ));
    }
}
