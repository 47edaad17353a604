//! # Schema Export
//!
//! Produces a standalone SQL script that recreates the Kade POS tables on
//! an empty SQLite database. The statements are the embedded migration, so
//! the export always matches what [`crate::Database`] creates at startup.
//!
//! Every statement is `CREATE ... IF NOT EXISTS` or `INSERT OR IGNORE`, so
//! running the script twice is harmless.

use chrono::NaiveDateTime;

/// The initial migration, verbatim.
pub const INITIAL_SCHEMA: &str = include_str!("../../../migrations/sqlite/001_initial_schema.sql");

/// File name used for exported scripts: `Database_Backup_yyyyMMdd_HHmmss.sql`.
pub fn export_file_name(generated_at: NaiveDateTime) -> String {
    format!("Database_Backup_{}.sql", generated_at.format("%Y%m%d_%H%M%S"))
}

/// Renders the schema script with a generation header and end marker.
pub fn export_sql(generated_at: NaiveDateTime) -> String {
    let mut out = String::with_capacity(INITIAL_SCHEMA.len() + 256);

    out.push_str("-- Kade POS Database Backup\n");
    out.push_str(&format!(
        "-- Generated on: {}\n",
        generated_at.format("%d/%m/%Y %H:%M:%S")
    ));
    out.push_str("-- Schema only. Run with: sqlite3 kade.db < this_file.sql\n\n");
    out.push_str("PRAGMA foreign_keys = ON;\n\n");
    out.push_str(INITIAL_SCHEMA.trim_end());
    out.push_str("\n\n-- End of backup script\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sqlx::sqlite::SqlitePoolOptions;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(at()), "Database_Backup_20240309_140507.sql");
    }

    #[test]
    fn test_export_contains_every_table() {
        let sql = export_sql(at());
        assert!(sql.starts_with("-- Kade POS Database Backup\n-- Generated on: 09/03/2024 14:05:07"));
        for table in [
            "products",
            "loan_customers",
            "loan_transactions",
            "temporary_balances",
            "bill_settings",
        ] {
            assert!(
                sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                "missing {table}"
            );
        }
        assert!(sql.trim_end().ends_with("-- End of backup script"));
    }

    #[tokio::test]
    async fn test_export_applies_twice() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let sql = export_sql(at());
        sqlx::raw_sql(&sql).execute(&pool).await.unwrap();
        sqlx::raw_sql(&sql).execute(&pool).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bill_settings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
