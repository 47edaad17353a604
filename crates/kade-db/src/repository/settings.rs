//! # Settings Repository
//!
//! The single `bill_settings` row. The migration seeds it, so reads always
//! find one; if it was deleted by hand, defaults are returned and the next
//! save recreates it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::DbResult;
use kade_core::BillSettings;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Current settings, or defaults when the row is missing.
    pub async fn get(&self) -> DbResult<BillSettings> {
        let settings = sqlx::query_as::<_, BillSettings>(
            r#"
            SELECT grocery_name, store_address, phone_number1, phone_number2,
                   cashier_name, logo_text, receipt_header, receipt_footer,
                   currency_symbol, tax_rate_bps
            FROM bill_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings.unwrap_or_else(|| {
            warn!("bill_settings row missing, using defaults");
            BillSettings::default()
        }))
    }

    /// Validates and stores every field.
    pub async fn save(&self, settings: BillSettings) -> DbResult<BillSettings> {
        let settings = settings.validated()?;

        sqlx::query(
            r#"
            INSERT INTO bill_settings (
                id, grocery_name, store_address, phone_number1, phone_number2,
                cashier_name, logo_text, receipt_header, receipt_footer,
                currency_symbol, tax_rate_bps, updated_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT (id) DO UPDATE SET
                grocery_name = excluded.grocery_name,
                store_address = excluded.store_address,
                phone_number1 = excluded.phone_number1,
                phone_number2 = excluded.phone_number2,
                cashier_name = excluded.cashier_name,
                logo_text = excluded.logo_text,
                receipt_header = excluded.receipt_header,
                receipt_footer = excluded.receipt_footer,
                currency_symbol = excluded.currency_symbol,
                tax_rate_bps = excluded.tax_rate_bps,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&settings.grocery_name)
        .bind(&settings.store_address)
        .bind(&settings.phone_number1)
        .bind(&settings.phone_number2)
        .bind(&settings.cashier_name)
        .bind(&settings.logo_text)
        .bind(&settings.receipt_header)
        .bind(&settings.receipt_footer)
        .bind(&settings.currency_symbol)
        .bind(settings.tax_rate_bps)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(store = %settings.grocery_name, "Bill settings saved");
        Ok(settings)
    }

    /// Restores the defaults.
    pub async fn reset(&self) -> DbResult<BillSettings> {
        self.save(BillSettings::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};

    #[tokio::test]
    async fn test_save_and_reset() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().settings();

        let mut settings = repo.get().await.unwrap();
        assert_eq!(settings, BillSettings::default());

        settings.grocery_name = "Kade Mart".to_string();
        settings.tax_rate_bps = 250;
        repo.save(settings).await.unwrap();

        let stored = repo.get().await.unwrap();
        assert_eq!(stored.grocery_name, "Kade Mart");
        assert_eq!(stored.tax_rate().bps(), 250);

        repo.reset().await.unwrap();
        assert_eq!(repo.get().await.unwrap(), BillSettings::default());
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().settings();

        let mut settings = BillSettings::default();
        settings.grocery_name = "  ".to_string();
        assert!(matches!(repo.save(settings).await, Err(DbError::Core(_))));

        let mut settings = BillSettings::default();
        settings.tax_rate_bps = 20_000;
        assert!(repo.save(settings).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_row_falls_back_to_defaults() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query("DELETE FROM bill_settings").execute(db.pool()).await.unwrap();

        assert_eq!(db.settings().get().await.unwrap(), BillSettings::default());

        let mut settings = BillSettings::default();
        settings.cashier_name = "Ruwan".to_string();
        db.settings().save(settings).await.unwrap();
        assert_eq!(db.settings().get().await.unwrap().cashier_name, "Ruwan");
    }
}
