//! # Settings Commands
//!
//! Reads and edits the bill settings row that every receipt is rendered
//! from.

use serde::Deserialize;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::DbState;
use kade_core::BillSettings;

/// Fields to change; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub grocery_name: Option<String>,
    pub store_address: Option<String>,
    pub phone_number1: Option<String>,
    pub phone_number2: Option<String>,
    pub cashier_name: Option<String>,
    pub logo_text: Option<String>,
    pub receipt_header: Option<String>,
    pub receipt_footer: Option<String>,
    pub currency_symbol: Option<String>,
    pub tax_rate_bps: Option<u32>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.grocery_name.is_none()
            && self.store_address.is_none()
            && self.phone_number1.is_none()
            && self.phone_number2.is_none()
            && self.cashier_name.is_none()
            && self.logo_text.is_none()
            && self.receipt_header.is_none()
            && self.receipt_footer.is_none()
            && self.currency_symbol.is_none()
            && self.tax_rate_bps.is_none()
    }

    fn apply(self, settings: &mut BillSettings) {
        fn set(field: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *field = value;
            }
        }

        set(&mut settings.grocery_name, self.grocery_name);
        set(&mut settings.store_address, self.store_address);
        set(&mut settings.phone_number1, self.phone_number1);
        set(&mut settings.phone_number2, self.phone_number2);
        set(&mut settings.cashier_name, self.cashier_name);
        set(&mut settings.logo_text, self.logo_text);
        set(&mut settings.receipt_header, self.receipt_header);
        set(&mut settings.receipt_footer, self.receipt_footer);
        set(&mut settings.currency_symbol, self.currency_symbol);
        if let Some(bps) = self.tax_rate_bps {
            settings.tax_rate_bps = bps;
        }
    }
}

pub async fn get_settings(db: &DbState) -> ApiResult<BillSettings> {
    Ok(db.inner().settings().get().await?)
}

/// Applies `patch` on top of the stored settings and saves the result.
pub async fn update_settings(db: &DbState, patch: SettingsPatch) -> ApiResult<BillSettings> {
    debug!(?patch, "update_settings command");
    let mut settings = db.inner().settings().get().await?;
    patch.apply(&mut settings);
    Ok(db.inner().settings().save(settings).await?)
}

pub async fn reset_settings(db: &DbState) -> ApiResult<BillSettings> {
    Ok(db.inner().settings().reset().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::db;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_patch_keeps_other_fields() {
        let db = db().await;
        let patch = SettingsPatch {
            cashier_name: Some("Ruwan".to_string()),
            tax_rate_bps: Some(150),
            ..Default::default()
        };
        assert!(!patch.is_empty());

        let saved = update_settings(&db, patch).await.unwrap();
        assert_eq!(saved.cashier_name, "Ruwan");
        assert_eq!(saved.tax_rate_bps, 150);
        assert_eq!(saved.grocery_name, BillSettings::default().grocery_name);

        let reset = reset_settings(&db).await.unwrap();
        assert_eq!(reset, BillSettings::default());
    }

    #[tokio::test]
    async fn test_blank_store_name_rejected() {
        let db = db().await;
        let patch = SettingsPatch {
            grocery_name: Some(" ".to_string()),
            ..Default::default()
        };
        let err = update_settings(&db, patch).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(get_settings(&db).await.unwrap(), BillSettings::default());
    }
}
