//! # Temporary Balance Commands
//!
//! Free-standing named balances kept outside the loan ledger.

use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::DbState;
use kade_core::{Money, TemporaryBalance, TemporaryBalanceDraft};

/// Fields to change on a balance; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct BalancePatch {
    pub customer_name: Option<String>,
    pub balance: Option<Money>,
    pub notes: Option<String>,
}

pub async fn add_balance(db: &DbState, draft: TemporaryBalanceDraft) -> ApiResult<TemporaryBalance> {
    let balance = db.inner().balances().insert(draft).await?;
    info!(id = balance.id, name = %balance.customer_name, amount = %balance.balance(), "Temporary balance added");
    Ok(balance)
}

pub async fn update_balance(
    db: &DbState,
    id: i64,
    patch: BalancePatch,
) -> ApiResult<TemporaryBalance> {
    let balances = db.inner().balances();
    let current = balances
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Temporary balance", &id.to_string()))?;

    let draft = TemporaryBalanceDraft {
        customer_name: patch.customer_name.unwrap_or(current.customer_name),
        balance: patch.balance.unwrap_or(Money::from_cents(current.balance_cents)),
        notes: patch.notes.or(current.notes),
    };
    let balance = balances.update(id, draft).await?;
    info!(id, amount = %balance.balance(), "Temporary balance updated");
    Ok(balance)
}

pub async fn delete_balance(db: &DbState, id: i64) -> ApiResult<()> {
    db.inner().balances().delete(id).await?;
    info!(id, "Temporary balance deleted");
    Ok(())
}

pub async fn list_balances(db: &DbState) -> ApiResult<Vec<TemporaryBalance>> {
    Ok(db.inner().balances().list_all().await?)
}

pub async fn search_balances(db: &DbState, query: &str) -> ApiResult<Vec<TemporaryBalance>> {
    Ok(db.inner().balances().search(query).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::db;
    use crate::error::ErrorCode;
    use kade_core::Money;

    #[tokio::test]
    async fn test_balance_lifecycle() {
        let db = db().await;
        let draft = TemporaryBalanceDraft {
            customer_name: "Sunil".to_string(),
            balance: Money::from_cents(4_500),
            notes: Some("empty gas cylinder".to_string()),
        };

        let created = add_balance(&db, draft).await.unwrap();
        assert_eq!(search_balances(&db, "cylinder").await.unwrap().len(), 1);

        let patch = BalancePatch {
            balance: Some(Money::zero()),
            ..Default::default()
        };
        let err = update_balance(&db, created.id, patch).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let patch = BalancePatch {
            balance: Some(Money::from_cents(3_000)),
            ..Default::default()
        };
        let updated = update_balance(&db, created.id, patch).await.unwrap();
        assert_eq!(updated.balance(), Money::from_cents(3_000));
        assert_eq!(updated.notes.as_deref(), Some("empty gas cylinder"));

        delete_balance(&db, created.id).await.unwrap();
        assert!(list_balances(&db).await.unwrap().is_empty());
    }
}
