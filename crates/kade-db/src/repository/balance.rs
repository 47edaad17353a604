//! # Temporary Balance Repository
//!
//! Free-standing named balances ("Nimal owes 50 for the bottle deposit").
//! They have no link to loan customers and no history.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::contains_pattern;
use kade_core::{TemporaryBalance, TemporaryBalanceDraft};

#[derive(Debug, Clone)]
pub struct TemporaryBalanceRepository {
    pool: SqlitePool,
}

impl TemporaryBalanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TemporaryBalanceRepository { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<TemporaryBalance>> {
        let balance =
            sqlx::query_as::<_, TemporaryBalance>("SELECT * FROM temporary_balances WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(balance)
    }

    /// Newest first.
    pub async fn list_all(&self) -> DbResult<Vec<TemporaryBalance>> {
        let balances = sqlx::query_as::<_, TemporaryBalance>(
            "SELECT * FROM temporary_balances ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(balances)
    }

    /// Balances whose name or notes contain `query`.
    pub async fn search(&self, query: &str) -> DbResult<Vec<TemporaryBalance>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_all().await;
        }

        let balances = sqlx::query_as::<_, TemporaryBalance>(
            r#"
            SELECT * FROM temporary_balances
            WHERE customer_name LIKE ?1 ESCAPE '\'
               OR notes LIKE ?1 ESCAPE '\'
            ORDER BY id DESC
            "#,
        )
        .bind(contains_pattern(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(balances)
    }

    pub async fn insert(&self, draft: TemporaryBalanceDraft) -> DbResult<TemporaryBalance> {
        let draft = draft.validated()?;
        debug!(name = %draft.customer_name, "Adding temporary balance");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO temporary_balances (customer_name, balance_cents, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(&draft.customer_name)
        .bind(draft.balance.cents())
        .bind(&draft.notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.require(result.last_insert_rowid()).await
    }

    pub async fn update(&self, id: i64, draft: TemporaryBalanceDraft) -> DbResult<TemporaryBalance> {
        let draft = draft.validated()?;

        let result = sqlx::query(
            r#"
            UPDATE temporary_balances SET
                customer_name = ?2,
                balance_cents = ?3,
                notes = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&draft.customer_name)
        .bind(draft.balance.cents())
        .bind(&draft.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Temporary balance", id.to_string()));
        }

        self.require(id).await
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM temporary_balances WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Temporary balance", id.to_string()));
        }

        Ok(())
    }

    async fn require(&self, id: i64) -> DbResult<TemporaryBalance> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Temporary balance", id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use kade_core::Money;

    fn draft(name: &str, cents: i64, notes: Option<&str>) -> TemporaryBalanceDraft {
        TemporaryBalanceDraft {
            customer_name: name.to_string(),
            balance: Money::from_cents(cents),
            notes: notes.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_crud_and_search() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().balances();

        let nimal = repo.insert(draft(" Nimal ", 5_000, Some("bottle deposit"))).await.unwrap();
        repo.insert(draft("Kamal", 2_000, None)).await.unwrap();
        assert_eq!(nimal.customer_name, "Nimal");

        assert_eq!(repo.list_all().await.unwrap()[0].customer_name, "Kamal");
        assert_eq!(repo.search("bottle").await.unwrap().len(), 1);
        assert_eq!(repo.search("").await.unwrap().len(), 2);

        let updated = repo.update(nimal.id, draft("Nimal", 3_000, None)).await.unwrap();
        assert_eq!(updated.balance().cents(), 3_000);
        assert_eq!(updated.notes, None);

        repo.delete(nimal.id).await.unwrap();
        assert!(matches!(repo.delete(nimal.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_non_positive_balance_rejected() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().balances();
        assert!(matches!(
            repo.insert(draft("Nimal", 0, None)).await,
            Err(DbError::Core(_))
        ));
    }
}
