//! # Loan Repository
//!
//! Loan customers and their balance ledger.
//!
//! ## Recording a Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              record_transaction("C001", PURCHASE, 250.00)               │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    SELECT customer            ── missing? → CustomerNotFound, ROLLBACK  │
//! │    apply_transaction()        ── overpay?  → RepaymentExceeds, ROLLBACK │
//! │    INSERT loan_transactions   (old 500.00 → new 750.00)                 │
//! │    UPDATE loan_customers.current_balance = 750.00                       │
//! │    COUNT history > 15?        ── DELETE all but newest 10               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The balance column is the source of truth; history rows are an audit
//! trail and pruning them never touches the balance. "Newest" means most
//! recently inserted, which is also timestamp order.

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::contains_pattern;
use kade_core::ledger::{apply_transaction, needs_pruning, RETAINED_TRANSACTIONS};
use kade_core::validation::validate_balance;
use kade_core::{CoreError, CustomerDraft, LoanCustomer, LoanTransaction, Money, TransactionType};

/// Outcome of pruning every customer's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub customers: usize,
    pub deleted: u64,
}

/// Repository for loan customers and the loan ledger.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    pool: SqlitePool,
}

impl LoanRepository {
    /// Creates a new LoanRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LoanRepository { pool }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Gets a customer by code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<LoanCustomer>> {
        let customer =
            sqlx::query_as::<_, LoanCustomer>("SELECT * FROM loan_customers WHERE customer_code = ?1")
                .bind(code.trim())
                .fetch_optional(&self.pool)
                .await?;

        Ok(customer)
    }

    /// Gets a customer by code, failing with `CustomerNotFound`.
    pub async fn require(&self, code: &str) -> DbResult<LoanCustomer> {
        self.get_by_code(code)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(code.trim().to_string()).into())
    }

    /// Every customer, sorted by name.
    pub async fn list_all(&self) -> DbResult<Vec<LoanCustomer>> {
        let customers =
            sqlx::query_as::<_, LoanCustomer>("SELECT * FROM loan_customers ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(customers)
    }

    /// Customers whose code, name or phone contains `query`.
    pub async fn search(&self, query: &str) -> DbResult<Vec<LoanCustomer>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_all().await;
        }

        let customers = sqlx::query_as::<_, LoanCustomer>(
            r#"
            SELECT * FROM loan_customers
            WHERE customer_code LIKE ?1 ESCAPE '\'
               OR name LIKE ?1 ESCAPE '\'
               OR phone LIKE ?1 ESCAPE '\'
            ORDER BY name
            "#,
        )
        .bind(contains_pattern(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Creates a customer with a zero balance.
    pub async fn create(&self, draft: CustomerDraft) -> DbResult<LoanCustomer> {
        let draft = draft.validated()?;

        if self.get_by_code(&draft.customer_code).await?.is_some() {
            return Err(DbError::duplicate("customer_code", draft.customer_code));
        }

        debug!(code = %draft.customer_code, "Creating loan customer");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO loan_customers (
                customer_code, name, phone, address,
                current_balance_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
            "#,
        )
        .bind(&draft.customer_code)
        .bind(&draft.name)
        .bind(&draft.phone)
        .bind(&draft.address)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.require(&draft.customer_code).await
    }

    /// Edits contact fields. The balance is never touched here.
    ///
    /// Renaming the code carries the history along (`ON UPDATE CASCADE`).
    pub async fn update(&self, code: &str, draft: CustomerDraft) -> DbResult<LoanCustomer> {
        let draft = draft.validated()?;
        let existing = self.require(code).await?;

        if draft.customer_code != existing.customer_code
            && self.get_by_code(&draft.customer_code).await?.is_some()
        {
            return Err(DbError::duplicate("customer_code", draft.customer_code));
        }

        debug!(code = %existing.customer_code, "Updating loan customer");

        sqlx::query(
            r#"
            UPDATE loan_customers SET
                customer_code = ?2,
                name = ?3,
                phone = ?4,
                address = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(existing.id)
        .bind(&draft.customer_code)
        .bind(&draft.name)
        .bind(&draft.phone)
        .bind(&draft.address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.require(&draft.customer_code).await
    }

    /// Deletes a customer and, by cascade, their whole history.
    pub async fn delete(&self, code: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM loan_customers WHERE customer_code = ?1")
            .bind(code.trim())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CustomerNotFound(code.trim().to_string()).into());
        }

        info!(code = %code.trim(), "Deleted loan customer and history");
        Ok(())
    }

    /// Sets a balance directly, without a history row.
    ///
    /// Administrative correction only; every counter flow goes through
    /// [`record_transaction`](Self::record_transaction).
    pub async fn override_balance(&self, code: &str, balance: Money) -> DbResult<LoanCustomer> {
        validate_balance(balance)?;
        let customer = self.require(code).await?;

        warn!(
            code = %customer.customer_code,
            old = %customer.balance(),
            new = %balance,
            "Overriding loan balance"
        );

        sqlx::query(
            "UPDATE loan_customers SET current_balance_cents = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(customer.id)
        .bind(balance.cents())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.require(code).await
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    /// Records a purchase or repayment and moves the balance, atomically.
    ///
    /// ## Returns
    /// * `Ok(LoanTransaction)` - the audit row just written
    /// * `Err(Core(CustomerNotFound))` - unknown code, nothing written
    /// * `Err(Core(RepaymentExceedsBalance))` - overpayment, nothing written
    pub async fn record_transaction(
        &self,
        code: &str,
        transaction_type: TransactionType,
        amount: Money,
        bill_number: Option<&str>,
        note: Option<&str>,
    ) -> DbResult<LoanTransaction> {
        let code = code.trim();
        let mut tx = self.pool.begin().await?;

        let customer =
            sqlx::query_as::<_, LoanCustomer>("SELECT * FROM loan_customers WHERE customer_code = ?1")
                .bind(code)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| CoreError::CustomerNotFound(code.to_string()))?;

        let change = apply_transaction(customer.balance(), transaction_type, amount)?;
        let now = Utc::now();

        let inserted = sqlx::query(
            r#"
            INSERT INTO loan_transactions (
                customer_code, transaction_type, amount_cents,
                old_balance_cents, new_balance_cents, bill_number, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(code)
        .bind(change.transaction_type)
        .bind(change.amount.cents())
        .bind(change.old_balance.cents())
        .bind(change.new_balance.cents())
        .bind(bill_number)
        .bind(note)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE loan_customers SET current_balance_cents = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(customer.id)
        .bind(change.new_balance.cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loan_transactions WHERE customer_code = ?1")
                .bind(code)
                .fetch_one(&mut *tx)
                .await?;
        if needs_pruning(count) {
            prune_with(&mut tx, code).await?;
        }

        let transaction =
            sqlx::query_as::<_, LoanTransaction>("SELECT * FROM loan_transactions WHERE id = ?1")
                .bind(inserted.last_insert_rowid())
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        info!(
            code = %code,
            kind = %transaction_type,
            amount = %amount,
            old = %change.old_balance,
            new = %change.new_balance,
            "Loan transaction recorded"
        );

        Ok(transaction)
    }

    /// A customer's history, newest first.
    pub async fn transactions(&self, code: &str, limit: i64) -> DbResult<Vec<LoanTransaction>> {
        let transactions = sqlx::query_as::<_, LoanTransaction>(
            r#"
            SELECT * FROM loan_transactions
            WHERE customer_code = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )
        .bind(code.trim())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    pub async fn transaction_count(&self, code: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loan_transactions WHERE customer_code = ?1")
                .bind(code.trim())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Deletes all but the newest retained rows of one customer's history.
    ///
    /// Returns the number of rows deleted.
    pub async fn prune_history(&self, code: &str) -> DbResult<u64> {
        let mut conn = self.pool.acquire().await?;
        prune_with(&mut conn, code.trim()).await
    }

    /// Prunes every customer's history.
    pub async fn prune_all(&self) -> DbResult<PruneReport> {
        let customers = self.list_all().await?;
        let mut report = PruneReport {
            customers: customers.len(),
            deleted: 0,
        };

        for customer in &customers {
            report.deleted += self.prune_history(&customer.customer_code).await?;
        }

        info!(
            customers = report.customers,
            deleted = report.deleted,
            "Pruned loan history"
        );
        Ok(report)
    }
}

async fn prune_with(conn: &mut SqliteConnection, code: &str) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM loan_transactions
        WHERE customer_code = ?1
          AND id NOT IN (
              SELECT id FROM loan_transactions
              WHERE customer_code = ?1
              ORDER BY id DESC
              LIMIT ?2
          )
        "#,
    )
    .bind(code)
    .bind(RETAINED_TRANSACTIONS)
    .execute(&mut *conn)
    .await?;

    let deleted = result.rows_affected();
    if deleted > 0 {
        debug!(code = %code, deleted = deleted, "Pruned old loan transactions");
    }
    Ok(deleted)
}

// =============================================================================
// Unit Tests
// =============================================================================
