//! # Loan Commands
//!
//! Loan customer maintenance and the ledger.
//!
//! A customer's balance only moves through [`record_purchase`] and
//! [`record_repayment`], each of which writes an audit row, or through
//! [`override_balance`], the administrative path that writes none.

use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::state::DbState;
use kade_core::ledger::{REPAYMENT_NOTE, RETAINED_TRANSACTIONS};
use kade_core::{CustomerDraft, LoanCustomer, LoanTransaction, Money, TransactionType};
use kade_db::PruneReport;

/// A customer with their recent history, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetail {
    pub customer: LoanCustomer,
    pub transactions: Vec<LoanTransaction>,
}

/// Adds a customer with a zero balance.
pub async fn add_customer(db: &DbState, draft: CustomerDraft) -> ApiResult<LoanCustomer> {
    let customer = db.inner().loans().create(draft).await?;
    info!(code = %customer.customer_code, "Loan customer added");
    Ok(customer)
}

/// Fields to change on a customer; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub customer_code: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Changes code, name or contact details. The balance is untouched.
///
/// An empty phone or address clears it.
pub async fn update_customer(
    db: &DbState,
    code: &str,
    patch: CustomerPatch,
) -> ApiResult<LoanCustomer> {
    let loans = db.inner().loans();
    let current = loans.require(code).await?;
    let draft = CustomerDraft {
        customer_code: patch.customer_code.unwrap_or(current.customer_code),
        name: patch.name.unwrap_or(current.name),
        phone: patch.phone.or(current.phone),
        address: patch.address.or(current.address),
    };

    let customer = loans.update(code, draft).await?;
    info!(old_code = %code, code = %customer.customer_code, "Loan customer updated");
    Ok(customer)
}

/// Deletes a customer together with their history.
pub async fn delete_customer(db: &DbState, code: &str) -> ApiResult<()> {
    db.inner().loans().delete(code).await?;
    info!(code = %code, "Loan customer deleted");
    Ok(())
}

pub async fn list_customers(db: &DbState) -> ApiResult<Vec<LoanCustomer>> {
    Ok(db.inner().loans().list_all().await?)
}

/// Customers whose code, name or phone contains `query`.
pub async fn search_customers(db: &DbState, query: &str) -> ApiResult<Vec<LoanCustomer>> {
    Ok(db.inner().loans().search(query).await?)
}

/// Customer record plus up to `limit` recent transactions.
pub async fn customer_detail(db: &DbState, code: &str, limit: Option<i64>) -> ApiResult<CustomerDetail> {
    let loans = db.inner().loans();
    let customer = loans.require(code).await?;
    let transactions = loans
        .transactions(code, limit.unwrap_or(RETAINED_TRANSACTIONS))
        .await?;
    Ok(CustomerDetail {
        customer,
        transactions,
    })
}

/// Charges an amount to the customer outside of a bill.
pub async fn record_purchase(
    db: &DbState,
    code: &str,
    amount: Money,
    note: Option<&str>,
) -> ApiResult<LoanTransaction> {
    let tx = db
        .inner()
        .loans()
        .record_transaction(code, TransactionType::Purchase, amount, None, note)
        .await?;
    info!(code = %code, amount = %amount, new_balance = %tx.new_balance(), "Loan charged");
    Ok(tx)
}

/// Takes a repayment. Rejected when it exceeds the outstanding balance.
pub async fn record_repayment(
    db: &DbState,
    code: &str,
    amount: Money,
    note: Option<&str>,
) -> ApiResult<LoanTransaction> {
    let note = note.unwrap_or(REPAYMENT_NOTE);
    let tx = db
        .inner()
        .loans()
        .record_transaction(code, TransactionType::Repayment, amount, None, Some(note))
        .await?;
    info!(code = %code, amount = %amount, new_balance = %tx.new_balance(), "Repayment recorded");
    Ok(tx)
}

/// Sets the balance directly, leaving no history row.
pub async fn override_balance(db: &DbState, code: &str, balance: Money) -> ApiResult<LoanCustomer> {
    Ok(db.inner().loans().override_balance(code, balance).await?)
}

/// Trims every customer's history down to the retained window.
pub async fn prune_all_history(db: &DbState) -> ApiResult<PruneReport> {
    Ok(db.inner().loans().prune_all().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::db;
    use crate::error::ErrorCode;

    fn draft(code: &str) -> CustomerDraft {
        CustomerDraft {
            customer_code: code.to_string(),
            name: "Kamala Silva".to_string(),
            phone: Some("0719876543".to_string()),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_purchase_then_overpay_rejected() {
        let db = db().await;
        add_customer(&db, draft("C001")).await.unwrap();

        record_purchase(&db, "C001", Money::from_cents(50_000), None).await.unwrap();
        let tx = record_purchase(&db, "C001", Money::from_cents(25_000), None).await.unwrap();
        assert_eq!(tx.old_balance(), Money::from_cents(50_000));
        assert_eq!(tx.new_balance(), Money::from_cents(75_000));

        let err = record_repayment(&db, "C001", Money::from_cents(100_000), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let detail = customer_detail(&db, "C001", None).await.unwrap();
        assert_eq!(detail.customer.balance(), Money::from_cents(75_000));
        assert_eq!(detail.transactions.len(), 2);
    }

    #[tokio::test]
    async fn test_repayment_uses_default_note() {
        let db = db().await;
        add_customer(&db, draft("C001")).await.unwrap();
        record_purchase(&db, "C001", Money::from_cents(10_000), None).await.unwrap();

        let tx = record_repayment(&db, "C001", Money::from_cents(10_000), None)
            .await
            .unwrap();
        assert_eq!(tx.note.as_deref(), Some(REPAYMENT_NOTE));
        assert_eq!(tx.new_balance(), Money::zero());
    }

    #[tokio::test]
    async fn test_update_keeps_unpatched_fields() {
        let db = db().await;
        add_customer(&db, draft("C001")).await.unwrap();
        record_purchase(&db, "C001", Money::from_cents(5_000), None).await.unwrap();

        let patch = CustomerPatch {
            customer_code: Some("C100".to_string()),
            address: Some("Kegalle".to_string()),
            ..Default::default()
        };
        let updated = update_customer(&db, "C001", patch).await.unwrap();

        assert_eq!(updated.customer_code, "C100");
        assert_eq!(updated.phone.as_deref(), Some("0719876543"));
        assert_eq!(updated.address.as_deref(), Some("Kegalle"));
        assert_eq!(customer_detail(&db, "C100", None).await.unwrap().transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_override_and_delete() {
        let db = db().await;
        add_customer(&db, draft("C001")).await.unwrap();

        let customer = override_balance(&db, "C001", Money::from_cents(12_345)).await.unwrap();
        assert_eq!(customer.balance(), Money::from_cents(12_345));
        assert!(customer_detail(&db, "C001", None).await.unwrap().transactions.is_empty());

        delete_customer(&db, "C001").await.unwrap();
        let err = customer_detail(&db, "C001", None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
