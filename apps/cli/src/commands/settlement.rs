//! # Settlement Commands
//!
//! Pays the open bill by cash or on loan and produces the receipt.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Settlement                                           │
//! │                                                                         │
//! │  Open bill (total T)                                                   │
//! │       │                                                                 │
//! │       ├── Cash: tendered ≥ T? ──no──► PAYMENT_ERROR, bill unchanged    │
//! │       │           │ yes                                                 │
//! │       │           ▼                                                     │
//! │       │     change = tendered − T (shown, not stored)                  │
//! │       │                                                                 │
//! │       └── Loan: customer exists? ──no──► NOT_FOUND, pay cash instead   │
//! │                   │ yes                                                 │
//! │                   ▼                                                     │
//! │             quote_loan_settlement() → operator confirms                │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │             PURCHASE row + new balance (one SQL transaction)           │
//! │                                                                         │
//! │  Either way: bill emptied, reservations final, receipt rendered        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::state::{BillState, ConfigState, DbState};
use kade_core::ledger::PURCHASE_NOTE;
use kade_core::receipt::{bill_number, Receipt};
use kade_core::settlement::{self, LoanQuote, Payment};
use kade_core::{CoreError, TransactionType};

/// A settled bill.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementResponse {
    pub receipt: Receipt,
    /// Plain-text receipt, ready to print
    pub rendered: String,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Settles the open bill with cash.
///
/// ## Returns
/// * `Ok(SettlementResponse)` - receipt with `PAID` and `Balance` lines
/// * `Err` with `PAYMENT_ERROR` - tendered below total, bill untouched
/// * `Err` with `BILL_ERROR` - nothing on the bill
pub async fn settle_cash(
    db: &DbState,
    bill: &BillState,
    config: &ConfigState,
    tendered: kade_core::Money,
) -> ApiResult<SettlementResponse> {
    let settings = db.inner().settings().get().await?;
    let mut bill = bill.lock().await;

    if bill.is_empty() {
        return Err(CoreError::EmptyBill.into());
    }
    let total = bill.totals()?.total;
    let payment = settlement::settle_cash(total, tendered)?;
    let items = bill.take_items()?;

    let receipt = Receipt::new(items, payment, now())?;
    info!(
        bill_number = %receipt.bill_number,
        total = %receipt.totals.total,
        change = %receipt.balance_amount(),
        "Bill settled in cash"
    );

    let rendered = receipt.render(&settings, config.receipt_width);
    Ok(SettlementResponse { receipt, rendered })
}

/// Shows what charging the open bill to `customer_code` would do.
/// Nothing is written.
pub async fn quote_loan_settlement(
    db: &DbState,
    bill: &BillState,
    customer_code: &str,
) -> ApiResult<LoanQuote> {
    let customer = db.inner().loans().require(customer_code).await?;
    let bill = bill.lock().await;

    let total = bill.totals()?.total;
    Ok(settlement::quote_loan(&customer, total)?)
}

/// Charges the open bill to a loan customer.
///
/// The `PURCHASE` transaction and the new balance are written together;
/// if that fails the bill stays open.
pub async fn settle_loan(
    db: &DbState,
    bill: &BillState,
    config: &ConfigState,
    customer_code: &str,
) -> ApiResult<SettlementResponse> {
    let settings = db.inner().settings().get().await?;
    let customer = db.inner().loans().require(customer_code).await?;
    let mut bill = bill.lock().await;

    if bill.is_empty() {
        return Err(CoreError::EmptyBill.into());
    }
    let total = bill.totals()?.total;
    let issued_at = now();
    let number = bill_number(issued_at);

    let transaction = db
        .inner()
        .loans()
        .record_transaction(
            &customer.customer_code,
            TransactionType::Purchase,
            total,
            Some(&number),
            Some(PURCHASE_NOTE),
        )
        .await?;

    let payment = Payment::Loan {
        customer_code: customer.customer_code.clone(),
        customer_name: customer.name.clone(),
        old_balance: transaction.old_balance(),
        new_balance: transaction.new_balance(),
    };
    let items = bill.take_items()?;

    let receipt = Receipt::new(items, payment, issued_at)?;
    info!(
        bill_number = %receipt.bill_number,
        customer = %customer.customer_code,
        total = %total,
        new_balance = %transaction.new_balance(),
        "Bill settled on loan"
    );

    let rendered = receipt.render(&settings, config.receipt_width);
    Ok(SettlementResponse { receipt, rendered })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::bill::{add_manual_item, add_to_bill, get_bill};
    use crate::commands::product::add_product;
    use crate::commands::test_support::{db, product};
    use crate::error::ErrorCode;
    use kade_core::{CustomerDraft, Money, Quantity};

    fn config() -> ConfigState {
        ConfigState::new(":memory:", std::env::temp_dir())
    }

    async fn bill_of(db: &DbState, cents: i64) -> BillState {
        let bill = BillState::new();
        add_product(db, product("Rice", "R1", cents, 100)).await.unwrap();
        add_to_bill(db, &bill, "R1", Quantity::from_units(1), None).await.unwrap();
        bill
    }

    async fn customer(db: &DbState, code: &str, balance_cents: i64) {
        db.inner()
            .loans()
            .create(CustomerDraft {
                customer_code: code.to_string(),
                name: "Nimal Perera".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();
        if balance_cents > 0 {
            db.inner()
                .loans()
                .record_transaction(
                    code,
                    TransactionType::Purchase,
                    Money::from_cents(balance_cents),
                    None,
                    None,
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_cash_exact_tender_has_zero_balance() {
        let db = db().await;
        let bill = bill_of(&db, 25_000).await;

        let resp = settle_cash(&db, &bill, &config(), Money::from_cents(25_000))
            .await
            .unwrap();

        assert_eq!(resp.receipt.balance_amount(), Money::zero());
        assert!(resp.rendered.contains("PAID: Rs. 250.00"));
        assert!(get_bill(&bill).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_cash_short_tender_keeps_bill() {
        let db = db().await;
        let bill = bill_of(&db, 25_000).await;

        let err = settle_cash(&db, &bill, &config(), Money::from_cents(20_000))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::PaymentError);
        assert_eq!(get_bill(&bill).await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_bill_cannot_settle() {
        let db = db().await;
        let err = settle_cash(&db, &BillState::new(), &config(), Money::from_cents(100))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BillError);
    }

    #[tokio::test]
    async fn test_loan_settlement_updates_balance() {
        let db = db().await;
        customer(&db, "C001", 50_000).await;
        let bill = bill_of(&db, 25_000).await;

        let quote = quote_loan_settlement(&db, &bill, "C001").await.unwrap();
        assert_eq!(quote.new_balance, Money::from_cents(75_000));

        let resp = settle_loan(&db, &bill, &config(), "C001").await.unwrap();
        assert!(resp.rendered.contains("PAID AS LOAN"));
        assert!(resp.rendered.contains("New Balance: Rs. 750.00"));

        let customer = db.inner().loans().require("C001").await.unwrap();
        assert_eq!(customer.balance(), Money::from_cents(75_000));

        let history = db.inner().loans().transactions("C001", 10).await.unwrap();
        assert_eq!(history[0].bill_number.as_deref(), Some(resp.receipt.bill_number.as_str()));
        assert_eq!(history[0].note.as_deref(), Some(PURCHASE_NOTE));
    }

    #[tokio::test]
    async fn test_tax_rate_is_not_added_to_loan_charge() {
        let db = db().await;
        let mut settings = db.inner().settings().get().await.unwrap();
        settings.tax_rate_bps = 1_000;
        db.inner().settings().save(settings).await.unwrap();

        customer(&db, "C001", 0).await;
        let bill = bill_of(&db, 25_000).await;
        add_manual_item(&bill, "Bag", Money::from_cents(500), Some(Quantity::from_units(2)))
            .await
            .unwrap();
        let line_sum: Money = get_bill(&bill)
            .await
            .unwrap()
            .items
            .iter()
            .map(|item| item.line_total().unwrap())
            .sum();
        assert_eq!(line_sum, Money::from_cents(26_000));

        let quote = quote_loan_settlement(&db, &bill, "C001").await.unwrap();
        assert_eq!(quote.amount, line_sum);

        let resp = settle_loan(&db, &bill, &config(), "C001").await.unwrap();
        assert_eq!(resp.receipt.totals.total, line_sum);

        let customer = db.inner().loans().require("C001").await.unwrap();
        assert_eq!(customer.balance(), line_sum);
        let history = db.inner().loans().transactions("C001", 10).await.unwrap();
        assert_eq!(history[0].amount(), line_sum);
    }

    #[tokio::test]
    async fn test_unknown_customer_leaves_bill_open() {
        let db = db().await;
        let bill = bill_of(&db, 25_000).await;

        let err = settle_loan(&db, &bill, &config(), "C404").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(get_bill(&bill).await.unwrap().items.len(), 1);
    }
}
