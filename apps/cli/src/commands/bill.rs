//! # Bill Commands
//!
//! Manipulation of the open bill.
//!
//! ## Bill Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Bill Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│  Open    │────►│  Settle  │────►│ Receipt  │       │
//! │  │  Bill    │     │  Bill    │     │ cash/loan│     │ printed  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                                │
//! │                   add_to_bill       (reserves stock)                   │
//! │                   add_manual_item   (no stock)                         │
//! │                   remove_from_bill  (restores stock)                   │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_bill ──────────────────────► (back to empty,   │
//! │                                                       stock restored)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::commands::product::find_product;
use crate::error::ApiResult;
use crate::state::{BillState, DbState};
use kade_core::search::BILLING_SUGGESTION_LIMIT;
use kade_core::{AddOutcome, Bill, BillItem, BillTotals, Money, Product, Quantity};

/// Bill contents and totals.
#[derive(Debug, Clone, Serialize)]
pub struct BillResponse {
    pub items: Vec<BillItem>,
    pub totals: BillTotals,
}

impl BillResponse {
    fn of(bill: &Bill) -> ApiResult<Self> {
        Ok(BillResponse {
            items: bill.items().to_vec(),
            totals: bill.totals()?,
        })
    }
}

/// Result of adding a catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct AddToBillResponse {
    pub outcome: AddOutcome,
    pub bill: BillResponse,
}

/// Gets the current bill.
pub async fn get_bill(bill: &BillState) -> ApiResult<BillResponse> {
    let bill = bill.lock().await;
    BillResponse::of(&bill)
}

/// Looks up `query` in the catalog and adds it to the bill.
///
/// ## Behavior
/// - Same barcode already on the bill: quantity increases
/// - Stock covers the quantity: stock is reserved in the catalog
/// - Stock is zero: added with a warning, stock untouched
/// - Stock positive but short: rejected, nothing changes
///
/// If the reservation fails (another writer took the stock first) the bill
/// is put back exactly as it was.
pub async fn add_to_bill(
    db: &DbState,
    bill: &BillState,
    query: &str,
    quantity: Quantity,
    price: Option<Money>,
) -> ApiResult<AddToBillResponse> {
    debug!(query = %query, quantity = %quantity, "add_to_bill command");

    let product = find_product(db, query).await?;

    let mut bill = bill.lock().await;
    let snapshot = bill.clone();
    let outcome = bill.add_product(&product, quantity, price)?;

    if let Err(e) = db
        .inner()
        .products()
        .reserve_stock(&product.barcode, outcome.stock_to_deduct)
        .await
    {
        *bill = snapshot;
        return Err(e.into());
    }

    if let Some(warning) = &outcome.warning {
        warn!(barcode = %product.barcode, "{}", warning);
    }
    info!(
        barcode = %product.barcode,
        line = outcome.line,
        merged = outcome.merged,
        reserved = %outcome.stock_to_deduct,
        "Item added to bill"
    );

    Ok(AddToBillResponse {
        outcome,
        bill: BillResponse::of(&bill)?,
    })
}

/// Adds an item that isn't in the catalog. Stock is not involved.
pub async fn add_manual_item(
    bill: &BillState,
    name: &str,
    price: Money,
    quantity: Option<Quantity>,
) -> ApiResult<BillResponse> {
    let mut bill = bill.lock().await;
    let line = bill.add_manual(name, price, quantity)?;
    info!(line, name = %name.trim(), "Manual item added to bill");
    BillResponse::of(&bill)
}

/// Removes line `line` (1-based) and hands its reserved stock back.
///
/// The line only leaves the bill once its stock is back in the catalog.
pub async fn remove_from_bill(db: &DbState, bill: &BillState, line: usize) -> ApiResult<BillResponse> {
    let mut bill = bill.lock().await;
    let item = bill.line(line)?.clone();
    restore(db, &item).await?;
    bill.remove_line(line)?;
    info!(line, name = %item.name, "Line removed from bill");
    BillResponse::of(&bill)
}

/// Empties the bill and hands every reservation back.
///
/// Lines are dropped one at a time after their stock is restored; if the
/// catalog can't be updated the remaining lines stay on the bill.
pub async fn clear_bill(db: &DbState, bill: &BillState) -> ApiResult<BillResponse> {
    let mut bill = bill.lock().await;
    let lines = bill.line_count();
    while let Some(item) = bill.items().first().cloned() {
        restore(db, &item).await?;
        bill.remove_line(1)?;
    }
    bill.clear();
    info!(lines, "Bill cleared");
    BillResponse::of(&bill)
}

/// Suggestions for the billing search box.
pub async fn suggest_for_bill(db: &DbState, query: &str) -> ApiResult<Vec<Product>> {
    Ok(db
        .inner()
        .products()
        .suggest(query, BILLING_SUGGESTION_LIMIT)
        .await?)
}

async fn restore(db: &DbState, item: &BillItem) -> ApiResult<()> {
    if let Some((barcode, qty)) = item.reservation() {
        db.inner().products().restore_stock(barcode, qty).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::add_product;
    use crate::commands::test_support::{db, product};
    use crate::error::ErrorCode;

    async fn stock(db: &DbState, barcode: &str) -> Quantity {
        db.inner()
            .products()
            .get_by_barcode(barcode)
            .await
            .unwrap()
            .unwrap()
            .quantity()
    }

    #[tokio::test]
    async fn test_same_barcode_merges_and_reserves() {
        let db = db().await;
        let bill = BillState::new();
        add_product(&db, product("Soap", "S1", 17_000, 10)).await.unwrap();

        add_to_bill(&db, &bill, "S1", Quantity::from_units(2), None).await.unwrap();
        let resp = add_to_bill(&db, &bill, "soap", Quantity::from_units(3), None)
            .await
            .unwrap();

        assert!(resp.outcome.merged);
        assert_eq!(resp.bill.items.len(), 1);
        assert_eq!(resp.bill.items[0].quantity, Quantity::from_units(5));
        assert_eq!(resp.bill.totals.total, Money::from_cents(85_000));
        assert_eq!(stock(&db, "S1").await, Quantity::from_units(5));
    }

    #[tokio::test]
    async fn test_zero_stock_added_with_warning() {
        let db = db().await;
        let bill = BillState::new();
        add_product(&db, product("Matches", "M1", 1_000, 0)).await.unwrap();

        let resp = add_to_bill(&db, &bill, "M1", Quantity::from_units(3), None)
            .await
            .unwrap();

        assert!(resp.outcome.warning.is_some());
        assert_eq!(resp.bill.items.len(), 1);
        assert_eq!(stock(&db, "M1").await, Quantity::zero());
    }

    #[tokio::test]
    async fn test_short_stock_rejected_without_change() {
        let db = db().await;
        let bill = BillState::new();
        add_product(&db, product("Soap", "S1", 17_000, 2)).await.unwrap();

        let err = add_to_bill(&db, &bill, "S1", Quantity::from_units(3), None)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(get_bill(&bill).await.unwrap().items.is_empty());
        assert_eq!(stock(&db, "S1").await, Quantity::from_units(2));
    }

    #[tokio::test]
    async fn test_remove_and_clear_restore_stock() {
        let db = db().await;
        let bill = BillState::new();
        add_product(&db, product("Soap", "S1", 17_000, 10)).await.unwrap();
        add_product(&db, product("Salt", "S2", 9_000, 10)).await.unwrap();

        add_to_bill(&db, &bill, "S1", Quantity::from_units(4), None).await.unwrap();
        add_to_bill(&db, &bill, "S2", Quantity::from_units(6), None).await.unwrap();
        add_manual_item(&bill, "Bag", Money::from_cents(500), None).await.unwrap();

        let resp = remove_from_bill(&db, &bill, 1).await.unwrap();
        assert_eq!(resp.items.len(), 2);
        assert_eq!(stock(&db, "S1").await, Quantity::from_units(10));

        let resp = clear_bill(&db, &bill).await.unwrap();
        assert!(resp.items.is_empty());
        assert_eq!(stock(&db, "S2").await, Quantity::from_units(10));

        let err = remove_from_bill(&db, &bill, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BillError);
    }

    #[tokio::test]
    async fn test_failed_restore_keeps_lines_on_bill() {
        let db = db().await;
        let bill = BillState::new();
        add_product(&db, product("Soap", "S1", 17_000, 10)).await.unwrap();
        add_to_bill(&db, &bill, "S1", Quantity::from_units(2), None).await.unwrap();
        add_manual_item(&bill, "Bag", Money::from_cents(500), None).await.unwrap();

        db.inner().close().await;

        let err = remove_from_bill(&db, &bill, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(clear_bill(&db, &bill).await.is_err());

        let resp = get_bill(&bill).await.unwrap();
        assert_eq!(resp.items.len(), 2);
        assert_eq!(resp.items[0].reservation(), Some(("S1", Quantity::from_units(2))));
    }

    #[tokio::test]
    async fn test_unknown_product_not_found() {
        let db = db().await;
        let bill = BillState::new();

        let err = add_to_bill(&db, &bill, "999", Quantity::from_units(1), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
