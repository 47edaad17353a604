//! # Billing Session
//!
//! The open bill at the counter: lines accumulated from catalog lookups or
//! typed in by hand, summed into a total.
//!
//! ## Bill Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Bill Lifecycle                                  │
//! │                                                                         │
//! │  ┌──────────┐  add_product   ┌──────────┐  settlement  ┌────────────┐   │
//! │  │  Empty   │──────────────►│  Open    │─────────────►│  Receipt   │   │
//! │  │  Bill    │  add_manual    │  Bill    │  take_items  │  (printed) │   │
//! │  └──────────┘                └────┬─────┘              └────────────┘   │
//! │       ▲                           │                                     │
//! │       │       remove_line / clear │                                     │
//! │       └───────────────────────────┘                                     │
//! │            returned lines carry their stock reservation                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Reservations
//! Adding a catalog product takes stock out of the catalog immediately. Each
//! line remembers how much it took (`reserved`), so removing the line or
//! clearing the bill hands that stock back instead of losing it. Products
//! whose stock is exactly zero are untracked: they are added with a warning
//! and reserve nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{Product, UnitType};
use crate::validation::{
    validate_bill_size, validate_product_name, validate_quantity, validate_selling_price,
};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Bill Item
// =============================================================================

/// One line on the bill.
///
/// Price and name are frozen when the line is created; later catalog edits
/// don't change an open bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub name: String,

    /// `None` for manually entered items.
    pub barcode: Option<String>,

    pub unit_price: Money,
    pub marked_price: Money,
    pub quantity: Quantity,
    pub unit_type: UnitType,
    pub unit_measure: String,

    /// Stock taken from the catalog for this line.
    pub reserved: Quantity,
}

impl BillItem {
    /// Line for a catalog product, at `price` (the catalog price unless the
    /// operator overrode it).
    pub fn from_product(product: &Product, quantity: Quantity, price: Money) -> Self {
        BillItem {
            name: product.name.clone(),
            barcode: Some(product.barcode.clone()),
            unit_price: price,
            marked_price: product.marked_price(),
            quantity,
            unit_type: product.unit_type,
            unit_measure: product.unit_measure.clone(),
            reserved: Quantity::zero(),
        }
    }

    /// Line for an item that isn't in the catalog. Its marked price equals
    /// its price, so it never shows savings.
    pub fn manual(name: &str, price: Money, quantity: Quantity) -> Self {
        BillItem {
            name: name.trim().to_string(),
            barcode: None,
            unit_price: price,
            marked_price: price,
            quantity,
            unit_type: UnitType::Unit,
            unit_measure: UnitType::Unit.default_measure().to_string(),
            reserved: Quantity::zero(),
        }
    }

    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price
            .multiply_quantity(self.quantity)
            .ok_or_else(|| overflow("line total"))
    }

    pub fn marked_total(&self) -> CoreResult<Money> {
        self.marked_price
            .multiply_quantity(self.quantity)
            .ok_or_else(|| overflow("marked total"))
    }

    /// Savings against the marked price. Zero without a marked price, and
    /// never negative.
    pub fn savings(&self) -> CoreResult<Money> {
        if !self.marked_price.is_positive() {
            return Ok(Money::zero());
        }
        let savings = self
            .marked_total()?
            .checked_sub(self.line_total()?)
            .ok_or_else(|| overflow("savings"))?;
        Ok(if savings.is_negative() {
            Money::zero()
        } else {
            savings
        })
    }

    /// Quantity with its unit, e.g. `1.25 kg` or `3 pieces`.
    pub fn display_quantity(&self) -> String {
        format!(
            "{} {}",
            self.quantity.format_fixed(self.unit_type.display_decimals()),
            self.unit_measure
        )
    }

    /// Barcode and quantity to hand back to the catalog if this line is
    /// dropped before settlement.
    pub fn reservation(&self) -> Option<(&str, Quantity)> {
        match &self.barcode {
            Some(barcode) if self.reserved.is_positive() => Some((barcode.as_str(), self.reserved)),
            _ => None,
        }
    }
}

fn overflow(what: &str) -> CoreError {
    CoreError::AmountOverflow(what.to_string())
}

// =============================================================================
// Add Outcome
// =============================================================================

/// Non-fatal notice raised while adding an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockWarning {
    /// Product has no stock recorded; it was added without touching stock.
    Untracked { product: String },
}

impl std::fmt::Display for StockWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockWarning::Untracked { product } => write!(
                f,
                "WARNING: {} has no stock quantity set. Product added to bill anyway.",
                product
            ),
        }
    }
}

/// What [`Bill::add_product`] did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOutcome {
    /// 1-based line number the product landed on.
    pub line: usize,
    /// True when an existing line's quantity was increased.
    pub merged: bool,
    pub warning: Option<StockWarning>,
    /// Stock the caller must take out of the catalog.
    pub stock_to_deduct: Quantity,
}

// =============================================================================
// Bill Totals
// =============================================================================

/// What the customer pays is `total`, the plain sum of line totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillTotals {
    pub line_count: usize,
    pub total: Money,
    pub savings: Money,
}

// =============================================================================
// Bill
// =============================================================================

/// The bill currently being rung up.
///
/// ## Invariants
/// - Catalog lines are unique by barcode (adding again merges)
/// - Every line quantity is > 0 and at most `MAX_ITEM_QUANTITY`
/// - Totals are always derived from the lines, never cached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    items: Vec<BillItem>,
    opened_at: DateTime<Utc>,
}

impl Default for Bill {
    fn default() -> Self {
        Self::new()
    }
}

impl Bill {
    pub fn new() -> Self {
        Bill {
            items: Vec::new(),
            opened_at: Utc::now(),
        }
    }

    pub fn items(&self) -> &[BillItem] {
        &self.items
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Adds a catalog product, merging with an existing line for the same
    /// barcode.
    ///
    /// ## Stock Check
    /// ```text
    /// requested <= stock        → add, deduct requested
    /// stock == 0                → add with Untracked warning, deduct nothing
    /// 0 < stock < requested     → InsufficientStock, bill unchanged
    /// ```
    ///
    /// `product` should be freshly read from the catalog, so its stock
    /// already reflects earlier lines of this bill.
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: Quantity,
        price_override: Option<Money>,
    ) -> CoreResult<AddOutcome> {
        validate_quantity(quantity)?;
        if let Some(price) = price_override {
            validate_selling_price(price)?;
        }

        let available = product.quantity();
        let mut warning = None;
        if available < quantity {
            if available.is_zero() {
                warning = Some(StockWarning::Untracked {
                    product: product.name.clone(),
                });
            } else {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available,
                    requested: quantity,
                });
            }
        }

        let stock_to_deduct = if available.is_positive() {
            quantity
        } else {
            Quantity::zero()
        };

        if let Some(index) = self
            .items
            .iter()
            .position(|item| item.barcode.as_deref() == Some(product.barcode.as_str()))
        {
            let merged_quantity = self.items[index].quantity + quantity;
            if merged_quantity > Quantity::from_units(MAX_ITEM_QUANTITY) {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged_quantity,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            let mut merged = self.items[index].clone();
            merged.quantity = merged_quantity;
            self.ensure_total_fits(&merged, Some(index))?;

            let item = &mut self.items[index];
            item.quantity = merged_quantity;
            item.reserved += stock_to_deduct;

            return Ok(AddOutcome {
                line: index + 1,
                merged: true,
                warning,
                stock_to_deduct,
            });
        }

        validate_bill_size(self.items.len())?;

        let price = price_override.unwrap_or_else(|| product.price());
        let mut item = BillItem::from_product(product, quantity, price);
        item.reserved = stock_to_deduct;
        self.ensure_total_fits(&item, None)?;
        self.items.push(item);

        Ok(AddOutcome {
            line: self.items.len(),
            merged: false,
            warning,
            stock_to_deduct,
        })
    }

    /// Appends an item that isn't in the catalog.
    ///
    /// A missing or non-positive quantity counts as 1. Manual lines are
    /// never merged.
    pub fn add_manual(
        &mut self,
        name: &str,
        price: Money,
        quantity: Option<Quantity>,
    ) -> CoreResult<usize> {
        validate_product_name(name)?;
        validate_selling_price(price)?;

        let quantity = quantity
            .filter(|q| q.is_positive())
            .unwrap_or_else(|| Quantity::from_units(1));
        validate_quantity(quantity)?;
        validate_bill_size(self.items.len())?;

        let item = BillItem::manual(name, price, quantity);
        self.ensure_total_fits(&item, None)?;
        self.items.push(item);
        Ok(self.items.len())
    }

    /// Line by 1-based number.
    pub fn line(&self, line: usize) -> CoreResult<&BillItem> {
        line.checked_sub(1)
            .and_then(|index| self.items.get(index))
            .ok_or(CoreError::LineNotFound(line))
    }

    /// Removes a line by 1-based number and returns it, so the caller can
    /// hand its reservation back to the catalog.
    pub fn remove_line(&mut self, line: usize) -> CoreResult<BillItem> {
        self.line(line)?;
        Ok(self.items.remove(line - 1))
    }

    /// Empties the bill and returns every line for stock restoration.
    pub fn clear(&mut self) -> Vec<BillItem> {
        self.opened_at = Utc::now();
        std::mem::take(&mut self.items)
    }

    /// Empties the bill after settlement. Reservations become final.
    pub fn take_items(&mut self) -> CoreResult<Vec<BillItem>> {
        if self.items.is_empty() {
            return Err(CoreError::EmptyBill);
        }
        self.opened_at = Utc::now();
        Ok(std::mem::take(&mut self.items))
    }

    pub fn totals(&self) -> CoreResult<BillTotals> {
        totals_for(&self.items)
    }

    /// Rejects `candidate` if its line total, or the bill total with it in
    /// place of line `replacing`, would overflow.
    fn ensure_total_fits(&self, candidate: &BillItem, replacing: Option<usize>) -> CoreResult<()> {
        let mut total = candidate.line_total()?;
        for (index, item) in self.items.iter().enumerate() {
            if Some(index) == replacing {
                continue;
            }
            total = total
                .checked_add(item.line_total()?)
                .ok_or_else(|| overflow("bill total"))?;
        }
        Ok(())
    }
}

/// Totals for a set of lines, used for both open bills and settled ones.
///
/// The store's tax rate is not applied: the bill total is exactly the sum
/// of its line totals.
pub fn totals_for(items: &[BillItem]) -> CoreResult<BillTotals> {
    let line_totals = items
        .iter()
        .map(BillItem::line_total)
        .collect::<CoreResult<Vec<_>>>()?;
    let savings = items
        .iter()
        .map(BillItem::savings)
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(BillTotals {
        line_count: items.len(),
        total: Money::checked_sum(line_totals).ok_or_else(|| overflow("bill total"))?,
        savings: Money::checked_sum(savings).ok_or_else(|| overflow("savings"))?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(barcode: &str, price_cents: i64, stock_units: i64) -> Product {
        Product {
            id: 1,
            name: format!("Item {}", barcode),
            barcode: barcode.to_string(),
            price_cents,
            marked_price_cents: 0,
            quantity_milli: stock_units * Quantity::SCALE,
            unit_type: UnitType::Unit,
            unit_measure: "pieces".to_string(),
            category: None,
            supplier: None,
            description: None,
            reorder_level_milli: 10_000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn units(n: i64) -> Quantity {
        Quantity::from_units(n)
    }

    #[test]
    fn test_add_product_reserves_stock() {
        let mut bill = Bill::new();
        let outcome = bill.add_product(&product("A", 999, 10), units(2), None).unwrap();

        assert_eq!(outcome.line, 1);
        assert!(!outcome.merged);
        assert_eq!(outcome.stock_to_deduct, units(2));
        assert_eq!(bill.items()[0].reserved, units(2));
        assert_eq!(bill.totals().unwrap().total.cents(), 1_998);
    }

    #[test]
    fn test_same_barcode_merges_into_one_line() {
        let mut bill = Bill::new();
        bill.add_product(&product("A", 999, 10), units(2), None).unwrap();
        // Catalog stock already reflects the first add
        let outcome = bill.add_product(&product("A", 999, 8), units(3), None).unwrap();

        assert!(outcome.merged);
        assert_eq!(bill.line_count(), 1);
        assert_eq!(bill.items()[0].quantity, units(5));
        assert_eq!(bill.items()[0].reserved, units(5));
    }

    #[test]
    fn test_zero_stock_adds_with_warning_and_no_deduction() {
        let mut bill = Bill::new();
        let outcome = bill.add_product(&product("Z", 500, 0), units(3), None).unwrap();

        assert!(matches!(outcome.warning, Some(StockWarning::Untracked { .. })));
        assert!(outcome.stock_to_deduct.is_zero());
        assert_eq!(bill.items()[0].quantity, units(3));
        assert!(bill.items()[0].reservation().is_none());
    }

    #[test]
    fn test_insufficient_positive_stock_rejected_without_mutation() {
        let mut bill = Bill::new();
        let err = bill.add_product(&product("A", 999, 2), units(5), None).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { available, requested, .. }
                if available == units(2) && requested == units(5)
        ));
        assert!(bill.is_empty());
    }

    #[test]
    fn test_price_override_used_for_new_line() {
        let mut bill = Bill::new();
        bill.add_product(&product("A", 1_000, 10), units(1), Some(Money::from_cents(900)))
            .unwrap();
        assert_eq!(bill.totals().unwrap().total.cents(), 900);

        assert!(bill
            .add_product(&product("B", 1_000, 10), units(1), Some(Money::zero()))
            .is_err());
    }

    #[test]
    fn test_manual_item_defaults_quantity_and_never_merges() {
        let mut bill = Bill::new();
        bill.add_manual("Bag", Money::from_cents(2_000), None).unwrap();
        bill.add_manual("Bag", Money::from_cents(2_000), Some(Quantity::zero()))
            .unwrap();

        assert_eq!(bill.line_count(), 2);
        assert_eq!(bill.items()[1].quantity, units(1));
        assert_eq!(bill.items()[0].barcode, None);
        assert!(bill.totals().unwrap().savings.is_zero());

        assert!(bill.add_manual("", Money::from_cents(100), None).is_err());
        assert!(bill.add_manual("Free", Money::zero(), None).is_err());
    }

    #[test]
    fn test_remove_and_clear_return_reservations() {
        let mut bill = Bill::new();
        bill.add_product(&product("A", 100, 10), units(2), None).unwrap();
        bill.add_product(&product("B", 100, 10), units(1), None).unwrap();

        assert_eq!(bill.line(2).unwrap().barcode.as_deref(), Some("B"));
        assert!(matches!(bill.line(0), Err(CoreError::LineNotFound(0))));

        let removed = bill.remove_line(1).unwrap();
        assert_eq!(removed.reservation(), Some(("A", units(2))));
        assert!(matches!(bill.remove_line(5), Err(CoreError::LineNotFound(5))));

        let cleared = bill.clear();
        assert_eq!(cleared.len(), 1);
        assert!(bill.is_empty());
        assert!(bill.totals().unwrap().total.is_zero());
    }

    #[test]
    fn test_line_savings_and_mass_display() {
        let mut rice = product("R", 18_000, 50);
        rice.marked_price_cents = 20_000;
        rice.unit_type = UnitType::Mass;
        rice.unit_measure = "kg".to_string();

        let mut bill = Bill::new();
        bill.add_product(&rice, Quantity::from_milli(1_250), None).unwrap();

        let line = &bill.items()[0];
        assert_eq!(line.line_total().unwrap().cents(), 22_500);
        assert_eq!(line.savings().unwrap().cents(), 2_500);
        assert_eq!(line.display_quantity(), "1.25 kg");
    }

    #[test]
    fn test_total_is_sum_of_line_totals() {
        let mut bill = Bill::new();
        bill.add_product(&product("A", 1_000, 10), units(1), None).unwrap();
        bill.add_manual("Bag", Money::from_cents(250), Some(units(2)))
            .unwrap();

        let totals = bill.totals().unwrap();
        assert_eq!(totals.line_count, 2);
        assert_eq!(totals.total.cents(), 1_500);
    }

    #[test]
    fn test_oversized_line_reports_overflow() {
        let line = BillItem::manual("X", Money::from_cents(9_223_372_036_854_775_807), units(999));
        assert!(matches!(line.line_total(), Err(CoreError::AmountOverflow(_))));
        assert!(totals_for(&[line]).is_err());
    }

    #[test]
    fn test_price_above_limit_rejected_without_mutation() {
        let mut bill = Bill::new();
        let too_much = Money::from_cents(Money::MAX_AMOUNT.cents() + 1);

        assert!(bill.add_manual("Gold", too_much, None).is_err());
        assert!(bill
            .add_product(&product("A", 1_000, 10), units(1), Some(too_much))
            .is_err());
        assert!(bill.is_empty());

        // Largest price at the largest quantity still totals exactly
        bill.add_manual("Gold", Money::MAX_AMOUNT, Some(units(MAX_ITEM_QUANTITY)))
            .unwrap();
        assert_eq!(
            bill.totals().unwrap().total.cents(),
            Money::MAX_AMOUNT.cents() * MAX_ITEM_QUANTITY
        );
    }

    #[test]
    fn test_take_items_on_empty_bill() {
        let mut bill = Bill::new();
        assert!(matches!(bill.take_items(), Err(CoreError::EmptyBill)));
    }
}
