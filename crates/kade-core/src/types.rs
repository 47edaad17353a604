//! # Domain Types
//!
//! Persistent entities of the grocery counter.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  LoanCustomer   │   │ LoanTransaction │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (rowid)     │   │  id (rowid)     │   │  customer_code  │       │
//! │  │  barcode (uniq) │   │  customer_code  │   │  PURCHASE/REPAY │       │
//! │  │  price, marked  │   │  balance (auth) │   │  old → new bal  │       │
//! │  │  stock, reorder │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │TemporaryBalance │   │  BillSettings   │   (singleton row)            │
//! │  │  name, amount   │   │  store block,   │                              │
//! │  │  notes          │   │  currency, tax  │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: SQLite rowid, used for database relations and row edits
//! - Business ID: (barcode, customer_code) - what the operator types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::ledger::TransactionType;
use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so 250 bps = 2.5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Unit Type
// =============================================================================

/// How a product is measured at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    /// Weighed goods (rice, sugar, dhal).
    Mass,
    /// Counted goods (soap, bottles, packets).
    #[default]
    Unit,
}

impl UnitType {
    /// Measures the operator may pick for this unit type.
    pub const fn measures(&self) -> &'static [&'static str] {
        match self {
            UnitType::Mass => &["kg", "g", "lb", "oz"],
            UnitType::Unit => &["pieces", "bottles", "packets", "boxes", "cans", "units"],
        }
    }

    /// Measure used when none is given.
    pub const fn default_measure(&self) -> &'static str {
        match self {
            UnitType::Mass => "kg",
            UnitType::Unit => "pieces",
        }
    }

    /// Decimals shown for quantities on receipts.
    pub const fn display_decimals(&self) -> u32 {
        match self {
            UnitType::Mass => 2,
            UnitType::Unit => 0,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            UnitType::Mass => "mass",
            UnitType::Unit => "unit",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mass" => Ok(UnitType::Mass),
            "unit" => Ok(UnitType::Unit),
            _ => Err(ValidationError::NotAllowed {
                field: "unit_type".to_string(),
                allowed: vec!["mass".to_string(), "unit".to_string()],
            }),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,

    /// Display name shown to the cashier and on the receipt.
    pub name: String,

    /// Unique business key; what the scanner reads.
    pub barcode: String,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Reference price in cents, shown to advertise a discount. Zero if none.
    pub marked_price_cents: i64,

    /// Stock on hand in thousandths of a unit.
    pub quantity_milli: i64,

    pub unit_type: UnitType,

    /// Unit label (kg, pieces, bottles, ...).
    pub unit_measure: String,

    pub category: Option<String>,
    pub supplier: Option<String>,
    pub description: Option<String>,

    /// Stock at or below which the product is flagged for reorder.
    pub reorder_level_milli: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn marked_price(&self) -> Money {
        Money::from_cents(self.marked_price_cents)
    }

    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }

    #[inline]
    pub fn reorder_level(&self) -> Quantity {
        Quantity::from_milli(self.reorder_level_milli)
    }

    /// Stock has fallen to the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity_milli <= self.reorder_level_milli
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.quantity_milli <= 0
    }

    /// Per-unit discount against the marked price. Never negative.
    pub fn savings(&self) -> Money {
        if self.marked_price_cents > self.price_cents {
            self.marked_price() - self.price()
        } else {
            Money::zero()
        }
    }

    /// Discount as a percentage of the marked price; 0.0 with no marked price.
    pub fn savings_percentage(&self) -> f64 {
        self.savings().percentage_of(self.marked_price())
    }

    /// Value of stock on hand at selling price; `None` on overflow.
    pub fn stock_value(&self) -> Option<Money> {
        self.price().multiply_quantity(self.quantity())
    }
}

/// Fields the operator supplies when adding or editing a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub barcode: String,
    pub price: Money,
    pub marked_price: Money,
    pub quantity: Quantity,
    pub unit_type: UnitType,
    pub unit_measure: String,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub description: Option<String>,
    pub reorder_level: Quantity,
}

impl ProductDraft {
    /// Checks every field and normalises whitespace.
    ///
    /// An empty `unit_measure` becomes the unit type's default.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        use crate::validation::*;

        self.name = self.name.trim().to_string();
        self.barcode = self.barcode.trim().to_string();
        self.unit_measure = self.unit_measure.trim().to_string();
        if self.unit_measure.is_empty() {
            self.unit_measure = self.unit_type.default_measure().to_string();
        }
        self.category = non_empty(self.category);
        self.supplier = non_empty(self.supplier);
        self.description = non_empty(self.description);

        validate_product_name(&self.name)?;
        validate_barcode(&self.barcode)?;
        validate_selling_price(self.price)?;
        validate_marked_price(self.marked_price)?;
        validate_stock_level("quantity", self.quantity)?;
        validate_stock_level("reorder_level", self.reorder_level)?;
        validate_unit_measure(self.unit_type, &self.unit_measure)?;

        Ok(self)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Loan Customer
// =============================================================================

/// A customer allowed to buy on store credit.
///
/// `current_balance_cents` is the source of truth for what the customer
/// owes; it only moves through recorded transactions or the explicit
/// administrative override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LoanCustomer {
    pub id: i64,
    /// Externally assigned code, e.g. `C001`.
    pub customer_code: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Positive means the customer owes the store.
    pub current_balance_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanCustomer {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.current_balance_cents)
    }

    /// Customer currently owes something.
    pub fn is_active(&self) -> bool {
        self.current_balance_cents > 0
    }
}

/// Contact fields for creating or editing a loan customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub customer_code: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerDraft {
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        use crate::validation::{validate_customer_code, validate_person_name};

        self.customer_code = self.customer_code.trim().to_string();
        self.name = self.name.trim().to_string();
        self.phone = non_empty(self.phone);
        self.address = non_empty(self.address);

        validate_customer_code(&self.customer_code)?;
        validate_person_name(&self.name)?;
        Ok(self)
    }
}

// =============================================================================
// Loan Transaction
// =============================================================================

/// Audit record of one balance change.
///
/// Carries a snapshot of the balance before and after, so history stays
/// readable even after older rows are pruned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LoanTransaction {
    pub id: i64,
    pub customer_code: String,
    pub transaction_type: TransactionType,
    pub amount_cents: i64,
    pub old_balance_cents: i64,
    pub new_balance_cents: i64,
    /// Receipt number for purchases made at the counter.
    pub bill_number: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LoanTransaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn old_balance(&self) -> Money {
        Money::from_cents(self.old_balance_cents)
    }

    #[inline]
    pub fn new_balance(&self) -> Money {
        Money::from_cents(self.new_balance_cents)
    }
}

// =============================================================================
// Temporary Balance
// =============================================================================

/// A free-standing named balance, unrelated to the loan ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TemporaryBalance {
    pub id: i64,
    pub customer_name: String,
    pub balance_cents: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemporaryBalance {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

/// Operator input for a temporary balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporaryBalanceDraft {
    pub customer_name: String,
    pub balance: Money,
    pub notes: Option<String>,
}

impl TemporaryBalanceDraft {
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.customer_name = self.customer_name.trim().to_string();
        self.notes = non_empty(self.notes);

        crate::validation::validate_person_name(&self.customer_name)?;
        if !self.balance.is_positive() {
            return Err(ValidationError::must_be_positive("balance"));
        }
        crate::validation::validate_balance(self.balance)?;
        Ok(self)
    }
}

// =============================================================================
// Bill Settings
// =============================================================================

/// Store identity and receipt text, persisted as a single row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillSettings {
    pub grocery_name: String,
    pub store_address: String,
    pub phone_number1: String,
    pub phone_number2: String,
    pub cashier_name: String,
    pub logo_text: String,
    pub receipt_header: String,
    pub receipt_footer: String,
    pub currency_symbol: String,
    pub tax_rate_bps: u32,
}

impl Default for BillSettings {
    /// Values the store was first configured with.
    fn default() -> Self {
        BillSettings {
            grocery_name: "රසිංහ වෙළඳසැල".to_string(),
            store_address: "රන්දෙණිය, පිරිබැද්දර, කාගල්ල".to_string(),
            phone_number1: "0352263213".to_string(),
            phone_number2: "0763082845".to_string(),
            cashier_name: "Avindra Ranasinghe".to_string(),
            logo_text: "RS".to_string(),
            receipt_header: "Thank you for shopping with us!".to_string(),
            receipt_footer: "Please visit again!".to_string(),
            currency_symbol: "Rs.".to_string(),
            tax_rate_bps: 0,
        }
    }
}

impl BillSettings {
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Formats an amount with the store's currency symbol.
    ///
    /// ## Example
    /// ```rust
    /// use kade_core::{BillSettings, Money};
    ///
    /// let settings = BillSettings::default();
    /// assert_eq!(settings.format_money(Money::from_cents(75_000)), "Rs. 750.00");
    /// ```
    pub fn format_money(&self, amount: Money) -> String {
        if self.currency_symbol.is_empty() {
            amount.to_string()
        } else {
            format!("{} {}", self.currency_symbol, amount)
        }
    }

    /// `Tel: p1 / p2`, dropping whichever number is blank.
    pub fn phone_line(&self) -> Option<String> {
        let phones: Vec<&str> = [self.phone_number1.trim(), self.phone_number2.trim()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        if phones.is_empty() {
            None
        } else {
            Some(format!("Tel: {}", phones.join(" / ")))
        }
    }

    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.grocery_name = self.grocery_name.trim().to_string();
        self.currency_symbol = self.currency_symbol.trim().to_string();
        if self.grocery_name.is_empty() {
            return Err(ValidationError::required("grocery_name"));
        }
        crate::validation::validate_tax_rate_bps(self.tax_rate_bps)?;
        Ok(self)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity_milli: i64, price: i64, marked: i64) -> Product {
        Product {
            id: 1,
            name: "Sugar".to_string(),
            barcode: "4790001".to_string(),
            price_cents: price,
            marked_price_cents: marked,
            quantity_milli,
            unit_type: UnitType::Mass,
            unit_measure: "kg".to_string(),
            category: None,
            supplier: None,
            description: None,
            reorder_level_milli: 10_000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(2.5);
        assert_eq!(rate.bps(), 250);
        assert!((rate.percentage() - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_stock_flags() {
        assert!(product(10_000, 100, 0).is_low_stock());
        assert!(!product(10_001, 100, 0).is_low_stock());
        assert!(product(0, 100, 0).is_out_of_stock());
        assert!(product(-1_000, 100, 0).is_out_of_stock());
        assert!(!product(500, 100, 0).is_out_of_stock());
    }

    #[test]
    fn test_savings_guarded() {
        let discounted = product(1_000, 8_000, 10_000);
        assert_eq!(discounted.savings().cents(), 2_000);
        assert!((discounted.savings_percentage() - 20.0).abs() < 0.001);

        let no_marked = product(1_000, 8_000, 0);
        assert!(no_marked.savings().is_zero());
        assert_eq!(no_marked.savings_percentage(), 0.0);

        let marked_below_price = product(1_000, 8_000, 7_000);
        assert!(marked_below_price.savings().is_zero());
    }

    #[test]
    fn test_unit_type_parse_and_measures() {
        assert_eq!("MASS".parse::<UnitType>().unwrap(), UnitType::Mass);
        assert!("litre".parse::<UnitType>().is_err());
        assert_eq!(UnitType::Mass.default_measure(), "kg");
        assert!(UnitType::Unit.measures().contains(&"bottles"));
    }

    #[test]
    fn test_product_draft_defaults_measure() {
        let draft = ProductDraft {
            name: "  Red Rice ".to_string(),
            barcode: "RR-1".to_string(),
            price: Money::from_cents(18_000),
            marked_price: Money::zero(),
            quantity: Quantity::from_units(50),
            unit_type: UnitType::Mass,
            unit_measure: String::new(),
            category: Some("  ".to_string()),
            supplier: None,
            description: None,
            reorder_level: Quantity::from_units(10),
        }
        .validated()
        .unwrap();

        assert_eq!(draft.name, "Red Rice");
        assert_eq!(draft.unit_measure, "kg");
        assert_eq!(draft.category, None);
    }

    #[test]
    fn test_product_draft_rejects_zero_price() {
        let draft = ProductDraft {
            name: "Free".to_string(),
            barcode: "F1".to_string(),
            price: Money::zero(),
            marked_price: Money::zero(),
            quantity: Quantity::zero(),
            unit_type: UnitType::Unit,
            unit_measure: "pieces".to_string(),
            category: None,
            supplier: None,
            description: None,
            reorder_level: Quantity::from_units(10),
        };
        assert!(draft.validated().is_err());
    }

    #[test]
    fn test_settings_formatting() {
        let mut settings = BillSettings::default();
        assert_eq!(settings.format_money(Money::from_cents(1_050)), "Rs. 10.50");
        assert_eq!(
            settings.phone_line().as_deref(),
            Some("Tel: 0352263213 / 0763082845")
        );

        settings.phone_number2 = String::new();
        assert_eq!(settings.phone_line().as_deref(), Some("Tel: 0352263213"));

        settings.currency_symbol = String::new();
        assert_eq!(settings.format_money(Money::from_cents(1_050)), "10.50");
    }

    #[test]
    fn test_temporary_balance_requires_positive_amount() {
        let draft = TemporaryBalanceDraft {
            customer_name: "Nimal".to_string(),
            balance: Money::zero(),
            notes: None,
        };
        assert!(draft.validated().is_err());
    }
}
