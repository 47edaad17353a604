//! # Reports
//!
//! Summaries and tabular rows for the three store reports. Rows are plain
//! `Serialize` structs, so any tabular writer can emit them; the CLI writes
//! them as CSV.
//!
//! | Report               | Ordering             | Summary                                 |
//! |----------------------|----------------------|-----------------------------------------|
//! | Loan customers       | balance, descending  | customers, active loans, outstanding    |
//! | Temporary balances   | balance, descending  | records, total amount                   |
//! | Product details      | name, ascending      | products, stock value, low/out of stock |

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{LoanCustomer, Product, TemporaryBalance};

// =============================================================================
// Stock Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn of(product: &Product) -> Self {
        if product.is_out_of_stock() {
            StockStatus::OutOfStock
        } else if product.is_low_stock() {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }
}

// =============================================================================
// Loan Customers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub total_customers: usize,
    pub active_loans: usize,
    pub total_outstanding: Money,
}

impl LoanSummary {
    pub fn describe(&self) -> String {
        format!(
            "Total Customers: {} | Active Loans: {} | Total Outstanding: {}",
            self.total_customers, self.active_loans, self.total_outstanding
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoanRow {
    #[serde(rename = "Customer ID")]
    pub customer_code: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Current Balance")]
    pub current_balance: String,
}

pub fn loan_summary(customers: &[LoanCustomer]) -> LoanSummary {
    LoanSummary {
        total_customers: customers.len(),
        active_loans: customers.iter().filter(|c| c.is_active()).count(),
        total_outstanding: customers.iter().map(LoanCustomer::balance).sum(),
    }
}

/// Rows ordered by balance, largest debt first.
pub fn loan_rows(customers: &[LoanCustomer]) -> Vec<LoanRow> {
    let mut sorted: Vec<&LoanCustomer> = customers.iter().collect();
    sorted.sort_by(|a, b| b.current_balance_cents.cmp(&a.current_balance_cents));

    sorted
        .into_iter()
        .map(|c| LoanRow {
            customer_code: c.customer_code.clone(),
            name: c.name.clone(),
            phone: c.phone.clone().unwrap_or_default(),
            address: c.address.clone().unwrap_or_default(),
            current_balance: c.balance().to_string(),
        })
        .collect()
}

// =============================================================================
// Temporary Balances
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub total_records: usize,
    pub total_amount: Money,
}

impl BalanceSummary {
    pub fn describe(&self) -> String {
        format!(
            "Total Records: {} | Total Amount: {}",
            self.total_records, self.total_amount
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceRow {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Customer Name")]
    pub customer_name: String,
    #[serde(rename = "Balance")]
    pub balance: String,
    #[serde(rename = "Created")]
    pub created: String,
    #[serde(rename = "Notes")]
    pub notes: String,
}

pub fn balance_summary(balances: &[TemporaryBalance]) -> BalanceSummary {
    BalanceSummary {
        total_records: balances.len(),
        total_amount: balances.iter().map(TemporaryBalance::balance).sum(),
    }
}

pub fn balance_rows(balances: &[TemporaryBalance]) -> Vec<BalanceRow> {
    let mut sorted: Vec<&TemporaryBalance> = balances.iter().collect();
    sorted.sort_by(|a, b| b.balance_cents.cmp(&a.balance_cents));

    sorted
        .into_iter()
        .map(|b| BalanceRow {
            id: b.id,
            customer_name: b.customer_name.clone(),
            balance: b.balance().to_string(),
            created: b.created_at.format("%d/%m/%Y").to_string(),
            notes: b.notes.clone().unwrap_or_default(),
        })
        .collect()
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_products: usize,
    /// Stock on hand valued at selling price.
    pub total_value: Money,
    pub low_stock: usize,
    pub out_of_stock: usize,
}

impl InventorySummary {
    pub fn describe(&self) -> String {
        format!(
            "Total Products: {} | Total Value: {} | Low Stock: {} | Out of Stock: {}",
            self.total_products, self.total_value, self.low_stock, self.out_of_stock
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Barcode")]
    pub barcode: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Marked Price")]
    pub marked_price: String,
    #[serde(rename = "Quantity")]
    pub quantity: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Supplier")]
    pub supplier: String,
    #[serde(rename = "Status")]
    pub status: String,
}

/// Low-stock counts include out-of-stock products, matching
/// `Product::is_low_stock`.
pub fn inventory_summary(products: &[Product]) -> CoreResult<InventorySummary> {
    let total_value = products
        .iter()
        .map(Product::stock_value)
        .collect::<Option<Vec<_>>>()
        .and_then(Money::checked_sum)
        .ok_or_else(|| CoreError::AmountOverflow("inventory value".to_string()))?;

    Ok(InventorySummary {
        total_products: products.len(),
        total_value,
        low_stock: products.iter().filter(|p| p.is_low_stock()).count(),
        out_of_stock: products.iter().filter(|p| p.is_out_of_stock()).count(),
    })
}

pub fn product_rows(products: &[Product]) -> Vec<ProductRow> {
    let mut sorted: Vec<&Product> = products.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    sorted
        .into_iter()
        .map(|p| ProductRow {
            name: p.name.clone(),
            barcode: p.barcode.clone(),
            price: p.price().to_string(),
            marked_price: if p.marked_price().is_positive() {
                p.marked_price().to_string()
            } else {
                String::new()
            },
            quantity: format!("{} {}", p.quantity(), p.unit_measure),
            category: p.category.clone().unwrap_or_default(),
            supplier: p.supplier.clone().unwrap_or_default(),
            status: StockStatus::of(p).label().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnitType;
    use chrono::Utc;

    fn customer(code: &str, balance_cents: i64) -> LoanCustomer {
        LoanCustomer {
            id: 0,
            customer_code: code.to_string(),
            name: format!("Customer {}", code),
            phone: None,
            address: None,
            current_balance_cents: balance_cents,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(name: &str, price_cents: i64, quantity_milli: i64) -> Product {
        Product {
            id: 0,
            name: name.to_string(),
            barcode: name.to_uppercase(),
            price_cents,
            marked_price_cents: 0,
            quantity_milli,
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

    #[test]
    fn test_loan_report() {
        let customers = vec![customer("C1", 0), customer("C2", 75_000), customer("C3", 1_000)];

        let summary = loan_summary(&customers);
        assert_eq!(summary.total_customers, 3);
        assert_eq!(summary.active_loans, 2);
        assert_eq!(summary.total_outstanding.cents(), 76_000);
        assert_eq!(
            summary.describe(),
            "Total Customers: 3 | Active Loans: 2 | Total Outstanding: 760.00"
        );

        let codes: Vec<String> = loan_rows(&customers).into_iter().map(|r| r.customer_code).collect();
        assert_eq!(codes, vec!["C2", "C3", "C1"]);
    }

    #[test]
    fn test_inventory_report() {
        let products = vec![
            product("Soap", 12_000, 20_000),
            product("Bread", 15_000, 5_000),
            product("Candles", 5_000, 0),
        ];

        let summary = inventory_summary(&products).unwrap();
        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.total_value.cents(), 240_000 + 75_000);
        assert_eq!(summary.low_stock, 2);
        assert_eq!(summary.out_of_stock, 1);

        let rows = product_rows(&products);
        assert_eq!(rows[0].name, "Bread");
        assert_eq!(rows[0].status, "Low Stock");
        assert_eq!(rows[1].status, "Out of Stock");
        assert_eq!(rows[2].quantity, "20 pieces");
        assert_eq!(rows[2].marked_price, "");
    }

    #[test]
    fn test_balance_report() {
        let now = Utc::now();
        let balances = vec![
            TemporaryBalance {
                id: 1,
                customer_name: "Kamal".to_string(),
                balance_cents: 2_000,
                notes: None,
                created_at: now,
                updated_at: now,
            },
            TemporaryBalance {
                id: 2,
                customer_name: "Nimal".to_string(),
                balance_cents: 5_000,
                notes: Some("bottle deposit".to_string()),
                created_at: now,
                updated_at: now,
            },
        ];

        let summary = balance_summary(&balances);
        assert_eq!(summary.describe(), "Total Records: 2 | Total Amount: 70.00");
        assert_eq!(balance_rows(&balances)[0].customer_name, "Nimal");
    }
}
