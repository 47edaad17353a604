//! # Output
//!
//! Turns command results into text for the terminal. Every result is also
//! `Serialize`, so `--json` prints the same value as pretty JSON instead.

use std::fmt::Write as _;

use serde::Serialize;

use crate::commands::bill::{AddToBillResponse, BillResponse};
use crate::commands::loan::CustomerDetail;
use crate::commands::report::{BalanceReport, ExportedFile, InventoryReport, LoanReport};
use crate::commands::settlement::SettlementResponse;
use crate::error::ApiResult;
use kade_core::{BillSettings, LoanCustomer, LoanTransaction, Product, TemporaryBalance};
use kade_db::PruneReport;

/// Plain-text rendering of a command result.
pub trait Render: Serialize {
    fn render(&self) -> String;
}

/// Renders `value` as pretty JSON or as text.
pub fn format<T: Render>(value: &T, json: bool) -> ApiResult<String> {
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(value.render())
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

fn list<T>(items: &[T], empty: &str, line: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items.iter().map(line).collect::<Vec<_>>().join("\n")
}

// =============================================================================
// Products
// =============================================================================

fn product_line(p: &Product) -> String {
    let flag = if p.is_out_of_stock() {
        "  [OUT]"
    } else if p.is_low_stock() {
        "  [LOW]"
    } else {
        ""
    };
    format!(
        "#{:<4} {:<14} {:<28} {:>10}  {} {}{}",
        p.id,
        p.barcode,
        p.name,
        p.price(),
        p.quantity().format_fixed(p.unit_type.display_decimals()),
        p.unit_measure,
        flag
    )
}

impl Render for Product {
    fn render(&self) -> String {
        let mut out = product_line(self);
        if self.marked_price().is_positive() {
            let _ = write!(
                out,
                "\n      marked {} (save {:.1}%)",
                self.marked_price(),
                self.savings_percentage()
            );
        }
        let _ = write!(
            out,
            "\n      category {} | supplier {} | reorder at {}",
            or_dash(self.category.as_deref()),
            or_dash(self.supplier.as_deref()),
            self.reorder_level()
        );
        out
    }
}

impl Render for Vec<Product> {
    fn render(&self) -> String {
        list(self, "No products.", product_line)
    }
}

// =============================================================================
// Bill
// =============================================================================

impl Render for BillResponse {
    fn render(&self) -> String {
        if self.items.is_empty() {
            return "Bill is empty.".to_string();
        }

        let mut out = String::new();
        for (i, item) in self.items.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>3}. {:<26} {:>12} x {:>9} = {:>10}",
                i + 1,
                item.name,
                item.display_quantity(),
                item.unit_price,
                item.line_total().map(|t| t.to_string()).unwrap_or_default()
            );
        }
        let t = &self.totals;
        let _ = write!(out, "     TOTAL: {}  ({} lines)", t.total, t.line_count);
        if t.savings.is_positive() {
            let _ = write!(out, "\n     You save: {}", t.savings);
        }
        out
    }
}

impl Render for AddToBillResponse {
    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(warning) = &self.outcome.warning {
            let _ = writeln!(out, "{}", warning);
        }
        out.push_str(&self.bill.render());
        out
    }
}

impl Render for SettlementResponse {
    fn render(&self) -> String {
        self.rendered.clone()
    }
}

// =============================================================================
// Loans
// =============================================================================

fn customer_line(c: &LoanCustomer) -> String {
    format!(
        "{:<8} {:<26} {:<12} {:>12}",
        c.customer_code,
        c.name,
        or_dash(c.phone.as_deref()),
        c.balance()
    )
}

fn transaction_line(t: &LoanTransaction) -> String {
    format!(
        "{}  {:<9} {:>10}  {} -> {}  {}",
        t.created_at.format("%Y-%m-%d %H:%M"),
        t.transaction_type,
        t.amount(),
        t.old_balance(),
        t.new_balance(),
        or_dash(t.note.as_deref())
    )
}

impl Render for LoanCustomer {
    fn render(&self) -> String {
        format!(
            "{} - {}\n  Phone: {}\n  Address: {}\n  Balance: {}",
            self.customer_code,
            self.name,
            or_dash(self.phone.as_deref()),
            or_dash(self.address.as_deref()),
            self.balance()
        )
    }
}

impl Render for Vec<LoanCustomer> {
    fn render(&self) -> String {
        list(self, "No loan customers.", customer_line)
    }
}

impl Render for LoanTransaction {
    fn render(&self) -> String {
        transaction_line(self)
    }
}

impl Render for CustomerDetail {
    fn render(&self) -> String {
        format!(
            "{}\n\nRecent transactions:\n{}",
            self.customer.render(),
            list(&self.transactions, "  (none)", |t| format!("  {}", transaction_line(t)))
        )
    }
}

impl Render for PruneReport {
    fn render(&self) -> String {
        format!(
            "Pruned {} transactions across {} customers.",
            self.deleted, self.customers
        )
    }
}

// =============================================================================
// Temporary Balances
// =============================================================================

fn balance_line(b: &TemporaryBalance) -> String {
    format!(
        "#{:<4} {:<26} {:>12}  {}",
        b.id,
        b.customer_name,
        b.balance(),
        or_dash(b.notes.as_deref())
    )
}

impl Render for TemporaryBalance {
    fn render(&self) -> String {
        balance_line(self)
    }
}

impl Render for Vec<TemporaryBalance> {
    fn render(&self) -> String {
        list(self, "No temporary balances.", balance_line)
    }
}

// =============================================================================
// Settings
// =============================================================================

impl Render for BillSettings {
    fn render(&self) -> String {
        format!(
            "Grocery name:    {}\n\
             Store address:   {}\n\
             Phone 1:         {}\n\
             Phone 2:         {}\n\
             Cashier:         {}\n\
             Logo text:       {}\n\
             Receipt header:  {}\n\
             Receipt footer:  {}\n\
             Currency symbol: {}\n\
             Tax rate:        {}%",
            self.grocery_name,
            self.store_address,
            self.phone_number1,
            self.phone_number2,
            self.cashier_name,
            self.logo_text,
            self.receipt_header,
            self.receipt_footer,
            self.currency_symbol,
            self.tax_rate().percentage()
        )
    }
}

// =============================================================================
// Reports
// =============================================================================

impl Render for LoanReport {
    fn render(&self) -> String {
        format!(
            "{}\n\n{}",
            self.summary.describe(),
            list(&self.rows, "No loan customers.", |r| format!(
                "{:<8} {:<26} {:<12} {:>12}  {}",
                r.customer_code, r.name, r.phone, r.current_balance, r.address
            ))
        )
    }
}

impl Render for InventoryReport {
    fn render(&self) -> String {
        format!(
            "{}\n\n{}",
            self.summary.describe(),
            list(&self.rows, "No products.", |r| format!(
                "{:<28} {:<14} {:>10} {:>14}  {}",
                r.name, r.barcode, r.price, r.quantity, r.status
            ))
        )
    }
}

impl Render for BalanceReport {
    fn render(&self) -> String {
        format!(
            "{}\n\n{}",
            self.summary.describe(),
            list(&self.rows, "No temporary balances.", |r| format!(
                "#{:<4} {:<26} {:>12}  {}",
                r.id, r.customer_name, r.balance, r.notes
            ))
        )
    }
}

impl Render for ExportedFile {
    fn render(&self) -> String {
        format!("{}\n  {}", self.path.display(), self.summary)
    }
}

impl Render for Vec<ExportedFile> {
    fn render(&self) -> String {
        list(self, "Nothing exported.", ExportedFile::render)
    }
}

/// Acknowledgement for commands that return nothing.
#[derive(Debug, Serialize)]
pub struct Done {
    pub message: String,
}

impl Render for Done {
    fn render(&self) -> String {
        self.message.clone()
    }
}
