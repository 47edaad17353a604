//! # Receipt
//!
//! The printed record of a settled bill, rendered as fixed-width text for a
//! receipt printer or the terminal.
//!
//! ## Layout
//! ```text
//! ┌────────────────────────────────────────┐
//! │                  RS                    │  logo text
//! │           <grocery name>               │  store block from BillSettings
//! │           <store address>              │
//! │      Tel: 0352263213 / 0763082845      │
//! │    Thank you for shopping with us!     │  receipt header
//! │────────────────────────────────────────│
//! │ Bill No: 241128143052                  │  yyMMddHHmmss
//! │ Date: 2024-11-28 02:30 PM              │
//! │ Cashier: Avindra Ranasinghe            │
//! │────────────────────────────────────────│
//! │ Samba Rice                             │
//! │   1.25 kg x 180.00              225.00 │  one block per line
//! │────────────────────────────────────────│
//! │ TOTAL                       Rs. 225.00 │
//! │ PAID: Rs. 500.00                       │  or PAID AS LOAN + balances
//! │ Balance                     Rs. 275.00 │
//! │ You Saved: Rs. 25.00                   │
//! │────────────────────────────────────────│
//! │          Please visit again!           │
//! └────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::bill::{totals_for, BillItem, BillTotals};
use crate::error::CoreResult;
use crate::money::Money;
use crate::settlement::Payment;
use crate::types::BillSettings;

/// Default paper width in characters (58mm thermal roll).
pub const DEFAULT_RECEIPT_WIDTH: usize = 40;

/// Narrowest width the layout still fits in.
pub const MIN_RECEIPT_WIDTH: usize = 24;

/// Receipt number for a bill settled at `at` (local time): `yyMMddHHmmss`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use kade_core::receipt::bill_number;
///
/// let at = NaiveDate::from_ymd_opt(2024, 11, 28).unwrap().and_hms_opt(14, 30, 52).unwrap();
/// assert_eq!(bill_number(at), "241128143052");
/// ```
pub fn bill_number(at: NaiveDateTime) -> String {
    at.format("%y%m%d%H%M%S").to_string()
}

/// A settled bill, ready to print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub bill_number: String,
    pub issued_at: NaiveDateTime,
    pub items: Vec<BillItem>,
    pub totals: BillTotals,
    pub payment: Payment,
}

impl Receipt {
    pub fn new(items: Vec<BillItem>, payment: Payment, issued_at: NaiveDateTime) -> CoreResult<Self> {
        let totals = totals_for(&items)?;
        Ok(Receipt {
            bill_number: bill_number(issued_at),
            issued_at,
            items,
            totals,
            payment,
        })
    }

    /// Cash paid minus total; zero for loan payments.
    pub fn balance_amount(&self) -> Money {
        match &self.payment {
            Payment::Cash { tendered, .. } => *tendered - self.totals.total,
            Payment::Loan { .. } => Money::zero(),
        }
    }

    /// Renders the receipt as plain text, `width` characters wide.
    pub fn render(&self, settings: &BillSettings, width: usize) -> String {
        let width = width.max(MIN_RECEIPT_WIDTH);
        let rule = "-".repeat(width);
        let money = |amount: Money| settings.format_money(amount);
        let mut out: Vec<String> = Vec::new();

        // Store block
        for text in [
            settings.logo_text.as_str(),
            settings.grocery_name.as_str(),
            settings.store_address.as_str(),
        ] {
            if !text.trim().is_empty() {
                out.push(center(text.trim(), width));
            }
        }
        if let Some(phones) = settings.phone_line() {
            out.push(center(&phones, width));
        }
        if !settings.receipt_header.trim().is_empty() {
            out.push(center(settings.receipt_header.trim(), width));
        }
        out.push(rule.clone());

        out.push(format!("Bill No: {}", self.bill_number));
        out.push(format!("Date: {}", self.issued_at.format("%Y-%m-%d %I:%M %p")));
        if !settings.cashier_name.trim().is_empty() {
            out.push(format!("Cashier: {}", settings.cashier_name.trim()));
        }
        out.push(rule.clone());

        // Lines
        for item in &self.items {
            out.push(item.name.clone());
            let detail = format!("  {} x {}", item.display_quantity(), item.unit_price);
            let line_total = item.line_total().map(|t| t.to_string()).unwrap_or_default();
            out.push(columns(&detail, &line_total, width));
        }
        out.push(rule.clone());

        // Totals
        out.push(columns("TOTAL", &money(self.totals.total), width));

        match &self.payment {
            Payment::Cash { tendered, .. } => {
                out.push(format!("PAID: {}", money(*tendered)));
                out.push(columns("Balance", &money(self.balance_amount()), width));
            }
            Payment::Loan {
                customer_code,
                customer_name,
                old_balance,
                new_balance,
            } => {
                out.push("PAID AS LOAN".to_string());
                out.push(format!("Customer: {} (ID: {})", customer_name, customer_code));
                out.push(format!(
                    "Old Balance: {} | New Balance: {}",
                    money(*old_balance),
                    money(*new_balance)
                ));
            }
        }

        if self.totals.savings.is_positive() {
            out.push(format!("You Saved: {}", money(self.totals.savings)));
        }

        out.push(rule);
        if !settings.receipt_footer.trim().is_empty() {
            out.push(center(settings.receipt_footer.trim(), width));
        }

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let pad = (width - len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// Left text and right-aligned amount on one line, wrapping the amount to
/// its own line when both don't fit.
fn columns(left: &str, right: &str, width: usize) -> String {
    let used = left.chars().count() + right.chars().count();
    if used + 1 > width {
        return format!("{}\n{:>width$}", left, right, width = width);
    }
    format!("{}{}{}", left, " ".repeat(width - used), right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;
    use crate::types::UnitType;
    use chrono::NaiveDate;

    fn issued_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 28)
            .unwrap()
            .and_hms_opt(14, 30, 52)
            .unwrap()
    }

    fn rice() -> BillItem {
        BillItem {
            name: "Samba Rice".to_string(),
            barcode: Some("RICE-1".to_string()),
            unit_price: Money::from_cents(18_000),
            marked_price: Money::from_cents(20_000),
            quantity: Quantity::from_milli(1_250),
            unit_type: UnitType::Mass,
            unit_measure: "kg".to_string(),
            reserved: Quantity::from_milli(1_250),
        }
    }

    #[test]
    fn test_cash_receipt() {
        let settings = BillSettings::default();
        let payment = Payment::Cash {
            tendered: Money::from_cents(50_000),
            change: Money::from_cents(27_500),
        };
        let receipt = Receipt::new(vec![rice()], payment, issued_at()).unwrap();

        assert_eq!(receipt.bill_number, "241128143052");
        assert_eq!(receipt.balance_amount().cents(), 27_500);

        let text = receipt.render(&settings, DEFAULT_RECEIPT_WIDTH);
        assert!(text.contains("Bill No: 241128143052"));
        assert!(text.contains("Date: 2024-11-28 02:30 PM"));
        assert!(text.contains("1.25 kg x 180.00"));
        assert!(text.contains("PAID: Rs. 500.00"));
        assert!(text.contains("Rs. 275.00"));
        assert!(text.contains("You Saved: Rs. 25.00"));
        assert!(text.contains("Tel: 0352263213 / 0763082845"));
        assert!(!text.contains("PAID AS LOAN"));
    }

    #[test]
    fn test_loan_receipt() {
        let settings = BillSettings::default();
        let payment = Payment::Loan {
            customer_code: "C001".to_string(),
            customer_name: "Sunil".to_string(),
            old_balance: Money::from_cents(50_000),
            new_balance: Money::from_cents(72_500),
        };
        let receipt = Receipt::new(vec![rice()], payment, issued_at()).unwrap();
        let text = receipt.render(&settings, DEFAULT_RECEIPT_WIDTH);

        assert!(text.contains("PAID AS LOAN"));
        assert!(text.contains("Customer: Sunil (ID: C001)"));
        assert!(text.contains("Old Balance: Rs. 500.00 | New Balance: Rs. 725.00"));
        assert!(!text.contains("PAID: "));
        assert!(receipt.balance_amount().is_zero());
    }

    #[test]
    fn test_unit_quantities_have_no_decimals_and_tax_rate_is_not_charged() {
        let mut settings = BillSettings::default();
        settings.tax_rate_bps = 1_000;

        let soap = BillItem::manual("Soap", Money::from_cents(12_000), Quantity::from_units(2));
        let payment = Payment::Cash {
            tendered: Money::from_cents(30_000),
            change: Money::from_cents(6_000),
        };
        let receipt = Receipt::new(vec![soap], payment, issued_at()).unwrap();
        assert_eq!(receipt.totals.total.cents(), 24_000);
        assert_eq!(receipt.balance_amount().cents(), 6_000);

        let text = receipt.render(&settings, DEFAULT_RECEIPT_WIDTH);
        assert!(text.contains("2 pieces x 120.00"));
        assert!(!text.contains("Tax"));
        assert!(!text.contains("You Saved"));
    }

    #[test]
    fn test_layout_helpers() {
        assert_eq!(center("ab", 6), "  ab");
        assert_eq!(columns("TOTAL", "9.00", 12), "TOTAL   9.00");
        assert_eq!(columns("A long label", "9.00", 12), "A long label\n        9.00");
    }
}
