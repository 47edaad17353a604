//! # Command Line Interface
//!
//! Argument definitions for the `kade` binary.
//!
//! ```text
//! kade [--db PATH] [--json] [-v] <COMMAND>
//!
//!   product   add | update | delete | list | search | low-stock | restock | find | suggest
//!   loan      add | update | delete | list | search | show | charge | repay | override | prune
//!   balance   add | update | delete | list | search
//!   settings  show | set | reset
//!   report    loans | inventory | balances | schema | all
//!   counter   interactive billing session
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::commands::product::ProductPatch;
use crate::commands::settings::SettingsPatch;
use kade_core::{Money, ProductDraft, Quantity, UnitType, DEFAULT_REORDER_LEVEL};

#[derive(Debug, Parser)]
#[command(name = "kade", version, about = "Kade POS counter terminal")]
pub struct Cli {
    /// SQLite database file (overrides KADE_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log more (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Catalog maintenance and lookup
    #[command(subcommand)]
    Product(ProductCommand),

    /// Loan customers and their ledger
    #[command(subcommand)]
    Loan(LoanCommand),

    /// Temporary balances
    #[command(subcommand)]
    Balance(BalanceCommand),

    /// Store and receipt settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Summaries and file exports
    Report(ReportArgs),

    /// Interactive billing session
    Counter(CounterArgs),
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// Add a product
    Add(ProductFields),

    /// Change fields of a product
    Update {
        id: i64,
        #[command(flatten)]
        fields: ProductPatchFields,
    },

    /// Delete a product
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// List every product
    List,

    /// Products whose name, barcode or category contains QUERY
    Search { query: String },

    /// Products at or below their reorder level
    LowStock,

    /// Add delivered stock
    Restock { barcode: String, quantity: Quantity },

    /// Resolve QUERY to one product (barcode, exact name, partial name)
    Find { query: String },

    /// Ranked name suggestions
    Suggest {
        query: String,
        #[arg(long)]
        limit: Option<i64>,
    },
}

#[derive(Debug, Args)]
pub struct ProductFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub barcode: String,
    /// Selling price
    #[arg(long)]
    pub price: Money,
    /// Reference price shown for savings (0 for none)
    #[arg(long, default_value = "0")]
    pub marked_price: Money,
    /// Stock on hand
    #[arg(long, default_value = "0")]
    pub quantity: Quantity,
    #[arg(long, value_enum, default_value_t = UnitKind::Unit)]
    pub unit_type: UnitKind,
    /// kg, g, lb, oz for mass; pieces, bottles, packets, boxes, cans, units otherwise
    #[arg(long)]
    pub unit_measure: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub supplier: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub reorder_level: Option<Quantity>,
}

impl From<ProductFields> for ProductDraft {
    fn from(f: ProductFields) -> Self {
        ProductDraft {
            name: f.name,
            barcode: f.barcode,
            price: f.price,
            marked_price: f.marked_price,
            quantity: f.quantity,
            unit_type: f.unit_type.into(),
            unit_measure: f.unit_measure.unwrap_or_default(),
            category: f.category,
            supplier: f.supplier,
            description: f.description,
            reorder_level: f
                .reorder_level
                .unwrap_or_else(|| Quantity::from_units(DEFAULT_REORDER_LEVEL)),
        }
    }
}

#[derive(Debug, Args)]
pub struct ProductPatchFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub barcode: Option<String>,
    #[arg(long)]
    pub price: Option<Money>,
    #[arg(long)]
    pub marked_price: Option<Money>,
    #[arg(long)]
    pub quantity: Option<Quantity>,
    #[arg(long, value_enum)]
    pub unit_type: Option<UnitKind>,
    #[arg(long)]
    pub unit_measure: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub supplier: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub reorder_level: Option<Quantity>,
}

impl From<ProductPatchFields> for ProductPatch {
    fn from(f: ProductPatchFields) -> Self {
        ProductPatch {
            name: f.name,
            barcode: f.barcode,
            price: f.price,
            marked_price: f.marked_price,
            quantity: f.quantity,
            unit_type: f.unit_type.map(UnitType::from),
            unit_measure: f.unit_measure,
            category: f.category,
            supplier: f.supplier,
            description: f.description,
            reorder_level: f.reorder_level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitKind {
    /// Weighed goods
    Mass,
    /// Counted goods
    Unit,
}

impl From<UnitKind> for UnitType {
    fn from(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Mass => UnitType::Mass,
            UnitKind::Unit => UnitType::Unit,
        }
    }
}

// =============================================================================
// Loans
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum LoanCommand {
    /// Add a loan customer (balance starts at zero)
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },

    /// Change a customer's code, name or contact details
    Update {
        code: String,
        #[arg(long)]
        new_code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },

    /// Delete a customer and their history
    Delete {
        code: String,
        #[arg(long)]
        yes: bool,
    },

    /// List every customer
    List,

    /// Customers whose code, name or phone contains QUERY
    Search { query: String },

    /// A customer and their recent transactions
    Show {
        code: String,
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Add an amount to a customer's balance
    Charge {
        code: String,
        amount: Money,
        #[arg(long)]
        note: Option<String>,
    },

    /// Record a repayment
    Repay {
        code: String,
        amount: Money,
        #[arg(long)]
        note: Option<String>,
    },

    /// Set a balance directly, without a history row
    Override {
        code: String,
        balance: Money,
        #[arg(long)]
        yes: bool,
    },

    /// Trim every customer's history to the newest transactions
    Prune,
}

// =============================================================================
// Temporary Balances
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum BalanceCommand {
    /// Add a temporary balance
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: Money,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Change a temporary balance
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        amount: Option<Money>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a temporary balance
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },

    /// List every balance, newest first
    List,

    /// Balances whose name or notes contain QUERY
    Search { query: String },
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show the current settings
    Show,

    /// Change one or more settings
    Set(SettingsFields),

    /// Restore the defaults
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Args)]
pub struct SettingsFields {
    #[arg(long)]
    pub grocery_name: Option<String>,
    #[arg(long)]
    pub store_address: Option<String>,
    #[arg(long)]
    pub phone1: Option<String>,
    #[arg(long)]
    pub phone2: Option<String>,
    #[arg(long)]
    pub cashier_name: Option<String>,
    #[arg(long)]
    pub logo_text: Option<String>,
    #[arg(long)]
    pub receipt_header: Option<String>,
    #[arg(long)]
    pub receipt_footer: Option<String>,
    #[arg(long)]
    pub currency_symbol: Option<String>,
    /// Tax rate as a percentage, e.g. 2.5
    #[arg(long)]
    pub tax_rate: Option<f64>,
}

impl From<SettingsFields> for SettingsPatch {
    fn from(f: SettingsFields) -> Self {
        SettingsPatch {
            grocery_name: f.grocery_name,
            store_address: f.store_address,
            phone_number1: f.phone1,
            phone_number2: f.phone2,
            cashier_name: f.cashier_name,
            logo_text: f.logo_text,
            receipt_header: f.receipt_header,
            receipt_footer: f.receipt_footer,
            currency_symbol: f.currency_symbol,
            tax_rate_bps: f
                .tax_rate
                .map(|pct| kade_core::TaxRate::from_percentage(pct.max(0.0)).bps()),
        }
    }
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[arg(value_enum)]
    pub kind: ReportKind,

    /// Write files instead of printing (schema and all always write)
    #[arg(long)]
    pub export: bool,

    /// Export directory (overrides KADE_REPORTS_DIR)
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Loans,
    Inventory,
    Balances,
    Schema,
    All,
}

// =============================================================================
// Counter
// =============================================================================

#[derive(Debug, Args)]
pub struct CounterArgs {
    /// Receipt width in characters (overrides KADE_RECEIPT_WIDTH)
    #[arg(long)]
    pub width: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_product_add() {
        let cli = Cli::try_parse_from([
            "kade", "--json", "product", "add", "--name", "Samba Rice", "--barcode", "R1",
            "--price", "260", "--quantity", "25.5", "--unit-type", "mass",
        ])
        .unwrap();

        assert!(cli.json);
        let Command::Product(ProductCommand::Add(fields)) = cli.command else {
            panic!("expected product add");
        };
        let draft = ProductDraft::from(fields);
        assert_eq!(draft.price, Money::from_cents(26_000));
        assert_eq!(draft.quantity, Quantity::from_milli(25_500));
        assert_eq!(draft.unit_type, UnitType::Mass);
        assert_eq!(draft.reorder_level, Quantity::from_units(DEFAULT_REORDER_LEVEL));
    }

    #[test]
    fn test_parse_rejects_bad_amount() {
        assert!(Cli::try_parse_from(["kade", "loan", "repay", "C001", "12.345"]).is_err());
    }

    #[test]
    fn test_settings_tax_rate_in_percent() {
        let cli = Cli::try_parse_from(["kade", "settings", "set", "--tax-rate", "2.5"]).unwrap();
        let Command::Settings(SettingsCommand::Set(fields)) = cli.command else {
            panic!("expected settings set");
        };
        assert_eq!(SettingsPatch::from(fields).tax_rate_bps, Some(250));
    }
}
