//! # Kade CLI Library
//!
//! Everything behind the `kade` binary: argument parsing, startup and
//! dispatch onto the command layer.
//!
//! ## Module Organization
//! ```text
//! kade_cli/
//! ├── lib.rs          ◄─── You are here (startup & dispatch)
//! ├── cli.rs          ◄─── clap argument tree
//! ├── counter.rs      ◄─── Interactive billing session
//! ├── output.rs       ◄─── Text / JSON rendering of results
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── bill.rs     ◄─── Open bill behind a mutex
//! │   └── config.rs   ◄─── Paths and receipt width
//! ├── commands/
//! │   ├── product.rs  ◄─── Catalog commands
//! │   ├── bill.rs     ◄─── Bill manipulation
//! │   ├── settlement.rs ◄─ Cash / loan payment
//! │   ├── loan.rs     ◄─── Loan customers and ledger
//! │   ├── balance.rs  ◄─── Temporary balances
//! │   ├── settings.rs ◄─── Bill settings
//! │   └── report.rs   ◄─── Reports and exports
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State Management
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Types                                          │
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐   │
//! │  │    DbState       │ │    BillState     │ │    ConfigState       │   │
//! │  │                  │ │                  │ │                      │   │
//! │  │  • Database pool │ │  • Open bill     │ │  • Database path     │   │
//! │  │  • Repositories  │ │  • Bill lines    │ │  • Reports directory │   │
//! │  │                  │ │  • Totals        │ │  • Receipt width     │   │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘   │
//! │                                                                         │
//! │  Each command takes only the state it needs. BillState lives for one   │
//! │  counter session; one-shot commands never open a bill.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod counter;
pub mod error;
pub mod output;
pub mod state;

use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{
    BalanceCommand, Cli, Command, LoanCommand, ProductCommand, ReportKind,
    SettingsCommand,
};
use commands::{balance, loan, product, report, settings};
use counter::Counter;
use error::{ApiError, ApiResult};
use kade_core::{CustomerDraft, TemporaryBalanceDraft};
use kade_db::{Database, DbConfig};
use output::{Done, Render};
use state::{ConfigState, DbState};

/// Runs the `kade` command line.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Parse arguments ──────────────────────────────────────────────────► │
/// │                                                                         │
/// │  2. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr             │
/// │     • Default: WARN (kade crates INFO), RUST_LOG overrides              │
/// │                                                                         │
/// │  3. Resolve Configuration ────────────────────────────────────────────► │
/// │     • flags > KADE_* environment > platform data directory             │
/// │                                                                         │
/// │  4. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode                                              │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  5. Dispatch the command, print the result ───────────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                match serde_json::to_string_pretty(&ErrorBody { error: &e }) {
                    Ok(text) => eprintln!("{}", text),
                    Err(_) => eprintln!("{}", e),
                }
            } else {
                eprintln!("Error: {}", e.message);
            }
            e.exit_code()
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kade=trace` - Show trace for kade crates only
/// - `-v` / `-vv` - debug / trace for kade crates
/// - Default: WARN, INFO for kade crates
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn,kade=info,sqlx=warn",
        1 => "warn,kade=debug,sqlx=warn",
        _ => "info,kade=trace,sqlx=info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn execute(cli: Cli) -> ApiResult<()> {
    let mut config = ConfigState::from_env()?;
    if let Some(path) = cli.db {
        config = config.with_db_path(path);
    }
    config.ensure_data_dir()?;
    debug!(?config, "Configuration resolved");

    let db = Database::new(DbConfig::new(config.db_path.clone())).await?;
    info!(db_path = %config.db_path.display(), "Database connected and migrations applied");
    let db = DbState::new(db);

    let out = Printer { json: cli.json };
    match cli.command {
        Command::Product(cmd) => run_product(&db, cmd, out).await,
        Command::Loan(cmd) => run_loan(&db, cmd, out).await,
        Command::Balance(cmd) => run_balance(&db, cmd, out).await,
        Command::Settings(cmd) => run_settings(&db, cmd, out).await,
        Command::Report(args) => {
            if let Some(dir) = args.out {
                config = config.with_reports_dir(dir);
            }
            run_report(&db, &config, args.kind, args.export, out).await
        }
        Command::Counter(args) => {
            if let Some(width) = args.width {
                config = config.with_receipt_width(width);
            }
            let stdin = BufReader::new(tokio::io::stdin());
            Counter::new(&db, &config, stdin, tokio::io::stdout())
                .json(cli.json)
                .run()
                .await
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Printer {
    json: bool,
}

impl Printer {
    fn show<T: Render>(&self, value: &T) -> ApiResult<()> {
        println!("{}", output::format(value, self.json)?);
        Ok(())
    }

    fn done(&self, message: impl Into<String>) -> ApiResult<()> {
        self.show(&Done {
            message: message.into(),
        })
    }
}

async fn run_product(db: &DbState, cmd: ProductCommand, out: Printer) -> ApiResult<()> {
    match cmd {
        ProductCommand::Add(fields) => out.show(&product::add_product(db, fields.into()).await?),
        ProductCommand::Update { id, fields } => {
            out.show(&product::update_product(db, id, fields.into()).await?)
        }
        ProductCommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete product #{}?", id)).await? {
                return out.done("Cancelled.");
            }
            product::delete_product(db, id).await?;
            out.done(format!("Product #{} deleted.", id))
        }
        ProductCommand::List => out.show(&product::search_products(db, "").await?),
        ProductCommand::Search { query } => out.show(&product::search_products(db, &query).await?),
        ProductCommand::LowStock => out.show(&product::low_stock_products(db).await?),
        ProductCommand::Restock { barcode, quantity } => {
            out.show(&product::restock_product(db, &barcode, quantity).await?)
        }
        ProductCommand::Find { query } => out.show(&product::find_product(db, &query).await?),
        ProductCommand::Suggest { query, limit } => {
            out.show(&product::suggest_products(db, &query, limit).await?)
        }
    }
}

async fn run_loan(db: &DbState, cmd: LoanCommand, out: Printer) -> ApiResult<()> {
    match cmd {
        LoanCommand::Add {
            code,
            name,
            phone,
            address,
        } => {
            let draft = CustomerDraft {
                customer_code: code,
                name,
                phone,
                address,
            };
            out.show(&loan::add_customer(db, draft).await?)
        }
        LoanCommand::Update {
            code,
            new_code,
            name,
            phone,
            address,
        } => {
            let patch = loan::CustomerPatch {
                customer_code: new_code,
                name,
                phone,
                address,
            };
            out.show(&loan::update_customer(db, &code, patch).await?)
        }
        LoanCommand::Delete { code, yes } => {
            if !yes && !confirm(&format!("Delete customer {} and their history?", code)).await? {
                return out.done("Cancelled.");
            }
            loan::delete_customer(db, &code).await?;
            out.done(format!("Customer {} deleted.", code))
        }
        LoanCommand::List => out.show(&loan::list_customers(db).await?),
        LoanCommand::Search { query } => out.show(&loan::search_customers(db, &query).await?),
        LoanCommand::Show { code, limit } => out.show(&loan::customer_detail(db, &code, limit).await?),
        LoanCommand::Charge { code, amount, note } => {
            out.show(&loan::record_purchase(db, &code, amount, note.as_deref()).await?)
        }
        LoanCommand::Repay { code, amount, note } => {
            out.show(&loan::record_repayment(db, &code, amount, note.as_deref()).await?)
        }
        LoanCommand::Override { code, balance, yes } => {
            let prompt = format!(
                "Set {}'s balance to {}? No history row is written.",
                code, balance
            );
            if !yes && !confirm(&prompt).await? {
                return out.done("Cancelled.");
            }
            out.show(&loan::override_balance(db, &code, balance).await?)
        }
        LoanCommand::Prune => out.show(&loan::prune_all_history(db).await?),
    }
}

async fn run_balance(db: &DbState, cmd: BalanceCommand, out: Printer) -> ApiResult<()> {
    match cmd {
        BalanceCommand::Add {
            name,
            amount,
            notes,
        } => {
            let draft = TemporaryBalanceDraft {
                customer_name: name,
                balance: amount,
                notes,
            };
            out.show(&balance::add_balance(db, draft).await?)
        }
        BalanceCommand::Update {
            id,
            name,
            amount,
            notes,
        } => {
            let patch = balance::BalancePatch {
                customer_name: name,
                balance: amount,
                notes,
            };
            out.show(&balance::update_balance(db, id, patch).await?)
        }
        BalanceCommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete temporary balance #{}?", id)).await? {
                return out.done("Cancelled.");
            }
            balance::delete_balance(db, id).await?;
            out.done(format!("Temporary balance #{} deleted.", id))
        }
        BalanceCommand::List => out.show(&balance::list_balances(db).await?),
        BalanceCommand::Search { query } => out.show(&balance::search_balances(db, &query).await?),
    }
}

async fn run_settings(db: &DbState, cmd: SettingsCommand, out: Printer) -> ApiResult<()> {
    match cmd {
        SettingsCommand::Show => out.show(&settings::get_settings(db).await?),
        SettingsCommand::Set(fields) => {
            let patch = settings::SettingsPatch::from(fields);
            if patch.is_empty() {
                return Err(ApiError::validation("Nothing to change; pass at least one setting"));
            }
            out.show(&settings::update_settings(db, patch).await?)
        }
        SettingsCommand::Reset { yes } => {
            if !yes && !confirm("Restore default bill settings?").await? {
                return out.done("Cancelled.");
            }
            out.show(&settings::reset_settings(db).await?)
        }
    }
}

async fn run_report(
    db: &DbState,
    config: &ConfigState,
    kind: ReportKind,
    export: bool,
    out: Printer,
) -> ApiResult<()> {
    let dir = config.reports_dir();
    let at = Local::now().naive_local();

    match (kind, export) {
        (ReportKind::Loans, false) => out.show(&report::loan_report(db).await?),
        (ReportKind::Loans, true) => out.show(&report::export_loan_report(db, dir, at).await?),
        (ReportKind::Inventory, false) => out.show(&report::inventory_report(db).await?),
        (ReportKind::Inventory, true) => {
            out.show(&report::export_inventory_report(db, dir, at).await?)
        }
        (ReportKind::Balances, false) => out.show(&report::balance_report(db).await?),
        (ReportKind::Balances, true) => out.show(&report::export_balance_report(db, dir, at).await?),
        (ReportKind::Schema, _) => out.show(&report::export_schema(dir, at)?),
        (ReportKind::All, _) => out.show(&report::export_all(db, dir, at).await?),
    }
}

/// Asks a yes/no question on the terminal. Anything but `y`/`yes` is no.
async fn confirm(question: &str) -> ApiResult<bool> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{} [y/N] ", question).as_bytes())
        .await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Serializable form of [`ApiError`] for `--json` error output.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a ApiError,
}
