//! # Report Commands
//!
//! Summaries of loans, inventory and temporary balances, written as CSV
//! files, plus the standalone SQL schema script.
//!
//! ## Export Files
//! ```text
//! reports/
//! ├── Loan_Customers_Report_20241128_143052.csv
//! ├── Product_Details_Report_20241128_143052.csv
//! ├── Temporary_Balances_Report_20241128_143052.csv
//! └── Database_Backup_20241128_143052.sql
//! ```
//!
//! Every export is a one-shot write; nothing reads these files back.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::state::DbState;
use kade_core::report::{
    balance_rows, balance_summary, inventory_summary, loan_rows, loan_summary, product_rows,
    BalanceRow, BalanceSummary, InventorySummary, LoanRow, LoanSummary, ProductRow,
};
use kade_db::schema;

/// A summary line plus the table beneath it.
#[derive(Debug, Clone, Serialize)]
pub struct Report<S, R> {
    pub summary: S,
    pub rows: Vec<R>,
}

pub type LoanReport = Report<LoanSummary, LoanRow>;
pub type InventoryReport = Report<InventorySummary, ProductRow>;
pub type BalanceReport = Report<BalanceSummary, BalanceRow>;

/// One file written by an export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub rows: usize,
    pub summary: String,
}

pub async fn loan_report(db: &DbState) -> ApiResult<LoanReport> {
    let customers = db.inner().loans().list_all().await?;
    Ok(Report {
        summary: loan_summary(&customers),
        rows: loan_rows(&customers),
    })
}

pub async fn inventory_report(db: &DbState) -> ApiResult<InventoryReport> {
    let products = db.inner().products().list_all().await?;
    Ok(Report {
        summary: inventory_summary(&products)?,
        rows: product_rows(&products),
    })
}

pub async fn balance_report(db: &DbState) -> ApiResult<BalanceReport> {
    let balances = db.inner().balances().list_all().await?;
    Ok(Report {
        summary: balance_summary(&balances),
        rows: balance_rows(&balances),
    })
}

/// `{prefix}_Report_yyyyMMdd_HHmmss.csv`
pub fn report_file_name(prefix: &str, at: NaiveDateTime) -> String {
    format!("{}_Report_{}.csv", prefix, at.format("%Y%m%d_%H%M%S"))
}

pub async fn export_loan_report(db: &DbState, dir: &Path, at: NaiveDateTime) -> ApiResult<ExportedFile> {
    let report = loan_report(db).await?;
    write_report(dir, report_file_name("Loan_Customers", at), &report.rows, report.summary.describe())
}

pub async fn export_inventory_report(
    db: &DbState,
    dir: &Path,
    at: NaiveDateTime,
) -> ApiResult<ExportedFile> {
    let report = inventory_report(db).await?;
    write_report(dir, report_file_name("Product_Details", at), &report.rows, report.summary.describe())
}

pub async fn export_balance_report(
    db: &DbState,
    dir: &Path,
    at: NaiveDateTime,
) -> ApiResult<ExportedFile> {
    let report = balance_report(db).await?;
    write_report(
        dir,
        report_file_name("Temporary_Balances", at),
        &report.rows,
        report.summary.describe(),
    )
}

/// Writes the SQL script that recreates the schema on an empty database.
pub fn export_schema(dir: &Path, at: NaiveDateTime) -> ApiResult<ExportedFile> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(schema::export_file_name(at));
    std::fs::write(&path, schema::export_sql(at))?;

    info!(path = %path.display(), "Schema exported");
    Ok(ExportedFile {
        path,
        rows: 0,
        summary: "Database schema script".to_string(),
    })
}

/// Every report plus the schema script, sharing one timestamp.
pub async fn export_all(db: &DbState, dir: &Path, at: NaiveDateTime) -> ApiResult<Vec<ExportedFile>> {
    Ok(vec![
        export_loan_report(db, dir, at).await?,
        export_inventory_report(db, dir, at).await?,
        export_balance_report(db, dir, at).await?,
        export_schema(dir, at)?,
    ])
}

fn write_report<R: Serialize>(
    dir: &Path,
    file_name: String,
    rows: &[R],
    summary: String,
) -> ApiResult<ExportedFile> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);

    let mut writer = csv::Writer::from_path(&path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "Report exported");
    Ok(ExportedFile {
        path,
        rows: rows.len(),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::add_product;
    use crate::commands::test_support::{db, product};
    use chrono::NaiveDate;
    use kade_core::{CustomerDraft, Money, TransactionType};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 28)
            .unwrap()
            .and_hms_opt(14, 30, 52)
            .unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kade-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(
            report_file_name("Loan_Customers", at()),
            "Loan_Customers_Report_20241128_143052.csv"
        );
    }

    #[tokio::test]
    async fn test_loan_report_summary() {
        let db = db().await;
        for (code, cents) in [("C001", 50_000), ("C002", 0)] {
            db.inner()
                .loans()
                .create(CustomerDraft {
                    customer_code: code.to_string(),
                    name: format!("Customer {}", code),
                    phone: None,
                    address: None,
                })
                .await
                .unwrap();
            if cents > 0 {
                db.inner()
                    .loans()
                    .record_transaction(code, TransactionType::Purchase, Money::from_cents(cents), None, None)
                    .await
                    .unwrap();
            }
        }

        let report = loan_report(&db).await.unwrap();
        assert_eq!(report.summary.total_customers, 2);
        assert_eq!(report.summary.active_loans, 1);
        assert_eq!(report.summary.total_outstanding, Money::from_cents(50_000));
        assert_eq!(report.rows[0].customer_code, "C001");
    }

    #[tokio::test]
    async fn test_export_all_writes_four_files() {
        let db = db().await;
        add_product(&db, product("Soap", "S1", 17_000, 3)).await.unwrap();
        let dir = scratch_dir("export");

        let files = export_all(&db, &dir, at()).await.unwrap();
        assert_eq!(files.len(), 4);
        assert!(files.iter().all(|f| f.path.exists()));

        let inventory = std::fs::read_to_string(&files[1].path).unwrap();
        let mut lines = inventory.lines();
        assert_eq!(
            lines.next(),
            Some("Name,Barcode,Price,Marked Price,Quantity,Category,Supplier,Status")
        );
        assert_eq!(lines.next(), Some("Soap,S1,170.00,,3 pieces,,,Low Stock"));

        let schema = std::fs::read_to_string(&files[3].path).unwrap();
        assert!(schema.contains("CREATE TABLE IF NOT EXISTS loan_transactions"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
