//! # Configuration State
//!
//! Process-level settings resolved once at startup. Store identity and
//! receipt text live in the database (`bill_settings`), not here.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command line flags (`--db`, `--reports-dir`)
//! 2. Environment variables (`KADE_*`)
//! 3. Platform data directory (via `directories`)
//!
//! ## Thread Safety
//! Read-only after initialization, so no mutex needed.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use kade_core::receipt::{DEFAULT_RECEIPT_WIDTH, MIN_RECEIPT_WIDTH};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};

/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "kade.db";

#[derive(Debug, Clone, Serialize)]
pub struct ConfigState {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Where report and schema exports are written
    pub reports_dir: PathBuf,

    /// Receipt width in characters (typically 32, 40 or 48)
    pub receipt_width: usize,
}

impl ConfigState {
    /// Resolves configuration from environment variables and the platform
    /// data directory.
    ///
    /// ## Environment Variables
    /// - `KADE_DB_PATH`: database file
    /// - `KADE_REPORTS_DIR`: export directory
    /// - `KADE_RECEIPT_WIDTH`: receipt width in characters
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/lk.kade.pos/`
    /// - **Windows**: `%APPDATA%\kade\pos\data\`
    /// - **Linux**: `~/.local/share/pos/`
    pub fn from_env() -> ApiResult<Self> {
        let dirs = ProjectDirs::from("lk", "kade", "pos");

        let db_path = match std::env::var_os("KADE_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => dirs
                .as_ref()
                .map(|d| d.data_dir().join(DB_FILE_NAME))
                .ok_or_else(|| ApiError::internal("Could not determine app data directory"))?,
        };

        let reports_dir = match std::env::var_os("KADE_REPORTS_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs
                .as_ref()
                .map(|d| d.data_dir().join("reports"))
                .unwrap_or_else(|| PathBuf::from("reports")),
        };

        let receipt_width = std::env::var("KADE_RECEIPT_WIDTH")
            .ok()
            .and_then(|w| w.parse::<usize>().ok())
            .unwrap_or(DEFAULT_RECEIPT_WIDTH);

        Ok(ConfigState::new(db_path, reports_dir).with_receipt_width(receipt_width))
    }

    pub fn new(db_path: impl Into<PathBuf>, reports_dir: impl Into<PathBuf>) -> Self {
        ConfigState {
            db_path: db_path.into(),
            reports_dir: reports_dir.into(),
            receipt_width: DEFAULT_RECEIPT_WIDTH,
        }
    }

    /// Clamps to the narrowest layout the receipt renderer supports.
    pub fn with_receipt_width(mut self, width: usize) -> Self {
        self.receipt_width = width.max(MIN_RECEIPT_WIDTH);
        self
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reports_dir = dir.into();
        self
    }

    /// Creates the database's parent directory if it doesn't exist.
    pub fn ensure_data_dir(&self) -> ApiResult<()> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_width_clamped() {
        let config = ConfigState::new("kade.db", "reports").with_receipt_width(10);
        assert_eq!(config.receipt_width, MIN_RECEIPT_WIDTH);

        let config = config.with_receipt_width(48);
        assert_eq!(config.receipt_width, 48);
    }

    #[test]
    fn test_overrides() {
        let config = ConfigState::new("a.db", "out")
            .with_db_path("b.db")
            .with_reports_dir("exports");
        assert_eq!(config.db_path, PathBuf::from("b.db"));
        assert_eq!(config.reports_dir(), Path::new("exports"));
        assert_eq!(config.receipt_width, DEFAULT_RECEIPT_WIDTH);
    }
}
