//! # API Error Type
//!
//! Unified error type for CLI commands and the counter session.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kade POS                               │
//! │                                                                         │
//! │  kade loan repay C001 1000                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::QueryFailed("...") ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Business Rule? ─── CoreError::RepaymentExceeds ── ApiError ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  stderr: [BUSINESS_LOGIC] Repayment of 1000.00 exceeds ...             │
//! │  --json: {"code":"BUSINESS_LOGIC","message":"Repayment of ..."}        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persistence failures are logged with their detail and shown to the
//! operator as a generic message. Validation and not-found errors are shown
//! verbatim; nothing has been written when they occur.

use std::process::ExitCode;

use kade_core::CoreError;
use kade_db::DbError;
use serde::Serialize;
use thiserror::Error;

/// Error returned from commands.
///
/// ## Serialization
/// With `--json`, a failed command prints:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Loan customer not found: C009"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes, one per operator-visible failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown barcode, customer code, or row id
    NotFound,

    /// Input rejected before any mutation
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// A ledger or settlement rule refused the operation
    BusinessLogic,

    /// Bill manipulation failed
    BillError,

    /// Positive stock below the requested quantity
    InsufficientStock,

    /// Tender below the bill total
    PaymentError,

    /// Report or schema file could not be written
    IoError,

    /// Anything else
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Process exit status for this error.
    ///
    /// Operator mistakes exit with 1, infrastructure failures with 2.
    pub fn exit_code(&self) -> ExitCode {
        match self.code {
            ErrorCode::DatabaseError | ErrorCode::IoError | ErrorCode::Internal => ExitCode::from(2),
            _ => ExitCode::from(1),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Core(e) => ApiError::from(e),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_) | CoreError::CustomerNotFound(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::RepaymentExceedsBalance { .. } => ErrorCode::BusinessLogic,
            CoreError::InsufficientTender { .. } => ErrorCode::PaymentError,
            CoreError::EmptyBill
            | CoreError::BillTooLarge { .. }
            | CoreError::LineNotFound(_) => ErrorCode::BillError,
            CoreError::QuantityTooLarge { .. }
            | CoreError::AmountOverflow(_)
            | CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<kade_core::ValidationError> for ApiError {
    fn from(err: kade_core::ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("I/O error: {}", err);
        ApiError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        tracing::error!("CSV error: {}", err);
        ApiError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal(err.to_string())
    }
}

/// Result alias for commands.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kade_core::Money;

    #[test]
    fn test_core_errors_map_to_codes() {
        let err = ApiError::from(CoreError::RepaymentExceedsBalance {
            balance: Money::from_cents(75_000),
            amount: Money::from_cents(100_000),
        });
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert!(err.message.contains("1000.00"));

        let err = ApiError::from(DbError::Core(CoreError::CustomerNotFound("C009".into())));
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_query_failure_hides_detail() {
        let err = ApiError::from(DbError::QueryFailed("no such table: products".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("products"));
    }

    #[test]
    fn test_serializes_code_and_message() {
        let json = serde_json::to_string(&ApiError::not_found("Product", "999")).unwrap();
        assert_eq!(json, r#"{"code":"NOT_FOUND","message":"Product not found: 999"}"#);
    }
}
