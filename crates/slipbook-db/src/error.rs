//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  ValidationError (slipbook-core)      sqlx::Error                      │
//! │       │  raised before any statement       │                           │
//! │       └──────────────┬─────────────────────┘                           │
//! │                      ▼                                                  │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ├── kind()          → ErrorKind for programmatic handling        │
//! │       └── user_message()  → what the screen shows                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use slipbook_core::{CoreError, ValidationError};
use thiserror::Error;

/// Shown for every storage failure; the detail goes to the log.
pub const GENERIC_SAVE_FAILURE: &str = "Failed to save. Please try again.";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Input rejected before anything was written.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Updating a receipt or inventory item whose id does not exist
    ///
    /// Plain reads return `None` instead.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate receipt number
    /// - Duplicate primary key
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Receipt item pointing at a receipt that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The free tier's monthly allowance is used up.
    #[error("Monthly receipt limit reached: {used} of {limit} used")]
    UsageLimitReached { used: i64, limit: u32 },

    /// Local storage is not available on this platform.
    ///
    /// Writes fail with this error; reads quietly return nothing.
    #[error("Local storage is not supported on this platform")]
    UnsupportedPlatform,

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A schema statement failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// The single connection could not be acquired in time.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Coarse error categories for callers that branch on failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Constraint,
    UsageLimit,
    UnsupportedPlatform,
    Storage,
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Fills in the offending value of a unique violation.
    ///
    /// SQLite only reports the column, so callers that know the value
    /// attach it here.
    pub fn with_value(self, value: impl Into<String>) -> Self {
        match self {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: value.into(),
            },
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Validation(_) => ErrorKind::Validation,
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ErrorKind::Constraint
            }
            DbError::UsageLimitReached { .. } => ErrorKind::UsageLimit,
            DbError::UnsupportedPlatform => ErrorKind::UnsupportedPlatform,
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::TransactionFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => ErrorKind::Storage,
        }
    }

    /// Message suitable for display.
    ///
    /// Validation, lookup and limit errors are actionable and shown as-is.
    /// Storage failures are logged and collapsed into one generic message.
    pub fn user_message(&self) -> String {
        match self {
            DbError::Validation(e) => e.to_string(),
            DbError::NotFound { .. }
            | DbError::UniqueViolation { .. }
            | DbError::UsageLimitReached { .. }
            | DbError::UnsupportedPlatform => self.to_string(),
            other => {
                tracing::error!(error = %other, "Storage operation failed");
                GENERIC_SAVE_FAILURE.to_string()
            }
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
///
/// `RowNotFound` is never produced: lookups use `fetch_optional`.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: receipts.receipt_number"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UsageLimitReached { used, limit } => {
                DbError::UsageLimitReached { used, limit }
            }
            CoreError::Validation(e) => DbError::Validation(e),
        }
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Internal(format!("Invalid JSON setting: {}", err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            DbError::from(ValidationError::required("phone")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(DbError::not_found("Receipt", "r1").kind(), ErrorKind::NotFound);
        assert_eq!(
            DbError::duplicate("receipts.receipt_number", "ACM-1-1").kind(),
            ErrorKind::Constraint
        );
        assert_eq!(DbError::UnsupportedPlatform.kind(), ErrorKind::UnsupportedPlatform);
        assert_eq!(DbError::QueryFailed("boom".into()).kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_user_message_hides_storage_detail() {
        let validation = DbError::from(ValidationError::required("business name"));
        assert_eq!(validation.user_message(), "business name is required");

        let storage = DbError::QueryFailed("disk I/O error".to_string());
        assert_eq!(storage.user_message(), GENERIC_SAVE_FAILURE);
    }

    #[test]
    fn test_with_value() {
        let err = DbError::duplicate("receipts.receipt_number", "unknown").with_value("ACM-1-1");
        assert_eq!(
            err.to_string(),
            "Duplicate receipts.receipt_number: 'ACM-1-1' already exists"
        );

        let untouched = DbError::PoolExhausted.with_value("x");
        assert!(matches!(untouched, DbError::PoolExhausted));
    }

    #[test]
    fn test_core_error_conversion() {
        let err = DbError::from(CoreError::UsageLimitReached { used: 20, limit: 20 });
        assert_eq!(err.kind(), ErrorKind::UsageLimit);
    }
}
