//! # Error Types
//!
//! Domain-specific error types for slipbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  slipbook-core errors (this file)                                      │
//! │  ├── CoreError        - Domain rule failures (usage limit, ...)        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  slipbook-db errors (separate crate)                                   │
//! │  └── DbError          - Storage failures, wraps ValidationError        │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → user message                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation always runs before any statement is executed, so a
//! `ValidationError` guarantees nothing was written.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The free tier allows a fixed number of receipts per billing period.
    ///
    /// ## User Workflow
    /// ```text
    /// Tap "New Receipt"
    ///      │
    ///      ▼
    /// UsageSummary::check()  used=20, limit=20
    ///      │
    ///      ▼
    /// UsageLimitReached { used: 20, limit: 20 }
    ///      │
    ///      ▼
    /// UI offers the upgrade screen
    /// ```
    #[error("Monthly receipt limit reached: {used} of {limit} used")]
    UsageLimitReached { used: i64, limit: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Every variant names the offending field so the UI can point at it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., unparseable amount or timestamp).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The receipt total does not equal the sum of its lines.
    #[error("total {stated} does not match the sum of items {computed}")]
    TotalMismatch { stated: i64, computed: i64 },

    /// Amount paid is inconsistent with the payment status.
    #[error("amount paid is invalid: {reason}")]
    PaymentAmount { reason: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
