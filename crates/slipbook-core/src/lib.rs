//! # slipbook-core: Pure Business Logic for Slipbook
//!
//! Everything about a receipt that can be decided without a database:
//! money, receipt numbers, totals, payment status, validation and the
//! text a receipt is shared as.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Slipbook Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (mobile shell)                      │   │
//! │  │   Profile ──► Inventory ──► Create Receipt ──► Preview/Share    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ slipbook-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │  money   │ │  draft   │ │ validation       │  │   │
//! │  │   │ Receipt  │ │  Money   │ │ totals   │ │ payment, format  │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  slipbook-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Receipt, ReceiptItem, BusinessProfile, ...)
//! - [`money`] - Money type in kobo (no floating point!)
//! - [`payment`] - Payment status rules and balances
//! - [`draft`] - Building a receipt from the entry form
//! - [`numbering`] - Receipt number prefixes and layout
//! - [`format`] - Currency, date and shareable receipt text
//! - [`validation`] - Input validation before anything is written
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use slipbook_core::money::Money;
//! use slipbook_core::format::format_currency;
//!
//! let unit = Money::parse("100").unwrap();
//! let line = unit.multiply_quantity(2.0);
//! let total = line + Money::parse("50").unwrap();
//!
//! assert_eq!(format_currency(total), "₦250.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod draft;
pub mod error;
pub mod format;
pub mod money;
pub mod numbering;
pub mod payment;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency symbol printed in front of every amount.
pub const CURRENCY_SYMBOL: &str = "₦";

/// Length of the business prefix in a receipt number (`ACM-...`).
pub const RECEIPT_PREFIX_LEN: usize = 3;

/// Character used to pad short business names in the receipt prefix.
pub const RECEIPT_PREFIX_PAD: char = 'X';

/// Maximum length for names (business, customer, inventory item).
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length for free text (notes, descriptions, footer, addresses).
pub const MAX_TEXT_LEN: usize = 1000;

/// Largest accepted unit price or typed amount: ₦10,000,000,000.
pub const MAX_PRICE_KOBO: i64 = 1_000_000_000_000;

/// Largest accepted quantity on one receipt line.
pub const MAX_ITEM_QUANTITY: f64 = 1_000_000.0;
