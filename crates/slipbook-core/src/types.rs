//! # Domain Types
//!
//! Core domain types used throughout Slipbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ BusinessProfile │   │     Receipt     │   │  InventoryItem  │       │
//! │  │  (singleton)    │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name, phone    │   │  receipt_number │   │  name           │       │
//! │  │  logo_uri       │   │  total_kobo     │   │  price_kobo     │       │
//! │  └─────────────────┘   │  payment_status │   └────────┬────────┘       │
//! │                        │  items ─────────┼──┐         │ value copy     │
//! │                        └─────────────────┘  │         ▼                │
//! │                                             │  ┌─────────────────┐     │
//! │                                             └─►│   ReceiptItem   │     │
//! │                                                │  description    │     │
//! │                                                │  quantity, price│     │
//! │                                                └─────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inventory items are never referenced by id from a receipt. Selecting
//! one copies its name and price into a new, disconnected line so that
//! editing or deleting the catalog entry never rewrites history.

use chrono::{DateTime, Datelike, Months, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::payment;
use crate::validation::ValidationResult;

// =============================================================================
// Payment Status
// =============================================================================

/// How much of a receipt the customer has settled.
///
/// "Unset" is modelled as `Option::None` on the receipt, so the four
/// user-visible states are `None`, `Paid`, `PartPaid` and `NotPaid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Settled in full; amount paid equals the total.
    Paid,
    /// Partly settled; 0 < amount paid < total.
    PartPaid,
    /// Nothing paid yet.
    NotPaid,
}

impl PaymentStatus {
    /// Stored representation (`paid`, `part_paid`, `not_paid`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::PartPaid => "part_paid",
            PaymentStatus::NotPaid => "not_paid",
        }
    }

    /// Label printed on shared receipts.
    pub const fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::PartPaid => "PART PAID",
            PaymentStatus::NotPaid => "NOT PAID",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "part_paid" => Ok(PaymentStatus::PartPaid),
            "not_paid" => Ok(PaymentStatus::NotPaid),
            other => Err(ValidationError::invalid_format(
                "payment status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

// =============================================================================
// Business Profile
// =============================================================================

/// The one business this device issues receipts for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    /// Corporate Affairs Commission registration number.
    pub cac_number: Option<String>,
    /// Opaque reference to an image owned by the presentation layer.
    pub logo_uri: Option<String>,
    pub website_uri: Option<String>,
    /// Replaces the default "Thank you" line on shared receipts.
    pub custom_footer: Option<String>,
}

/// Fields a user edits on the profile screen.
///
/// Saving is an upsert on the singleton row, so there is no id here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfileInput {
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub cac_number: Option<String>,
    pub logo_uri: Option<String>,
    pub website_uri: Option<String>,
    pub custom_footer: Option<String>,
}

impl BusinessProfileInput {
    /// Creates an input with only the required fields set.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        BusinessProfileInput {
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }
}

// =============================================================================
// Receipt Items
// =============================================================================

/// A persisted line on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub id: String,
    pub receipt_id: String,
    pub description: String,
    /// Positive, may be fractional.
    pub quantity: f64,
    /// Unit price in kobo.
    pub price_kobo: i64,
}

impl ReceiptItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_kobo(self.price_kobo)
    }

    /// `quantity × price`, rounded to the kobo.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price().multiply_quantity(self.quantity)
    }
}

/// A line about to be written; ids are assigned by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewReceiptItem {
    pub description: String,
    pub quantity: f64,
    pub price_kobo: i64,
}

impl NewReceiptItem {
    pub fn new(description: impl Into<String>, quantity: f64, price: Money) -> Self {
        NewReceiptItem {
            description: description.into(),
            quantity,
            price_kobo: price.kobo(),
        }
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_kobo(self.price_kobo)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.price().multiply_quantity(self.quantity)
    }
}

impl From<&ReceiptItem> for NewReceiptItem {
    fn from(item: &ReceiptItem) -> Self {
        NewReceiptItem {
            description: item.description.clone(),
            quantity: item.quantity,
            price_kobo: item.price_kobo,
        }
    }
}

/// Sum of line totals.
///
/// Fails instead of wrapping when the sum does not fit in an `i64`.
pub fn items_total<'a, I>(items: I) -> ValidationResult<Money>
where
    I: IntoIterator<Item = &'a NewReceiptItem>,
{
    items
        .into_iter()
        .try_fold(Money::zero(), |acc, item| acc.checked_add(item.line_total()))
        .ok_or_else(|| ValidationError::invalid_format("total", "is too large"))
}

// =============================================================================
// Receipt
// =============================================================================

/// The non-item fields of a receipt, as written by save and update.
///
/// On update the caller passes the original `receipt_number` and
/// `created_at` through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptHeader {
    pub receipt_number: String,
    pub total_kobo: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub amount_paid_kobo: Option<i64>,
}

impl ReceiptHeader {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_kobo(self.total_kobo)
    }
}

/// A receipt hydrated with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub receipt_number: String,
    pub total_kobo: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Required for new receipts; rows written before the column existed
    /// read back as `None`.
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub amount_paid_kobo: Option<i64>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<ReceiptItem>,
}

impl Receipt {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_kobo(self.total_kobo)
    }

    #[inline]
    pub fn amount_paid(&self) -> Option<Money> {
        self.amount_paid_kobo.map(Money::from_kobo)
    }

    /// What the customer still owes.
    pub fn balance_due(&self) -> Money {
        payment::balance_due(self.payment_status, self.amount_paid(), self.total())
    }

    /// Sum of the stored lines (may differ from `total` on legacy rows).
    pub fn items_total(&self) -> Money {
        self.items.iter().map(ReceiptItem::line_total).sum()
    }

    /// Header to pass back into an update, keeping number and date.
    pub fn header(&self) -> ReceiptHeader {
        ReceiptHeader {
            receipt_number: self.receipt_number.clone(),
            total_kobo: self.total_kobo,
            created_at: self.created_at,
            customer_name: self.customer_name.clone().unwrap_or_default(),
            customer_phone: self.customer_phone.clone(),
            notes: self.notes.clone(),
            payment_status: self.payment_status,
            amount_paid_kobo: self.amount_paid_kobo,
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// A saved product or service that can be copied onto receipts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_kobo: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_kobo(self.price_kobo)
    }
}

/// Fields a user edits on the inventory screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemInput {
    pub name: String,
    pub description: Option<String>,
    pub price_kobo: i64,
}

impl InventoryItemInput {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        InventoryItemInput {
            name: name.into(),
            description: None,
            price_kobo: price.kobo(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// =============================================================================
// Settings
// =============================================================================

/// One row of the key/value settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

// =============================================================================
// Usage (tier gating)
// =============================================================================

/// Returns the calendar-month billing period containing `now`, as
/// `[start, end)` in UTC.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use slipbook_core::types::billing_period;
///
/// let now = Utc.with_ymd_and_hms(2026, 12, 19, 15, 30, 0).unwrap();
/// let (start, end) = billing_period(now);
/// assert_eq!(start, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
/// assert_eq!(end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
/// ```
pub fn billing_period(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let start = today.with_day(1).unwrap_or(today);
    let end = start.checked_add_months(Months::new(1)).unwrap_or(start);
    (
        start.and_time(NaiveTime::MIN).and_utc(),
        end.and_time(NaiveTime::MIN).and_utc(),
    )
}

/// Key identifying the billing period containing `at` (`2026-10`).
pub fn billing_period_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Receipts created in the current billing period against the tier limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    #[ts(as = "String")]
    pub period_start: DateTime<Utc>,
    #[ts(as = "String")]
    pub period_end: DateTime<Utc>,
    pub used: i64,
    /// `None` means unlimited.
    pub limit: Option<u32>,
}

impl UsageSummary {
    /// Receipts left this period; `None` when unlimited.
    pub fn remaining(&self) -> Option<i64> {
        self.limit.map(|limit| (limit as i64 - self.used).max(0))
    }

    pub fn limit_reached(&self) -> bool {
        matches!(self.limit, Some(limit) if self.used >= limit as i64)
    }

    /// Fails with [`CoreError::UsageLimitReached`] once the limit is hit.
    pub fn check(&self) -> CoreResult<()> {
        match self.limit {
            Some(limit) if self.used >= limit as i64 => Err(CoreError::UsageLimitReached {
                used: self.used,
                limit,
            }),
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Reporting
// =============================================================================

/// Aggregate over a set of receipts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub receipt_count: i64,
    /// Sum of receipt totals.
    pub billed_kobo: i64,
    /// Sum of amounts paid (`paid` counts the full total).
    pub collected_kobo: i64,
    pub paid_count: i64,
    pub part_paid_count: i64,
    pub not_paid_count: i64,
    /// Receipts with no payment status recorded.
    pub unset_count: i64,
}

impl ReceiptSummary {
    /// Billed minus collected.
    pub fn outstanding(&self) -> Money {
        Money::from_kobo(self.billed_kobo - self.collected_kobo)
    }
}

/// A stored receipt whose total disagrees with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TotalDiscrepancy {
    pub receipt_id: String,
    pub receipt_number: String,
    pub stored_kobo: i64,
    pub computed_kobo: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
