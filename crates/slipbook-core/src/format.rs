//! # Display Formatting
//!
//! Currency, dates and the plain-text receipt shared with customers.
//!
//! Timestamps cross the storage boundary as fixed-width ISO-8601 UTC text
//! (`2026-10-19T09:05:00.000Z`), so string order is time order. Anything
//! shown to a person is converted to a display zone first, usually
//! `chrono::Local`.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};
use std::fmt::{self, Write};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{BusinessProfile, Receipt};
use crate::validation::ValidationResult;

/// Day, month, year, then three spaces and a 12-hour clock.
const DATE_FORMAT: &str = "%d/%m/%Y   %I:%M %p";

/// Printed when the profile has no custom footer.
pub const DEFAULT_FOOTER: &str = "Thank you for your patronage!";

const DIVIDER_WIDTH: usize = 40;

// =============================================================================
// Currency
// =============================================================================

/// Formats an amount with the naira symbol and two decimals.
///
/// ## Example
/// ```rust
/// use slipbook_core::format::format_currency;
/// use slipbook_core::money::Money;
///
/// assert_eq!(format_currency(Money::from_kobo(123_450)), "₦1234.50");
/// assert_eq!(format_currency(Money::zero()), "₦0.00");
/// assert_eq!(format_currency(Money::from_kobo(-550)), "-₦5.50");
/// ```
pub fn format_currency(amount: Money) -> String {
    amount.to_string()
}

// =============================================================================
// Dates
// =============================================================================

/// Renders an ISO-8601 timestamp as `DD/MM/YYYY   HH:MM AM|PM`, with the
/// wall-clock time taken in `tz`.
///
/// ## Example
/// ```rust
/// use chrono::{FixedOffset, Utc};
/// use slipbook_core::format::format_date;
///
/// assert_eq!(
///     format_date("2026-10-19T14:05:00.000Z", &Utc).unwrap(),
///     "19/10/2026   02:05 PM"
/// );
///
/// let lagos = FixedOffset::east_opt(3600).unwrap();
/// assert_eq!(
///     format_date("2026-10-19T14:05:00.000Z", &lagos).unwrap(),
///     "19/10/2026   03:05 PM"
/// );
/// assert!(format_date("yesterday", &Utc).is_err());
/// ```
pub fn format_date<Tz>(iso: &str, tz: &Tz) -> ValidationResult<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let parsed = DateTime::parse_from_rfc3339(iso.trim())
        .map_err(|e| ValidationError::invalid_format("date", e.to_string()))?;
    Ok(format_datetime(&parsed, tz))
}

/// [`format_date`] for an already-parsed timestamp.
pub fn format_datetime<Src, Tz>(at: &DateTime<Src>, tz: &Tz) -> String
where
    Src: TimeZone,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.with_timezone(tz).format(DATE_FORMAT).to_string()
}

/// Fixed-width storage form: `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn to_iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses any RFC 3339 timestamp and normalizes it to UTC.
pub fn parse_iso8601(iso: &str) -> ValidationResult<DateTime<Utc>> {
    DateTime::<FixedOffset>::parse_from_rfc3339(iso.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| ValidationError::invalid_format("timestamp", e.to_string()))
}

// =============================================================================
// Shareable Receipt Text
// =============================================================================

/// Builds the plain-text receipt handed to the share sheet, with the date
/// shown in `tz`.
///
/// ## Layout
/// ```text
/// ════════════════════════════════════════
/// Acme
/// 12 Broad St            (when set)
/// 555
/// CAC: RC123456          (when set)
/// ════════════════════════════════════════
///
/// Receipt #: ACM-1760868000123-7
/// Date: 19/10/2026   02:05 PM
/// Customer: Jane
///
/// Soap
/// 2 × ₦100.00 = ₦200.00
///
/// ════════════════════════════════════════
/// TOTAL: ₦250.00
/// Status: PART PAID      (when set)
/// Amount Paid: ₦100.00   (paid/part paid)
/// Balance: ₦150.00       (part paid)
/// ════════════════════════════════════════
///
/// Thank you for your patronage!
/// ```
pub fn format_receipt_text<Tz>(receipt: &Receipt, profile: &BusinessProfile, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let divider = "═".repeat(DIVIDER_WIDTH);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", divider);
    let _ = writeln!(out, "{}", profile.name);
    if let Some(address) = non_blank(&profile.address) {
        let _ = writeln!(out, "{}", address);
    }
    let _ = writeln!(out, "{}", profile.phone);
    if let Some(cac) = non_blank(&profile.cac_number) {
        let _ = writeln!(out, "CAC: {}", cac);
    }
    let _ = writeln!(out, "{}", divider);
    out.push('\n');

    let _ = writeln!(out, "Receipt #: {}", receipt.receipt_number);
    let _ = writeln!(out, "Date: {}", format_datetime(&receipt.created_at, tz));
    if let Some(customer) = non_blank(&receipt.customer_name) {
        let _ = writeln!(out, "Customer: {}", customer);
    }
    if let Some(phone) = non_blank(&receipt.customer_phone) {
        let _ = writeln!(out, "Phone: {}", phone);
    }
    out.push('\n');

    let lines: Vec<String> = receipt
        .items
        .iter()
        .map(|item| {
            format!(
                "{}\n{} × {} = {}",
                item.description,
                item.quantity,
                format_currency(item.price()),
                format_currency(item.line_total())
            )
        })
        .collect();
    if !lines.is_empty() {
        let _ = writeln!(out, "{}", lines.join("\n\n"));
        out.push('\n');
    }

    if let Some(notes) = non_blank(&receipt.notes) {
        let _ = writeln!(out, "Notes: {}", notes);
        out.push('\n');
    }

    let _ = writeln!(out, "{}", divider);
    let _ = writeln!(out, "TOTAL: {}", format_currency(receipt.total()));
    if let Some(status) = receipt.payment_status {
        let _ = writeln!(out, "Status: {}", status.label());
        if let Some(paid) = receipt.amount_paid() {
            let _ = writeln!(out, "Amount Paid: {}", format_currency(paid));
        }
        let balance = receipt.balance_due();
        if !balance.is_zero() {
            let _ = writeln!(out, "Balance: {}", format_currency(balance));
        }
    }
    let _ = writeln!(out, "{}", divider);
    out.push('\n');

    let footer = non_blank(&profile.custom_footer).unwrap_or(DEFAULT_FOOTER);
    out.push_str(footer);

    out
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================
