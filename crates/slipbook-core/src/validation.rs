//! # Validation Module
//!
//! Input validation for everything the repositories write.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend                                                      │
//! │  ├── Disables "Save" while the form is empty                           │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository (Rust)                                            │
//! │  └── THIS MODULE: runs before any statement is executed                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE receipt_number                                             │
//! │  └── Foreign key receipt_items → receipts                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use slipbook_core::types::BusinessProfileInput;
//! use slipbook_core::validation::validate_business_profile;
//!
//! assert!(validate_business_profile(&BusinessProfileInput::new("Acme", "555")).is_ok());
//! assert!(validate_business_profile(&BusinessProfileInput::new("Acme", " ")).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::payment::validate_payment;
use crate::types::{
    items_total, BusinessProfileInput, InventoryItemInput, NewReceiptItem, ReceiptHeader,
};
use crate::{MAX_ITEM_QUANTITY, MAX_NAME_LEN, MAX_PRICE_KOBO, MAX_TEXT_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted inventory search term.
pub const MAX_SEARCH_LEN: usize = 100;

/// Longest accepted settings key.
pub const MAX_SETTING_KEY_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most `max` characters
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional text field (only the length is checked).
pub fn validate_optional(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates and trims an inventory search term.
///
/// An empty term is allowed and means "everything". The two-character
/// trigger before searching is the UI's concern, not this layer's.
pub fn validate_search_term(term: &str) -> ValidationResult<String> {
    let term = term.trim();

    if term.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search term".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(term.to_string())
}

/// Validates a settings key.
pub fn validate_setting_key(key: &str) -> ValidationResult<()> {
    validate_required("setting key", key, MAX_SETTING_KEY_LEN)
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates the business profile form.
///
/// ## Rules
/// - `name` and `phone` are required
/// - Optional fields are length-limited
pub fn validate_business_profile(input: &BusinessProfileInput) -> ValidationResult<()> {
    validate_required("business name", &input.name, MAX_NAME_LEN)?;
    validate_required("phone", &input.phone, MAX_NAME_LEN)?;
    validate_optional("address", input.address.as_deref(), MAX_TEXT_LEN)?;
    validate_optional("CAC number", input.cac_number.as_deref(), MAX_NAME_LEN)?;
    validate_optional("logo", input.logo_uri.as_deref(), MAX_TEXT_LEN)?;
    validate_optional("website", input.website_uri.as_deref(), MAX_TEXT_LEN)?;
    validate_optional("custom footer", input.custom_footer.as_deref(), MAX_TEXT_LEN)?;
    Ok(())
}

/// Validates an inventory item.
///
/// ## Rules
/// - `name` is required
/// - `price` must not be negative (free items are allowed in the catalog)
///   and at most [`MAX_PRICE_KOBO`]
pub fn validate_inventory_item(input: &InventoryItemInput) -> ValidationResult<()> {
    validate_required("item name", &input.name, MAX_NAME_LEN)?;
    validate_optional("description", input.description.as_deref(), MAX_TEXT_LEN)?;

    if input.price_kobo < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    if input.price_kobo > MAX_PRICE_KOBO {
        return Err(ValidationError::invalid_format(
            "price",
            format!("must be at most {}", Money::from_kobo(MAX_PRICE_KOBO)),
        ));
    }

    Ok(())
}

/// Validates one receipt line. `position` is 1-based, for messages.
///
/// ## Rules
/// - `description` is required
/// - `quantity` must be a finite number greater than zero, at most
///   [`MAX_ITEM_QUANTITY`]
/// - `price` must be greater than zero, at most [`MAX_PRICE_KOBO`]
pub fn validate_receipt_item(item: &NewReceiptItem, position: usize) -> ValidationResult<()> {
    validate_required(
        &format!("item {} description", position),
        &item.description,
        MAX_TEXT_LEN,
    )?;

    if !item.quantity.is_finite() || item.quantity <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: format!("item {} quantity", position),
        });
    }

    if item.quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::invalid_format(
            format!("item {} quantity", position),
            format!("must be at most {}", MAX_ITEM_QUANTITY),
        ));
    }

    if item.price_kobo <= 0 {
        return Err(ValidationError::MustBePositive {
            field: format!("item {} price", position),
        });
    }

    if item.price_kobo > MAX_PRICE_KOBO {
        return Err(ValidationError::invalid_format(
            format!("item {} price", position),
            format!("must be at most {}", Money::from_kobo(MAX_PRICE_KOBO)),
        ));
    }

    Ok(())
}

/// Validates a receipt header together with its lines.
///
/// ## Rules
/// - receipt number and customer name are required
/// - at least one line, each valid
/// - `total` equals the sum of line totals exactly
/// - payment status and amount paid agree with the total
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use slipbook_core::money::Money;
/// use slipbook_core::types::{NewReceiptItem, ReceiptHeader};
/// use slipbook_core::validation::validate_receipt;
///
/// let items = vec![NewReceiptItem::new("Soap", 2.0, Money::from_kobo(10_000))];
/// let mut header = ReceiptHeader {
///     receipt_number: "ACM-1760000000000-7".to_string(),
///     total_kobo: 20_000,
///     created_at: Utc::now(),
///     customer_name: "Jane".to_string(),
///     customer_phone: None,
///     notes: None,
///     payment_status: None,
///     amount_paid_kobo: None,
/// };
/// assert!(validate_receipt(&header, &items).is_ok());
///
/// header.total_kobo = 19_999;
/// assert!(validate_receipt(&header, &items).is_err());
/// ```
pub fn validate_receipt(header: &ReceiptHeader, items: &[NewReceiptItem]) -> ValidationResult<()> {
    validate_required("receipt number", &header.receipt_number, MAX_NAME_LEN)?;
    validate_required("customer name", &header.customer_name, MAX_NAME_LEN)?;
    validate_optional("customer phone", header.customer_phone.as_deref(), MAX_NAME_LEN)?;
    validate_optional("notes", header.notes.as_deref(), MAX_TEXT_LEN)?;

    if items.is_empty() {
        return Err(ValidationError::required("items"));
    }

    for (index, item) in items.iter().enumerate() {
        validate_receipt_item(item, index + 1)?;
    }

    if header.total_kobo < 0 {
        return Err(ValidationError::Negative {
            field: "total".to_string(),
        });
    }

    let computed = items_total(items)?;
    if computed.kobo() != header.total_kobo {
        return Err(ValidationError::TotalMismatch {
            stated: header.total_kobo,
            computed: computed.kobo(),
        });
    }

    validate_payment(
        header.payment_status,
        header.amount_paid_kobo.map(Money::from_kobo),
        header.total(),
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
