//! # Receipt Drafts
//!
//! The in-progress state of the "Create Receipt" form.
//!
//! ## Draft Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ReceiptDraft::new()                ReceiptDraft::from_receipt(&r)      │
//! │        │                                       │                        │
//! │        ▼                                       ▼                        │
//! │  add_line / add_inventory_item / remove_line / set payment              │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  valid_lines()  ── blank description, zero price or zero quantity       │
//! │        │           lines are dropped, never stored                      │
//! │        ▼                                                                │
//! │  build(number, created_at)          build_update(&original)             │
//! │        │                                       │                        │
//! │        └──────────► (ReceiptHeader, Vec<NewReceiptItem>) ◄──────────────┘│
//! │                                │                                        │
//! │                                ▼                                        │
//! │                 ReceiptRepository::save / update                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::payment::resolve_payment;
use crate::types::{InventoryItem, NewReceiptItem, PaymentStatus, Receipt, ReceiptHeader};
use crate::validation::{validate_receipt, ValidationResult};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_KOBO};

/// One editable row on the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DraftLine {
    pub description: String,
    pub quantity: f64,
    pub price: Money,
}

impl DraftLine {
    pub fn new(description: impl Into<String>, quantity: f64, price: Money) -> Self {
        DraftLine {
            description: description.into(),
            quantity,
            price,
        }
    }

    /// Whether this row ends up on the saved receipt.
    pub fn is_valid(&self) -> bool {
        !self.description.trim().is_empty()
            && self.price.is_positive()
            && self.price.kobo() <= MAX_PRICE_KOBO
            && self.quantity.is_finite()
            && self.quantity > 0.0
            && self.quantity <= MAX_ITEM_QUANTITY
    }

    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }

    fn to_item(&self) -> NewReceiptItem {
        NewReceiptItem::new(self.description.trim(), self.quantity, self.price)
    }
}

impl InventoryItem {
    /// Copies name and price into a new line. The line keeps no link back
    /// to the catalog entry.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use slipbook_core::money::Money;
    /// use slipbook_core::types::InventoryItem;
    ///
    /// let soap = InventoryItem {
    ///     id: "inv-1".to_string(),
    ///     name: "Soap".to_string(),
    ///     description: None,
    ///     price_kobo: 10_000,
    ///     created_at: Utc::now(),
    /// };
    /// let line = soap.to_draft_line(2.0);
    /// assert_eq!(line.description, "Soap");
    /// assert_eq!(line.line_total(), Money::from_kobo(20_000));
    /// ```
    pub fn to_draft_line(&self, quantity: f64) -> DraftLine {
        DraftLine::new(self.name.clone(), quantity, self.price())
    }
}

/// Form state for a new or edited receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDraft {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<DraftLine>,
    pub payment_status: Option<PaymentStatus>,
    pub amount_paid: Option<Money>,
}

impl ReceiptDraft {
    pub fn new(customer_name: impl Into<String>) -> Self {
        ReceiptDraft {
            customer_name: customer_name.into(),
            ..Default::default()
        }
    }

    /// Loads a saved receipt for editing.
    pub fn from_receipt(receipt: &Receipt) -> Self {
        ReceiptDraft {
            customer_name: receipt.customer_name.clone().unwrap_or_default(),
            customer_phone: receipt.customer_phone.clone(),
            notes: receipt.notes.clone(),
            lines: receipt
                .items
                .iter()
                .map(|item| DraftLine::new(item.description.clone(), item.quantity, item.price()))
                .collect(),
            payment_status: receipt.payment_status,
            amount_paid: receipt.amount_paid(),
        }
    }

    pub fn add_line(&mut self, line: DraftLine) -> &mut Self {
        self.lines.push(line);
        self
    }

    pub fn add_inventory_item(&mut self, item: &InventoryItem, quantity: f64) -> &mut Self {
        self.add_line(item.to_draft_line(quantity))
    }

    /// Removes the line at `index`; out-of-range indexes are ignored.
    pub fn remove_line(&mut self, index: usize) -> Option<DraftLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn set_payment(&mut self, status: Option<PaymentStatus>, amount_paid: Option<Money>) {
        self.payment_status = status;
        self.amount_paid = amount_paid;
    }

    pub fn valid_lines(&self) -> impl Iterator<Item = &DraftLine> {
        self.lines.iter().filter(|line| line.is_valid())
    }

    /// Running total over valid lines only.
    pub fn total(&self) -> Money {
        self.valid_lines().map(DraftLine::line_total).sum()
    }

    /// Save stays disabled until this is true.
    pub fn can_save(&self) -> bool {
        !self.customer_name.trim().is_empty() && self.total().is_positive()
    }

    /// Builds the header and lines for a new receipt.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use slipbook_core::draft::{DraftLine, ReceiptDraft};
    /// use slipbook_core::money::Money;
    ///
    /// let mut draft = ReceiptDraft::new("Jane");
    /// draft
    ///     .add_line(DraftLine::new("Soap", 2.0, Money::from_kobo(10_000)))
    ///     .add_line(DraftLine::new("Sponge", 1.0, Money::from_kobo(5_000)))
    ///     .add_line(DraftLine::new("", 1.0, Money::from_kobo(99)));
    ///
    /// let (header, items) = draft.build("ACM-1-1", Utc::now()).unwrap();
    /// assert_eq!(header.total_kobo, 25_000);
    /// assert_eq!(items.len(), 2);
    /// ```
    pub fn build(
        &self,
        receipt_number: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> ValidationResult<(ReceiptHeader, Vec<NewReceiptItem>)> {
        let items: Vec<NewReceiptItem> = self.valid_lines().map(DraftLine::to_item).collect();
        if items.is_empty() {
            return Err(ValidationError::required("items"));
        }

        let total = self.total();
        let amount_paid = resolve_payment(self.payment_status, self.amount_paid, total)?;

        let header = ReceiptHeader {
            receipt_number: receipt_number.into(),
            total_kobo: total.kobo(),
            created_at,
            customer_name: self.customer_name.trim().to_string(),
            customer_phone: trimmed(&self.customer_phone),
            notes: trimmed(&self.notes),
            payment_status: self.payment_status,
            amount_paid_kobo: amount_paid.map(|m| m.kobo()),
        };

        validate_receipt(&header, &items)?;
        Ok((header, items))
    }

    /// Like [`build`](Self::build) but keeps the original number and date.
    pub fn build_update(
        &self,
        original: &Receipt,
    ) -> ValidationResult<(ReceiptHeader, Vec<NewReceiptItem>)> {
        self.build(original.receipt_number.clone(), original.created_at)
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReceiptItem;
    use chrono::TimeZone;

    fn draft() -> ReceiptDraft {
        let mut draft = ReceiptDraft::new("  Jane ");
        draft
            .add_line(DraftLine::new("Soap", 2.0, Money::from_kobo(10_000)))
            .add_line(DraftLine::new("Sponge", 1.0, Money::from_kobo(5_000)));
        draft
    }

    #[test]
    fn test_invalid_lines_are_excluded() {
        let mut draft = draft();
        draft
            .add_line(DraftLine::new("   ", 1.0, Money::from_kobo(100)))
            .add_line(DraftLine::new("Free bag", 1.0, Money::zero()))
            .add_line(DraftLine::new("Nothing", 0.0, Money::from_kobo(100)))
            .add_line(DraftLine::new("Typo", 1.0, Money::from_kobo(i64::MAX)));

        assert_eq!(draft.valid_lines().count(), 2);
        assert_eq!(draft.total().kobo(), 25_000);

        let (_, items) = draft.build("ACM-1-1", Utc::now()).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_build_trims_and_totals() {
        let mut draft = draft();
        draft.notes = Some("  ".to_string());
        let (header, items) = draft.build("ACM-1-1", Utc::now()).unwrap();

        assert_eq!(header.customer_name, "Jane");
        assert_eq!(header.notes, None);
        assert_eq!(header.total_kobo, 25_000);
        assert_eq!(items[0].line_total().kobo(), 20_000);
    }

    #[test]
    fn test_build_requires_customer_and_lines() {
        let mut nameless = draft();
        nameless.customer_name = " ".to_string();
        assert!(!nameless.can_save());
        assert_eq!(
            nameless.build("ACM-1-1", Utc::now()).unwrap_err(),
            ValidationError::required("customer name")
        );

        let empty = ReceiptDraft::new("Jane");
        assert!(!empty.can_save());
        assert_eq!(
            empty.build("ACM-1-1", Utc::now()).unwrap_err(),
            ValidationError::required("items")
        );
    }

    #[test]
    fn test_build_normalizes_payment() {
        let mut draft = draft();

        draft.set_payment(Some(PaymentStatus::Paid), None);
        let (header, _) = draft.build("ACM-1-1", Utc::now()).unwrap();
        assert_eq!(header.amount_paid_kobo, Some(25_000));

        draft.set_payment(Some(PaymentStatus::NotPaid), Some(Money::from_kobo(5)));
        let (header, _) = draft.build("ACM-1-1", Utc::now()).unwrap();
        assert_eq!(header.amount_paid_kobo, None);

        draft.set_payment(Some(PaymentStatus::PartPaid), Some(Money::from_kobo(25_000)));
        assert!(draft.build("ACM-1-1", Utc::now()).is_err());
    }

    #[test]
    fn test_remove_line() {
        let mut draft = draft();
        assert_eq!(draft.remove_line(5), None);
        let removed = draft.remove_line(0).unwrap();
        assert_eq!(removed.description, "Soap");
        assert_eq!(draft.total().kobo(), 5_000);
    }

    #[test]
    fn test_inventory_copy_is_disconnected() {
        let mut soap = InventoryItem {
            id: "inv-1".to_string(),
            name: "Soap".to_string(),
            description: Some("Bar soap".to_string()),
            price_kobo: 10_000,
            created_at: Utc::now(),
        };
        let mut draft = ReceiptDraft::new("Jane");
        draft.add_inventory_item(&soap, 3.0);

        soap.price_kobo = 1;
        assert_eq!(draft.lines[0].price, Money::from_kobo(10_000));
        assert_eq!(draft.total().kobo(), 30_000);
    }

    #[test]
    fn test_edit_round_trip_keeps_identity() {
        let created_at = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let receipt = Receipt {
            id: "r1".to_string(),
            receipt_number: "ACM-1-1".to_string(),
            total_kobo: 20_000,
            created_at,
            customer_name: Some("Jane".to_string()),
            customer_phone: None,
            notes: None,
            payment_status: None,
            amount_paid_kobo: None,
            items: vec![ReceiptItem {
                id: "i1".to_string(),
                receipt_id: "r1".to_string(),
                description: "Soap".to_string(),
                quantity: 2.0,
                price_kobo: 10_000,
            }],
        };

        let mut draft = ReceiptDraft::from_receipt(&receipt);
        draft.add_line(DraftLine::new("Sponge", 1.0, Money::from_kobo(5_000)));

        let (header, items) = draft.build_update(&receipt).unwrap();
        assert_eq!(header.receipt_number, "ACM-1-1");
        assert_eq!(header.created_at, created_at);
        assert_eq!(header.total_kobo, 25_000);
        assert_eq!(items.len(), 2);
    }
}
