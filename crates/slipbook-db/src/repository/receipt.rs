//! # Receipt Repository
//!
//! Database operations for receipts and their items.
//!
//! ## Receipt Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Receipt Lifecycle                                 │
//! │                                                                         │
//! │  1. SAVE (one transaction)                                             │
//! │     ├── INSERT receipts                                                │
//! │     ├── INSERT receipt_items × N                                       │
//! │     └── bump usage.receipts.<YYYY-MM>                                  │
//! │                                                                         │
//! │  2. UPDATE (one transaction)                                           │
//! │     ├── UPDATE receipts         (0 rows → NotFound, nothing changes)   │
//! │     ├── DELETE receipt_items    (old lines go)                         │
//! │     └── INSERT receipt_items    (new lines, new ids)                   │
//! │                                                                         │
//! │  3. DELETE (one transaction)                                           │
//! │     ├── DELETE receipt_items                                           │
//! │     └── DELETE receipts                                                │
//! │                                                                         │
//! │  A failure anywhere rolls the whole step back.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use slipbook_core::format::to_iso8601;
use slipbook_core::validation::validate_receipt;
use slipbook_core::{NewReceiptItem, Receipt, ReceiptHeader, ReceiptItem};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::settings::{increment_counter_in, usage_counter_key};
use crate::schema::Column;

/// Columns of `receipts`, in [`Receipt`] field order.
pub(crate) const RECEIPT_COLUMNS: &[&str] = &[
    "id",
    "receipt_number",
    "total_kobo",
    "created_at",
    "customer_name",
    "customer_phone",
    "notes",
    "payment_status",
    "amount_paid_kobo",
];

/// Repository for receipt database operations.
///
/// ## Usage
/// ```rust,ignore
/// let (header, items) = draft.build(generate_receipt_number(&profile.name), Utc::now())?;
/// let id = db.receipts().save(&header, &items).await?;
///
/// let receipt = db.receipts().get_by_id(&id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    db: Database,
}

impl ReceiptRepository {
    /// Creates a new ReceiptRepository.
    pub fn new(db: Database) -> Self {
        ReceiptRepository { db }
    }

    /// Saves a new receipt with its items.
    ///
    /// ## Arguments
    /// * `header` - Non-item fields; `total_kobo` must equal the sum of lines
    /// * `items` - At least one line
    ///
    /// ## Returns
    /// The new receipt's id.
    pub async fn save(&self, header: &ReceiptHeader, items: &[NewReceiptItem]) -> DbResult<String> {
        validate_receipt(header, items)?;
        let pool = self.db.writer().await?;
        let columns = self.db.columns().await?;

        let id = Uuid::new_v4().to_string();
        debug!(
            id = %id,
            receipt_number = %header.receipt_number,
            items = items.len(),
            "Saving receipt"
        );

        let mut tx = pool.begin().await?;

        let mut values: Vec<Column> = vec![("id", id.as_str().into())];
        values.extend(header_values(header));

        columns
            .insert("receipts", values)
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::from(e).with_value(&header.receipt_number))?;

        insert_items(&mut tx, &id, items).await?;
        increment_counter_in(&mut tx, &usage_counter_key(header.created_at), 1).await?;

        tx.commit().await?;

        Ok(id)
    }

    /// Replaces a receipt's header and all of its items.
    ///
    /// The caller passes the original `receipt_number` and `created_at`
    /// back in; see [`ReceiptDraft::build_update`].
    ///
    /// [`ReceiptDraft::build_update`]: slipbook_core::draft::ReceiptDraft::build_update
    pub async fn update(
        &self,
        id: &str,
        header: &ReceiptHeader,
        items: &[NewReceiptItem],
    ) -> DbResult<()> {
        validate_receipt(header, items)?;
        let pool = self.db.writer().await?;
        let columns = self.db.columns().await?;

        debug!(id = %id, items = items.len(), "Updating receipt");

        let mut tx = pool.begin().await?;

        let result = columns
            .update("receipts", header_values(header), "id", id)
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::from(e).with_value(&header.receipt_number))?;

        if result.rows_affected() == 0 {
            // Dropping tx rolls back
            return Err(DbError::not_found("Receipt", id));
        }

        sqlx::query("DELETE FROM receipt_items WHERE receipt_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_items(&mut tx, id, items).await?;

        tx.commit().await?;

        Ok(())
    }

    /// All receipts, newest first, each with its items.
    ///
    /// Items are loaded with one query per receipt.
    pub async fn get_all(&self) -> DbResult<Vec<Receipt>> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(Vec::new());
        };

        debug!("Listing receipts");

        let columns = self.db.columns().await?;
        let receipts: Vec<Receipt> = sqlx::query_as(&format!(
            "SELECT {} FROM receipts ORDER BY created_at DESC, rowid DESC",
            columns.select_list("receipts", RECEIPT_COLUMNS)
        ))
        .fetch_all(pool)
        .await?;

        hydrate(pool, receipts).await
    }

    /// Gets a receipt by ID; `None` if it doesn't exist.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Receipt>> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(None);
        };

        let columns = self.db.columns().await?;
        let receipt: Option<Receipt> = sqlx::query_as(&format!(
            "SELECT {} FROM receipts WHERE id = ?1",
            columns.select_list("receipts", RECEIPT_COLUMNS)
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match receipt {
            Some(mut receipt) => {
                receipt.items = items_for(pool, &receipt.id).await?;
                Ok(Some(receipt))
            }
            None => Ok(None),
        }
    }

    /// Deletes a receipt and its items.
    ///
    /// ## Returns
    /// * `true` - The receipt existed and is gone
    /// * `false` - There was nothing to delete
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let pool = self.db.writer().await?;

        debug!(id = %id, "Deleting receipt");

        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM receipt_items WHERE receipt_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM receipts WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts stored receipts (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(0);
        };

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

/// Header fields in column order; `id` is added by the caller on insert.
fn header_values(header: &ReceiptHeader) -> Vec<Column> {
    vec![
        ("receipt_number", header.receipt_number.as_str().into()),
        ("total_kobo", header.total_kobo.into()),
        ("created_at", to_iso8601(header.created_at).as_str().into()),
        ("customer_name", header.customer_name.trim().into()),
        ("customer_phone", header.customer_phone.as_deref().into()),
        ("notes", header.notes.as_deref().into()),
        ("payment_status", header.payment_status.map(|s| s.as_str()).into()),
        ("amount_paid_kobo", header.amount_paid_kobo.into()),
    ]
}

async fn insert_items(
    conn: &mut SqliteConnection,
    receipt_id: &str,
    items: &[NewReceiptItem],
) -> DbResult<()> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO receipt_items (id, receipt_id, description, quantity, price_kobo)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(receipt_id)
        .bind(item.description.trim())
        .bind(item.quantity)
        .bind(item.price_kobo)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Items of one receipt in insertion order.
async fn items_for(pool: &SqlitePool, receipt_id: &str) -> DbResult<Vec<ReceiptItem>> {
    let items = sqlx::query_as(
        r#"
        SELECT id, receipt_id, description, quantity, price_kobo
        FROM receipt_items
        WHERE receipt_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(receipt_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Attaches items to each receipt.
pub(crate) async fn hydrate(
    pool: &SqlitePool,
    mut receipts: Vec<Receipt>,
) -> DbResult<Vec<Receipt>> {
    for receipt in &mut receipts {
        receipt.items = items_for(pool, &receipt.id).await?;
    }
    Ok(receipts)
}

// =============================================================================
// Unit Tests
// =============================================================================
