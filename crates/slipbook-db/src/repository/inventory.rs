//! # Inventory Repository
//!
//! Database operations for the saved product/service catalog.
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  User types: "so"                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  escape % and _   →   LIKE '%so%' ESCAPE '\'                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ name         │ description              │                           │
//! │  │ Soap         │                          │ ← MATCH (name)            │
//! │  │ Bucket       │ holds soapy water        │ ← MATCH (description)     │
//! │  │ Rice 50kg    │ long grain               │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ORDER BY name COLLATE NOCASE  →  [Bucket, Soap]                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite's LIKE folds case for ASCII letters only.

use chrono::{SubsecRound, Utc};
use slipbook_core::format::to_iso8601;
use slipbook_core::validation::{validate_inventory_item, validate_search_term};
use slipbook_core::{InventoryItem, InventoryItemInput};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::Database;

const INVENTORY_COLUMNS: &str = "id, name, description, price_kobo, created_at";

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    db: Database,
}

impl InventoryRepository {
    pub fn new(db: Database) -> Self {
        InventoryRepository { db }
    }

    /// Adds an item to the catalog.
    pub async fn create(&self, input: &InventoryItemInput) -> DbResult<InventoryItem> {
        validate_inventory_item(input)?;
        let pool = self.db.writer().await?;

        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            description: clean(&input.description),
            price_kobo: input.price_kobo,
            // Stored with millisecond precision
            created_at: Utc::now().trunc_subsecs(3),
        };

        debug!(id = %item.id, name = %item.name, "Creating inventory item");

        sqlx::query(
            r#"
            INSERT INTO inventory_items (id, name, description, price_kobo, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price_kobo)
        .bind(to_iso8601(item.created_at))
        .execute(pool)
        .await?;

        Ok(item)
    }

    /// The whole catalog, alphabetical.
    pub async fn get_all(&self) -> DbResult<Vec<InventoryItem>> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(Vec::new());
        };

        let items = sqlx::query_as(&format!(
            "SELECT {} FROM inventory_items ORDER BY name COLLATE NOCASE, rowid",
            INVENTORY_COLUMNS
        ))
        .fetch_all(pool)
        .await?;

        Ok(items)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(None);
        };

        let item = sqlx::query_as(&format!(
            "SELECT {} FROM inventory_items WHERE id = ?1",
            INVENTORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(item)
    }

    /// Updates name, description and price. Receipts that already copied
    /// this item are unaffected.
    pub async fn update(&self, id: &str, input: &InventoryItemInput) -> DbResult<InventoryItem> {
        validate_inventory_item(input)?;
        let pool = self.db.writer().await?;

        debug!(id = %id, "Updating inventory item");

        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = ?2, description = ?3, price_kobo = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(clean(&input.description))
        .bind(input.price_kobo)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("InventoryItem", id))
    }

    /// Removes an item. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let pool = self.db.writer().await?;

        debug!(id = %id, "Deleting inventory item");

        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Case-insensitive substring match on name or description.
    ///
    /// ## Arguments
    /// * `term` - Search text; blank returns the whole catalog
    ///
    /// ## Example
    /// ```rust,ignore
    /// let hits = repo.search("so").await?;   // Soap, "soapy" bucket
    /// ```
    pub async fn search(&self, term: &str) -> DbResult<Vec<InventoryItem>> {
        let term = validate_search_term(term)?;
        if term.is_empty() {
            return self.get_all().await;
        }

        let Some(pool) = self.db.reader().await? else {
            return Ok(Vec::new());
        };

        debug!(term = %term, "Searching inventory");

        let pattern = format!("%{}%", escape_like(&term));
        let items = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM inventory_items
            WHERE name LIKE ?1 ESCAPE '\'
               OR COALESCE(description, '') LIKE ?1 ESCAPE '\'
            ORDER BY name COLLATE NOCASE, rowid
            "#,
            INVENTORY_COLUMNS
        ))
        .bind(pattern)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(0);
        };

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use slipbook_core::Money;

    async fn seeded() -> (Database, InventoryRepository) {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        let repo = db.inventory();
        for input in [
            InventoryItemInput::new("Soap", Money::from_kobo(10_000)),
            InventoryItemInput::new("Bucket", Money::from_kobo(150_000))
                .with_description("holds soapy water"),
            InventoryItemInput::new("Rice 50kg", Money::from_kobo(8_000_000))
                .with_description("long grain"),
            InventoryItemInput::new("100% Cotton_Tee", Money::from_kobo(500_000)),
        ] {
            repo.create(&input).await.unwrap();
        }
        (db, repo)
    }

    fn names(items: &[InventoryItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_search_name_or_description_case_insensitive() {
        let (_db, repo) = seeded().await;

        let hits = repo.search("so").await.unwrap();
        assert_eq!(names(&hits), vec!["Bucket", "Soap"]);

        let hits = repo.search("SOAP").await.unwrap();
        assert_eq!(names(&hits), vec!["Bucket", "Soap"]);

        assert!(repo.search("xyz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let (_db, repo) = seeded().await;

        assert_eq!(names(&repo.search("0%").await.unwrap()), vec!["100% Cotton_Tee"]);
        assert_eq!(names(&repo.search("n_T").await.unwrap()), vec!["100% Cotton_Tee"]);
        assert!(repo.search("_x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_search_returns_everything() {
        let (_db, repo) = seeded().await;
        assert_eq!(repo.search("  ").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_get_all_alphabetical() {
        let (_db, repo) = seeded().await;
        assert_eq!(
            names(&repo.get_all().await.unwrap()),
            vec!["100% Cotton_Tee", "Bucket", "Rice 50kg", "Soap"]
        );
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_db, repo) = seeded().await;
        let soap = repo.search("soap").await.unwrap().pop().unwrap();
        assert_eq!(soap.name, "Soap");

        let updated = repo
            .update(&soap.id, &InventoryItemInput::new("Bar Soap", Money::from_kobo(12_000)))
            .await
            .unwrap();
        assert_eq!(updated.name, "Bar Soap");
        assert_eq!(updated.price(), Money::from_kobo(12_000));
        assert_eq!(updated.created_at, soap.created_at);

        assert!(repo.delete(&soap.id).await.unwrap());
        assert!(repo.get_by_id(&soap.id).await.unwrap().is_none());
        assert!(!repo.delete(&soap.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (_db, repo) = seeded().await;
        let err = repo
            .update("nope", &InventoryItemInput::new("Soap", Money::from_kobo(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let (_db, repo) = seeded().await;
        let err = repo
            .create(&InventoryItemInput::new("Refund", Money::from_kobo(-1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(repo.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_unsupported_platform_reads_empty_writes_fail() {
        let repo = Database::unsupported().inventory();
        let input = InventoryItemInput::new("Soap", Money::from_kobo(30_000));

        assert!(repo.get_all().await.unwrap().is_empty());
        assert!(repo.get_by_id("x").await.unwrap().is_none());
        assert!(repo.search("so").await.unwrap().is_empty());
        assert_eq!(repo.count().await.unwrap(), 0);

        assert!(matches!(repo.create(&input).await, Err(DbError::UnsupportedPlatform)));
        assert!(matches!(repo.update("x", &input).await, Err(DbError::UnsupportedPlatform)));
        assert!(matches!(repo.delete("x").await, Err(DbError::UnsupportedPlatform)));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("soap"), "soap");
    }
}
