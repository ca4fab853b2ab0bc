//! # Settings and Usage
//!
//! A small key/value store (`app_settings`) for flags and counters, plus
//! the monthly receipt allowance built on top of it.
//!
//! ## Keys
//! ```text
//! help_guide_seen          "true" once the help guide was dismissed
//! onboarding_complete      "true" once the profile screen was finished
//! usage.receipts.2026-10   receipts created in October 2026 (integer text)
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use slipbook_core::format::to_iso8601;
use slipbook_core::validation::validate_setting_key;
use slipbook_core::{billing_period, billing_period_key, Setting, UsageSummary};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::pool::Database;

pub const HELP_GUIDE_SEEN: &str = "help_guide_seen";
pub const ONBOARDING_COMPLETE: &str = "onboarding_complete";

const USAGE_PREFIX: &str = "usage.receipts.";

/// Counter key for the billing period containing `at`.
pub fn usage_counter_key(at: DateTime<Utc>) -> String {
    format!("{}{}", USAGE_PREFIX, billing_period_key(at))
}

/// Adds `by` to an integer setting inside an open transaction and returns
/// the new value. Missing keys start at zero.
pub(crate) async fn increment_counter_in(
    conn: &mut SqliteConnection,
    key: &str,
    by: i64,
) -> DbResult<i64> {
    sqlx::query(
        r#"
        INSERT INTO app_settings (key, value) VALUES (?1, CAST(?2 AS TEXT))
        ON CONFLICT(key) DO UPDATE SET
            value = CAST(CAST(value AS INTEGER) + ?2 AS TEXT)
        "#,
    )
    .bind(key)
    .bind(by)
    .execute(&mut *conn)
    .await?;

    let value: i64 =
        sqlx::query_scalar("SELECT CAST(value AS INTEGER) FROM app_settings WHERE key = ?1")
            .bind(key)
            .fetch_one(&mut *conn)
            .await?;

    Ok(value)
}

// =============================================================================
// Settings
// =============================================================================

/// Repository for the key/value settings store.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: Database,
}

impl SettingsRepository {
    pub fn new(db: Database) -> Self {
        SettingsRepository { db }
    }

    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(None);
        };

        let value = sqlx::query_scalar("SELECT value FROM app_settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(pool)
            .await?;

        Ok(value)
    }

    /// Inserts or replaces a value.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        validate_setting_key(key)?;
        let pool = self.db.writer().await?;

        debug!(key = %key, "Writing setting");

        sqlx::query(
            r#"
            INSERT INTO app_settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Removes a key. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> DbResult<bool> {
        let pool = self.db.writer().await?;

        let result = sqlx::query("DELETE FROM app_settings WHERE key = ?1")
            .bind(key)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Every setting, ordered by key.
    pub async fn get_all(&self) -> DbResult<Vec<Setting>> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(Vec::new());
        };

        let settings = sqlx::query_as("SELECT key, value FROM app_settings ORDER BY key")
            .fetch_all(pool)
            .await?;

        Ok(settings)
    }

    /// Reads a flag; anything other than `"true"` (including absence) is false.
    pub async fn get_bool(&self, key: &str) -> DbResult<bool> {
        Ok(self.get(key).await?.as_deref() == Some("true"))
    }

    pub async fn set_bool(&self, key: &str, value: bool) -> DbResult<()> {
        self.set(key, if value { "true" } else { "false" }).await
    }

    /// Reads a JSON-encoded value.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw).await
    }

    /// Atomically adds `by` to an integer setting.
    pub async fn increment_counter(&self, key: &str, by: i64) -> DbResult<i64> {
        validate_setting_key(key)?;
        let pool = self.db.writer().await?;

        let mut tx = pool.begin().await?;
        let value = increment_counter_in(&mut tx, key, by).await?;
        tx.commit().await?;

        Ok(value)
    }

    /// Integer setting; absent or unparsable reads as zero.
    pub async fn get_counter(&self, key: &str) -> DbResult<i64> {
        Ok(self
            .get(key)
            .await?
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0))
    }

    pub async fn has_seen_help_guide(&self) -> DbResult<bool> {
        self.get_bool(HELP_GUIDE_SEEN).await
    }

    pub async fn mark_help_guide_seen(&self) -> DbResult<()> {
        self.set_bool(HELP_GUIDE_SEEN, true).await
    }

    pub async fn is_onboarding_complete(&self) -> DbResult<bool> {
        self.get_bool(ONBOARDING_COMPLETE).await
    }

    pub async fn mark_onboarding_complete(&self) -> DbResult<()> {
        self.set_bool(ONBOARDING_COMPLETE, true).await
    }
}

// =============================================================================
// Usage
// =============================================================================

/// Monthly receipt allowance.
///
/// ## Tier Gate
/// ```text
/// "New Receipt" tapped
///      │
///      ▼
/// usage.ensure_can_create()  ── Err(UsageLimitReached) ──► upgrade screen
///      │ Ok
///      ▼
/// receipts().save()  ── bumps usage.receipts.<YYYY-MM> in the same transaction
/// ```
///
/// Deleting a receipt does not give the allowance back.
#[derive(Debug, Clone)]
pub struct UsageRepository {
    db: Database,
    limit: Option<u32>,
}

impl UsageRepository {
    pub fn new(db: Database, limit: Option<u32>) -> Self {
        UsageRepository { db, limit }
    }

    /// Usage for the current calendar month.
    pub async fn current(&self) -> DbResult<UsageSummary> {
        self.for_period_containing(Utc::now()).await
    }

    /// Usage for the calendar month containing `at`.
    pub async fn for_period_containing(&self, at: DateTime<Utc>) -> DbResult<UsageSummary> {
        let (period_start, period_end) = billing_period(at);
        let used = SettingsRepository::new(self.db.clone())
            .get_counter(&usage_counter_key(at))
            .await?;

        Ok(UsageSummary {
            period_start,
            period_end,
            used,
            limit: self.limit,
        })
    }

    pub async fn can_create_receipt(&self) -> DbResult<bool> {
        Ok(!self.current().await?.limit_reached())
    }

    /// Fails with `UsageLimitReached` once this month's allowance is used.
    pub async fn ensure_can_create(&self) -> DbResult<()> {
        self.current().await?.check()?;
        Ok(())
    }

    /// Receipts currently stored with a `created_at` in the month containing
    /// `at`. Unlike the counter, this drops when receipts are deleted.
    pub async fn receipts_in_period(&self, at: DateTime<Utc>) -> DbResult<i64> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(0);
        };
        let (start, end) = billing_period(at);

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM receipts WHERE created_at >= ?1 AND created_at < ?2",
        )
        .bind(to_iso8601(start))
        .bind(to_iso8601(end))
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::DbConfig;
    use chrono::TimeZone;
    use serde::Deserialize;
    use slipbook_core::ValidationError;

    async fn db() -> Database {
        Database::open(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_get_overwrite_remove() {
        let settings = db().await.settings();

        assert_eq!(settings.get("theme").await.unwrap(), None);

        settings.set("theme", "light").await.unwrap();
        settings.set("theme", "dark").await.unwrap();
        assert_eq!(settings.get("theme").await.unwrap().as_deref(), Some("dark"));

        let all = settings.get_all().await.unwrap();
        assert_eq!(all.len(), 1);

        assert!(settings.remove("theme").await.unwrap());
        assert!(!settings.remove("theme").await.unwrap());
        assert_eq!(settings.get("theme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_key_rejected() {
        let settings = db().await.settings();
        assert!(matches!(
            settings.set(" ", "x").await,
            Err(DbError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[tokio::test]
    async fn test_flags() {
        let settings = db().await.settings();

        assert!(!settings.has_seen_help_guide().await.unwrap());
        settings.mark_help_guide_seen().await.unwrap();
        assert!(settings.has_seen_help_guide().await.unwrap());

        assert!(!settings.is_onboarding_complete().await.unwrap());
        settings.mark_onboarding_complete().await.unwrap();
        assert!(settings.is_onboarding_complete().await.unwrap());
    }

    #[tokio::test]
    async fn test_json_values() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Layout {
            paper_width: u8,
            show_logo: bool,
        }

        let settings = db().await.settings();
        let layout = Layout {
            paper_width: 58,
            show_logo: true,
        };
        settings.set_json("layout", &layout).await.unwrap();
        assert_eq!(settings.get_json::<Layout>("layout").await.unwrap(), Some(layout));

        settings.set("broken", "{not json").await.unwrap();
        assert!(settings.get_json::<Layout>("broken").await.is_err());
    }

    #[tokio::test]
    async fn test_counters() {
        let settings = db().await.settings();
        assert_eq!(settings.get_counter("visits").await.unwrap(), 0);
        assert_eq!(settings.increment_counter("visits", 1).await.unwrap(), 1);
        assert_eq!(settings.increment_counter("visits", 2).await.unwrap(), 3);
        assert_eq!(settings.get_counter("visits").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_usage_limit() {
        let db = db().await;
        let key = usage_counter_key(Utc::now());
        db.settings().increment_counter(&key, 19).await.unwrap();

        let usage = db.usage(Some(20));
        assert!(usage.can_create_receipt().await.unwrap());
        assert_eq!(usage.current().await.unwrap().remaining(), Some(1));

        db.settings().increment_counter(&key, 1).await.unwrap();
        assert!(!usage.can_create_receipt().await.unwrap());
        assert!(matches!(
            usage.ensure_can_create().await,
            Err(DbError::UsageLimitReached { used: 20, limit: 20 })
        ));

        assert!(db.usage(None).can_create_receipt().await.unwrap());
    }

    #[tokio::test]
    async fn test_usage_is_per_month() {
        let db = db().await;
        let october = Utc.with_ymd_and_hms(2026, 10, 31, 23, 0, 0).unwrap();
        let november = Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap();
        db.settings()
            .increment_counter(&usage_counter_key(october), 5)
            .await
            .unwrap();

        let usage = db.usage(Some(20));
        assert_eq!(usage.for_period_containing(october).await.unwrap().used, 5);
        assert_eq!(usage.for_period_containing(november).await.unwrap().used, 0);
        assert_eq!(usage_counter_key(october), "usage.receipts.2026-10");
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let db = Database::unsupported();
        let settings = db.settings();

        assert_eq!(settings.get("theme").await.unwrap(), None);
        assert!(!settings.has_seen_help_guide().await.unwrap());
        assert!(settings.get_all().await.unwrap().is_empty());
        assert!(matches!(
            settings.set("theme", "dark").await,
            Err(DbError::UnsupportedPlatform)
        ));
        assert_eq!(db.usage(Some(20)).current().await.unwrap().used, 0);
    }
}
