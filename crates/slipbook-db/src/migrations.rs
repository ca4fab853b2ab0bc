//! # Database Migrations
//!
//! Versioned, additive schema migrations for Slipbook.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  First repository call (or Database::ensure_schema)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CREATE TABLE IF NOT EXISTS schema_migrations                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare MIGRATIONS vs applied versions                                │
//! │       │                                                                 │
//! │       ├── v1 base tables          ✓ (already applied)                 │
//! │       ├── v2 receipt payment cols ✓ (already applied)                 │
//! │       └── v6 indexes              ⬜ (NEW - needs to run)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run each pending step in order                                        │
//! │       │                                                                 │
//! │       ├── Step::Sql        failure is fatal (MigrationFailed)          │
//! │       └── Step::AddColumn  checks PRAGMA table_info first;             │
//! │                            failure is logged, version left unrecorded  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Record completed versions in schema_migrations                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Append a `Migration` with the next version number
//! 2. Only add tables, columns and indexes; never drop or rename
//! 3. Use `IF NOT EXISTS` in `Step::Sql`, and `Step::AddColumn` for columns
//! 4. **NEVER** modify an existing migration

use chrono::Utc;
use slipbook_core::format::to_iso8601;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

/// One step of a migration.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Idempotent DDL. A failure aborts startup.
    Sql(&'static str),

    /// `ALTER TABLE ... ADD COLUMN`, skipped when the column already
    /// exists. A failure is logged and retried on the next start.
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub steps: &'static [Step],
}

/// Outcome of one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Versions recorded by this run.
    pub newly_applied: Vec<i64>,
    /// Versions with a column that could not be added; the affected
    /// fields read back as absent until a later run succeeds.
    pub degraded: Vec<i64>,
}

impl MigrationReport {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

const CREATE_MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version     INTEGER PRIMARY KEY NOT NULL,
    description TEXT NOT NULL,
    applied_at  TEXT NOT NULL
)
"#;

/// Schema history, oldest first.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "base tables",
        steps: &[Step::Sql(
            r#"
            CREATE TABLE IF NOT EXISTS receipts (
                id             TEXT PRIMARY KEY NOT NULL,
                receipt_number TEXT NOT NULL UNIQUE,
                total_kobo     INTEGER NOT NULL,
                created_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS receipt_items (
                id          TEXT PRIMARY KEY NOT NULL,
                receipt_id  TEXT NOT NULL REFERENCES receipts(id) ON DELETE CASCADE,
                description TEXT NOT NULL,
                quantity    REAL NOT NULL,
                price_kobo  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS business_profile (
                id         TEXT PRIMARY KEY NOT NULL,
                name       TEXT NOT NULL,
                phone      TEXT NOT NULL,
                address    TEXT,
                cac_number TEXT,
                logo_uri   TEXT
            );
            "#,
        )],
    },
    Migration {
        version: 2,
        description: "receipt payment status, customer name and notes",
        steps: &[
            Step::AddColumn {
                table: "receipts",
                column: "payment_status",
                definition: "TEXT",
            },
            Step::AddColumn {
                table: "receipts",
                column: "customer_name",
                definition: "TEXT",
            },
            Step::AddColumn {
                table: "receipts",
                column: "notes",
                definition: "TEXT",
            },
        ],
    },
    Migration {
        version: 3,
        description: "inventory catalog",
        steps: &[Step::Sql(
            r#"
            CREATE TABLE IF NOT EXISTS inventory_items (
                id          TEXT PRIMARY KEY NOT NULL,
                name        TEXT NOT NULL,
                description TEXT,
                price_kobo  INTEGER NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_inventory_items_name
                ON inventory_items(name COLLATE NOCASE);
            "#,
        )],
    },
    Migration {
        version: 4,
        description: "customer phone, amount paid, profile website and footer",
        steps: &[
            Step::AddColumn {
                table: "receipts",
                column: "customer_phone",
                definition: "TEXT",
            },
            Step::AddColumn {
                table: "receipts",
                column: "amount_paid_kobo",
                definition: "INTEGER",
            },
            Step::AddColumn {
                table: "business_profile",
                column: "website_uri",
                definition: "TEXT",
            },
            Step::AddColumn {
                table: "business_profile",
                column: "custom_footer",
                definition: "TEXT",
            },
        ],
    },
    Migration {
        version: 5,
        description: "settings store",
        steps: &[Step::Sql(
            r#"
            CREATE TABLE IF NOT EXISTS app_settings (
                key   TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );
            "#,
        )],
    },
    Migration {
        version: 6,
        description: "receipt listing indexes",
        steps: &[Step::Sql(
            r#"
            CREATE INDEX IF NOT EXISTS idx_receipts_created_at
                ON receipts(created_at);

            CREATE INDEX IF NOT EXISTS idx_receipt_items_receipt_id
                ON receipt_items(receipt_id);
            "#,
        )],
    },
];

/// Runs all pending migrations.
///
/// ## Safety
/// - Idempotent: safe to run on every start
/// - Additive: never drops or rewrites data
/// - Ordered: versions run ascending
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<MigrationReport> {
    run_migrations_with(pool, MIGRATIONS).await
}

pub(crate) async fn run_migrations_with(
    pool: &SqlitePool,
    migrations: &[Migration],
) -> DbResult<MigrationReport> {
    info!("Checking for pending migrations");

    sqlx::query(CREATE_MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| DbError::MigrationFailed(e.to_string()))?;

    let applied: HashSet<i64> =
        sqlx::query_scalar::<_, i64>("SELECT version FROM schema_migrations")
            .fetch_all(pool)
            .await
            .map_err(|e| DbError::MigrationFailed(e.to_string()))?
            .into_iter()
            .collect();

    let mut report = MigrationReport::default();

    for migration in migrations.iter().filter(|m| !applied.contains(&m.version)) {
        debug!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );

        let mut complete = true;
        for step in migration.steps {
            match *step {
                Step::Sql(sql) => {
                    sqlx::raw_sql(sql).execute(pool).await.map_err(|e| {
                        DbError::MigrationFailed(format!(
                            "v{} ({}): {}",
                            migration.version, migration.description, e
                        ))
                    })?;
                }
                Step::AddColumn {
                    table,
                    column,
                    definition,
                } => {
                    complete &= add_column(pool, table, column, definition).await;
                }
            }
        }

        if complete {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO schema_migrations (version, description, applied_at)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(migration.version)
            .bind(migration.description)
            .bind(to_iso8601(Utc::now()))
            .execute(pool)
            .await
            .map_err(|e| DbError::MigrationFailed(e.to_string()))?;
            report.newly_applied.push(migration.version);
        } else {
            report.degraded.push(migration.version);
        }
    }

    if report.is_degraded() {
        warn!(versions = ?report.degraded, "Schema is degraded; affected fields read as absent");
    }
    info!(applied = ?report.newly_applied, "Migrations complete");

    Ok(report)
}

/// Adds a column unless it is already there. Returns whether the column
/// exists afterwards.
async fn add_column(pool: &SqlitePool, table: &str, column: &str, definition: &str) -> bool {
    match column_exists(pool, table, column).await {
        Ok(true) => {
            debug!(table, column, "Column already present");
            return true;
        }
        Ok(false) => {}
        Err(e) => {
            warn!(table, column, error = %e, "Could not inspect table");
            return false;
        }
    }

    let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition);
    match sqlx::query(&sql).execute(pool).await {
        Ok(_) => {
            debug!(table, column, "Column added");
            true
        }
        // Another call site added it between the check and the ALTER
        Err(e) if e.to_string().contains("duplicate column name") => true,
        Err(e) => {
            warn!(table, column, error = %e, "Could not add column; will retry on next start");
            false
        }
    }
}

async fn column_exists(pool: &SqlitePool, table: &str, column: &str) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// Returns `(known, applied)` migration counts.
///
/// ## Usage
/// For diagnostics and health checks.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(pool)
        .await?;

    Ok((MIGRATIONS.len(), applied as usize))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn raw_pool() -> (Database, SqlitePool) {
        let db = Database::new(DbConfig::in_memory().run_migrations(false));
        let pool = db.pool().await.unwrap().clone();
        (db, pool)
    }

    async fn columns(pool: &SqlitePool, table: &str) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?1)")
            .bind(table)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[test]
    fn test_versions_are_ascending_and_unique() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
    }

    #[tokio::test]
    async fn test_fresh_database_gets_full_schema() {
        let (_db, pool) = raw_pool().await;
        let report = run_migrations(&pool).await.unwrap();

        assert_eq!(report.newly_applied, vec![1, 2, 3, 4, 5, 6]);
        assert!(!report.is_degraded());

        let receipts = columns(&pool, "receipts").await;
        for column in [
            "payment_status",
            "customer_name",
            "notes",
            "customer_phone",
            "amount_paid_kobo",
        ] {
            assert!(receipts.iter().any(|c| c == column), "missing {}", column);
        }

        let profile = columns(&pool, "business_profile").await;
        assert!(profile.iter().any(|c| c == "custom_footer"));

        assert_eq!(migration_status(&pool).await.unwrap(), (6, 6));
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let (_db, pool) = raw_pool().await;
        run_migrations(&pool).await.unwrap();

        let again = run_migrations(&pool).await.unwrap();
        assert!(again.newly_applied.is_empty());
        assert!(again.degraded.is_empty());
    }

    #[tokio::test]
    async fn test_existing_column_is_skipped() {
        let (_db, pool) = raw_pool().await;

        // A database from before versioning: customer_name already added.
        sqlx::raw_sql(
            r#"
            CREATE TABLE receipts (
                id TEXT PRIMARY KEY NOT NULL,
                receipt_number TEXT NOT NULL UNIQUE,
                total_kobo INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                customer_name TEXT
            );
            INSERT INTO receipts (id, receipt_number, total_kobo, created_at, customer_name)
            VALUES ('old', 'OLD-1-1', 500, '2025-01-01T00:00:00.000Z', 'Ada');
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let report = run_migrations(&pool).await.unwrap();
        assert!(!report.is_degraded());
        assert!(report.newly_applied.contains(&2));

        let name: Option<String> =
            sqlx::query_scalar("SELECT customer_name FROM receipts WHERE id = 'old'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_failed_column_is_degraded_and_retried() {
        let (_db, pool) = raw_pool().await;

        const BROKEN: &[Migration] = &[
            Migration {
                version: 1,
                description: "column on a table that does not exist yet",
                steps: &[Step::AddColumn {
                    table: "ghosts",
                    column: "name",
                    definition: "TEXT",
                }],
            },
            Migration {
                version: 2,
                description: "later migration still runs",
                steps: &[Step::Sql("CREATE TABLE IF NOT EXISTS later (id TEXT)")],
            },
        ];

        let report = run_migrations_with(&pool, BROKEN).await.unwrap();
        assert_eq!(report.degraded, vec![1]);
        assert_eq!(report.newly_applied, vec![2]);

        sqlx::query("CREATE TABLE ghosts (id TEXT)")
            .execute(&pool)
            .await
            .unwrap();

        let retry = run_migrations_with(&pool, BROKEN).await.unwrap();
        assert_eq!(retry.newly_applied, vec![1]);
        assert!(columns(&pool, "ghosts").await.iter().any(|c| c == "name"));
    }

    #[tokio::test]
    async fn test_status_is_known_then_applied() {
        let (_db, pool) = raw_pool().await;
        let without_v4: Vec<Migration> =
            MIGRATIONS.iter().copied().filter(|m| m.version != 4).collect();
        run_migrations_with(&pool, &without_v4).await.unwrap();

        let (known, applied) = migration_status(&pool).await.unwrap();
        assert_eq!(known, MIGRATIONS.len());
        assert_eq!(applied, MIGRATIONS.len() - 1);
    }

    #[tokio::test]
    async fn test_bad_sql_is_fatal() {
        let (_db, pool) = raw_pool().await;

        const BAD: &[Migration] = &[Migration {
            version: 1,
            description: "typo",
            steps: &[Step::Sql("CREATE TABEL nope (id TEXT)")],
        }];

        let err = run_migrations_with(&pool, BAD).await.unwrap_err();
        assert!(matches!(err, DbError::MigrationFailed(_)));
    }
}
