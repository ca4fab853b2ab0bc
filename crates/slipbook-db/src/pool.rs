//! # Database Handle
//!
//! Connection setup and the shared handle every repository goes through.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Handle                                    │
//! │                                                                         │
//! │  App Startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(DbConfig)  ← nothing opened yet                         │
//! │       │                                                                 │
//! │       │ clone() freely; every clone shares one Arc                     │
//! │       ▼                                                                 │
//! │  First repository call                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OnceCell::get_or_try_init ── concurrent callers wait here            │
//! │       │                                                                 │
//! │       ├── connect (WAL, NORMAL sync, foreign keys)                     │
//! │       ├── run migrations                                               │
//! │       └── record the columns that actually exist                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │  SqlitePool (exactly one connection,    │                           │
//! │  │  kept for the life of the process)      │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │                                                                         │
//! │  A failed open leaves the cell empty; the next call tries again.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Unsupported Platforms
//! Where local storage is unavailable (`wasm32`), the handle is built with
//! [`Database::unsupported`]. Writes fail with
//! [`DbError::UnsupportedPlatform`]; reads return empty lists and `None`.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations::{self, MigrationReport};
use crate::repository::business::BusinessProfileRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::receipt::ReceiptRepository;
use crate::repository::report::ReportRepository;
use crate::repository::settings::{SettingsRepository, UsageRepository};
use crate::schema::ColumnSet;

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/slipbook.db")
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Connections in the pool.
    /// Default: 1 (one process, one connection)
    pub max_connections: u32,

    /// How long to wait for the connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// How long SQLite waits on a locked file before failing.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Whether to migrate when the connection is first opened.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for the given file. The file is created if
    /// it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 1,
            connect_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Each handle gets its own private database.
    pub fn in_memory() -> Self {
        DbConfig {
            connect_timeout: Duration::from_secs(5),
            ..DbConfig::new(MEMORY_PATH)
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(MEMORY_PATH)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared storage handle.
///
/// ## Lifetime
/// Construct one per process and pass clones to whoever needs storage.
/// The connection opens on first use and stays open until [`close`]
/// or process exit.
///
/// [`close`]: Database::close
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<Backend>,
}

#[derive(Debug)]
enum Backend {
    Sqlite(SqliteState),
    Unsupported,
}

#[derive(Debug)]
struct SqliteState {
    config: DbConfig,
    pool: OnceCell<SqlitePool>,
    schema: OnceCell<Schema>,
}

/// Outcome of the first migration run in this process.
#[derive(Debug)]
struct Schema {
    report: MigrationReport,
    columns: ColumnSet,
}

impl Database {
    /// Creates a handle without touching the disk.
    pub fn new(config: DbConfig) -> Self {
        Database {
            inner: Arc::new(Backend::Sqlite(SqliteState {
                config,
                pool: OnceCell::new(),
                schema: OnceCell::new(),
            })),
        }
    }

    /// Creates a handle and opens it immediately, so that configuration
    /// and schema errors surface at startup.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let db = Database::open(DbConfig::in_memory()).await?;
    /// let receipts = db.receipts().get_all().await?;
    /// ```
    pub async fn open(config: DbConfig) -> DbResult<Self> {
        let db = Database::new(config);
        db.ensure_schema().await?;
        Ok(db)
    }

    /// A handle for platforms without local storage.
    pub fn unsupported() -> Self {
        Database {
            inner: Arc::new(Backend::Unsupported),
        }
    }

    /// [`new`](Self::new) where SQLite is available, otherwise
    /// [`unsupported`](Self::unsupported).
    pub fn for_current_platform(config: DbConfig) -> Self {
        if cfg!(target_arch = "wasm32") {
            Database::unsupported()
        } else {
            Database::new(config)
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(*self.inner, Backend::Sqlite(_))
    }

    /// Opens the connection and brings the schema up to date.
    ///
    /// Idempotent: after the first success further calls return the
    /// cached report without touching the database.
    pub async fn ensure_schema(&self) -> DbResult<MigrationReport> {
        match &*self.inner {
            Backend::Unsupported => Err(DbError::UnsupportedPlatform),
            Backend::Sqlite(state) => {
                let pool = state.connect().await?;
                Ok(state.migrate(pool).await?.report.clone())
            }
        }
    }

    /// Pool for statements that change data.
    pub(crate) async fn writer(&self) -> DbResult<&SqlitePool> {
        self.reader().await?.ok_or(DbError::UnsupportedPlatform)
    }

    /// Pool for queries; `None` where storage is unsupported.
    pub(crate) async fn reader(&self) -> DbResult<Option<&SqlitePool>> {
        match &*self.inner {
            Backend::Unsupported => Ok(None),
            Backend::Sqlite(state) => {
                let pool = state.connect().await?;
                if state.config.run_migrations {
                    state.migrate(pool).await?;
                }
                Ok(Some(pool))
            }
        }
    }

    /// Columns present in the open database.
    ///
    /// Cached alongside the migration report; re-read on every call when
    /// migrations are disabled and have not run yet.
    pub(crate) async fn columns(&self) -> DbResult<Cow<'_, ColumnSet>> {
        match &*self.inner {
            Backend::Unsupported => Ok(Cow::Owned(ColumnSet::default())),
            Backend::Sqlite(state) => {
                let pool = state.connect().await?;
                if state.config.run_migrations {
                    return Ok(Cow::Borrowed(&state.migrate(pool).await?.columns));
                }
                match state.schema.get() {
                    Some(schema) => Ok(Cow::Borrowed(&schema.columns)),
                    None => Ok(Cow::Owned(ColumnSet::load(pool).await?)),
                }
            }
        }
    }

    /// Returns the connection pool.
    ///
    /// ## Usage
    /// For advanced queries not covered by repositories.
    /// Prefer using repository methods when available.
    pub async fn pool(&self) -> DbResult<&SqlitePool> {
        match &*self.inner {
            Backend::Unsupported => Err(DbError::UnsupportedPlatform),
            Backend::Sqlite(state) => state.connect().await,
        }
    }

    pub fn receipts(&self) -> ReceiptRepository {
        ReceiptRepository::new(self.clone())
    }

    pub fn business_profile(&self) -> BusinessProfileRepository {
        BusinessProfileRepository::new(self.clone())
    }

    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.clone())
    }

    /// Usage counters checked against `monthly_limit` (`None` = unlimited).
    pub fn usage(&self, monthly_limit: Option<u32>) -> UsageRepository {
        UsageRepository::new(self.clone(), monthly_limit)
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.clone())
    }

    /// `(known, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        let pool = self.writer().await?;
        migrations::migration_status(pool).await
    }

    /// Closes the connection.
    ///
    /// ## Note
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        if let Backend::Sqlite(state) = &*self.inner {
            if let Some(pool) = state.pool.get() {
                info!("Closing database connection");
                pool.close().await;
            }
        }
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        match self.reader().await {
            Ok(Some(pool)) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
            _ => false,
        }
    }
}

impl SqliteState {
    async fn connect(&self) -> DbResult<&SqlitePool> {
        self.pool.get_or_try_init(|| open_pool(&self.config)).await
    }

    async fn migrate(&self, pool: &SqlitePool) -> DbResult<&Schema> {
        self.schema
            .get_or_try_init(|| async {
                let report = migrations::run_migrations(pool).await?;
                let columns = ColumnSet::load(pool).await?;
                Ok::<_, DbError>(Schema { report, columns })
            })
            .await
    }
}

/// Opens the pool.
///
/// ## What This Does
/// 1. Creates the database file (and its directory) if missing
/// 2. Configures SQLite:
///    - WAL journal mode
///    - NORMAL synchronous (balance of safety/speed)
///    - Foreign keys enabled
/// 3. Keeps the connection open indefinitely
async fn open_pool(config: &DbConfig) -> DbResult<SqlitePool> {
    info!(path = %config.database_path.display(), "Opening database");

    let base = if config.is_in_memory() {
        SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
    } else {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DbError::ConnectionFailed(format!("{}: {}", parent.display(), e)))?;
            }
        }
        SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
    };

    let connect_options = base
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        // SQLite has them disabled by default for backwards compatibility
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout);

    debug!("Connection options configured");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect_options)
        .await
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

    info!(max_connections = config.max_connections, "Database opened");

    Ok(pool)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        assert!(db.is_supported());
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_ensure_schema_twice_is_noop() {
        let db = Database::new(DbConfig::in_memory());

        let first = db.ensure_schema().await.unwrap();
        assert_eq!(first.newly_applied.len(), migrations::MIGRATIONS.len());

        let second = db.ensure_schema().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(db.migration_status().await.unwrap(), (6, 6));
    }

    #[tokio::test]
    async fn test_clones_share_one_connection() {
        let db = Database::new(DbConfig::in_memory());
        let other = db.clone();

        db.settings().set("shared", "yes").await.unwrap();
        assert_eq!(
            other.settings().get("shared").await.unwrap().as_deref(),
            Some("yes")
        );
    }

    #[tokio::test]
    async fn test_concurrent_first_use_opens_once() {
        let db = Database::new(DbConfig::in_memory());

        let (a, b) = tokio::join!(db.ensure_schema(), db.ensure_schema());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(db.migration_status().await.unwrap(), (6, 6));
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let db = Database::unsupported();
        assert!(!db.is_supported());
        assert!(!db.health_check().await);
        assert!(matches!(
            db.ensure_schema().await,
            Err(DbError::UnsupportedPlatform)
        ));
    }

    #[tokio::test]
    async fn test_file_database_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("slipbook.db");

        let db = Database::open(DbConfig::new(&path)).await.unwrap();
        db.settings().set("theme", "dark").await.unwrap();
        db.close().await;

        let reopened = Database::open(DbConfig::new(&path)).await.unwrap();
        assert!(reopened.ensure_schema().await.unwrap().newly_applied.is_empty());
        assert_eq!(
            reopened.settings().get("theme").await.unwrap().as_deref(),
            Some("dark")
        );
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(0)
            .busy_timeout(Duration::from_secs(1))
            .run_migrations(false);

        assert_eq!(config.max_connections, 1);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
