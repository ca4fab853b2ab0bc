//! # slipbook-db: Database Layer for Slipbook
//!
//! Local persistence for receipts, the business profile, the inventory
//! catalog and app settings. Everything lives in one SQLite file on the
//! device, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Slipbook Data Flow                               │
//! │                                                                         │
//! │  Screen action (Save receipt)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   slipbook-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (receipt.rs)  │    │ (versioned)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ lazy open     │    │ ReceiptRepo   │    │ v1 base      │  │   │
//! │  │   │ once, shared  │◄───│ InventoryRepo │    │ v2..v6 add   │  │   │
//! │  │   │ by every call │    │ SettingsRepo  │    │ columns      │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <app data dir>/slipbook.db                                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - The lazily-opened [`Database`] handle
//! - [`migrations`] - Versioned, additive schema changes
//! - [`error`] - Database error types and user-facing messages
//! - [`config`] - Startup configuration from the environment
//! - [`numbering`] - Receipt number generation
//! - [`repository`] - Repository implementations
//! - [`schema`] - Columns present in the open database
//!
//! ## Usage
//!
//! ```rust,ignore
//! use slipbook_db::{AppConfig, Database};
//!
//! let config = AppConfig::from_env()?;
//! let db = Database::for_current_platform(config.db_config());
//!
//! // Nothing touches the disk until the first call
//! let receipts = db.receipts().get_all().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod numbering;
pub mod pool;
pub mod repository;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::AppConfig;
pub use error::{DbError, DbResult, ErrorKind};
pub use migrations::MigrationReport;
pub use numbering::generate_receipt_number;
pub use pool::{Database, DbConfig};
pub use schema::ColumnSet;

// Repository re-exports for convenience
pub use repository::business::BusinessProfileRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::receipt::ReceiptRepository;
pub use repository::report::ReportRepository;
pub use repository::settings::{SettingsRepository, UsageRepository};

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Calling this twice is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,slipbook=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
