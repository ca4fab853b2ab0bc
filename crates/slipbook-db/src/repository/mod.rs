//! # Repository Module
//!
//! Database repository implementations for Slipbook.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Caller (screen, seed binary, test)                                    │
//! │       │                                                                 │
//! │       │  db.receipts().save(&header, &items)                           │
//! │       ▼                                                                 │
//! │  ReceiptRepository                                                     │
//! │  ├── validate        (slipbook-core, before any statement)             │
//! │  ├── db.writer()     (lazy open + migrate, or UnsupportedPlatform)     │
//! │  └── pool.begin() … commit()                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository holds a clone of the [`Database`](crate::Database)
//! handle, so creating one is free.
//!
//! ## Available Repositories
//!
//! - [`ReceiptRepository`](receipt::ReceiptRepository) - Receipts with their items
//! - [`BusinessProfileRepository`](business::BusinessProfileRepository) - The singleton profile
//! - [`InventoryRepository`](inventory::InventoryRepository) - Catalog CRUD and search
//! - [`SettingsRepository`](settings::SettingsRepository) - Key/value flags
//! - [`UsageRepository`](settings::UsageRepository) - Monthly receipt counter
//! - [`ReportRepository`](report::ReportRepository) - Summaries and audits

pub mod business;
pub mod inventory;
pub mod receipt;
pub mod report;
pub mod settings;
