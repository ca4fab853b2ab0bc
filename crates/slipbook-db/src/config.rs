//! # Application Configuration
//!
//! Settings read once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`SLIPBOOK_*`)
//! 2. Defaults (this file)
//!
//! Configuration is read-only after startup. Anything the user changes at
//! runtime lives in the settings table instead.

use chrono::{FixedOffset, Local};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;

/// Receipts per calendar month on the free tier.
pub const DEFAULT_MONTHLY_RECEIPT_LIMIT: u32 = 20;

/// File name of the database inside the app data directory.
pub const DATABASE_FILE_NAME: &str = "slipbook.db";

pub const ENV_DB_PATH: &str = "SLIPBOOK_DB_PATH";
pub const ENV_MONTHLY_RECEIPT_LIMIT: &str = "SLIPBOOK_MONTHLY_RECEIPT_LIMIT";
pub const ENV_UTC_OFFSET: &str = "SLIPBOOK_UTC_OFFSET";

/// Widest offset in use anywhere (UTC+14).
const MAX_OFFSET_HOURS: i32 = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Where the SQLite file lives.
    pub database_path: PathBuf,

    /// Monthly receipt allowance; `None` means unlimited.
    pub monthly_receipt_limit: Option<u32>,

    /// Seconds east of UTC for displayed dates; `None` follows the device.
    pub utc_offset_seconds: Option<i32>,
}

impl AppConfig {
    /// Builds configuration from the process environment.
    ///
    /// ## Environment Variables
    /// - `SLIPBOOK_DB_PATH`: database file (default: platform data dir)
    /// - `SLIPBOOK_MONTHLY_RECEIPT_LIMIT`: a number, or `0`/`unlimited`
    ///   to disable the limit (default: 20)
    /// - `SLIPBOOK_UTC_OFFSET`: display offset such as `+01:00`, or `local`
    ///   (default: device time zone)
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        let monthly_receipt_limit = match lookup(ENV_MONTHLY_RECEIPT_LIMIT) {
            Some(raw) => parse_limit(&raw)?,
            None => Some(DEFAULT_MONTHLY_RECEIPT_LIMIT),
        };

        let utc_offset_seconds = match lookup(ENV_UTC_OFFSET) {
            Some(raw) => parse_offset(&raw)?,
            None => None,
        };

        Ok(AppConfig {
            database_path,
            monthly_receipt_limit,
            utc_offset_seconds,
        })
    }

    /// Offset that dates on screen and on shared receipts are shown in.
    pub fn display_offset(&self) -> FixedOffset {
        self.utc_offset_seconds
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| *Local::now().offset())
    }

    /// Connection settings for this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
    }
}

fn parse_limit(raw: &str) -> DbResult<Option<u32>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("unlimited") {
        return Ok(None);
    }
    match raw.parse::<u32>() {
        Ok(0) => Ok(None),
        Ok(limit) => Ok(Some(limit)),
        Err(_) => Err(DbError::Internal(format!(
            "{} must be a number or 'unlimited', got '{}'",
            ENV_MONTHLY_RECEIPT_LIMIT, raw
        ))),
    }
}

/// Parses `+HH:MM`, `-HHMM` or `local`.
fn parse_offset(raw: &str) -> DbResult<Option<i32>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("local") {
        return Ok(None);
    }

    let invalid = || {
        DbError::Internal(format!(
            "{} must look like +01:00 or 'local', got '{}'",
            ENV_UTC_OFFSET, raw
        ))
    };

    let (sign, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = raw.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };

    let digits = rest.replacen(':', "", 1);
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > MAX_OFFSET_HOURS || minutes > 59 {
        return Err(invalid());
    }

    Ok(Some(sign * (hours * 3600 + minutes * 60)))
}

/// Platform data directory.
///
/// - **macOS**: `~/Library/Application Support/com.slipbook.slipbook/slipbook.db`
/// - **Windows**: `%APPDATA%\slipbook\slipbook\data\slipbook.db`
/// - **Linux**: `~/.local/share/slipbook/slipbook.db`
pub fn default_database_path() -> DbResult<PathBuf> {
    let dirs = ProjectDirs::from("com", "slipbook", "slipbook").ok_or_else(|| {
        DbError::ConnectionFailed("Could not determine app data directory".to_string())
    })?;

    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .map_err(|e| DbError::ConnectionFailed(format!("{}: {}", data_dir.display(), e)))?;

    Ok(data_dir.join(DATABASE_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> DbResult<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_env_overrides() {
        let cfg = config(&[
            (ENV_DB_PATH, "/tmp/receipts.db"),
            (ENV_MONTHLY_RECEIPT_LIMIT, "50"),
        ])
        .unwrap();
        assert_eq!(cfg.database_path, PathBuf::from("/tmp/receipts.db"));
        assert_eq!(cfg.monthly_receipt_limit, Some(50));
        assert_eq!(cfg.db_config().database_path, PathBuf::from("/tmp/receipts.db"));
    }

    #[test]
    fn test_limit_defaults_and_unlimited() {
        let cfg = config(&[(ENV_DB_PATH, "/tmp/a.db")]).unwrap();
        assert_eq!(cfg.monthly_receipt_limit, Some(DEFAULT_MONTHLY_RECEIPT_LIMIT));

        for raw in ["0", "unlimited", " Unlimited "] {
            let cfg = config(&[(ENV_DB_PATH, "/tmp/a.db"), (ENV_MONTHLY_RECEIPT_LIMIT, raw)])
                .unwrap();
            assert_eq!(cfg.monthly_receipt_limit, None, "raw: {:?}", raw);
        }

        assert!(config(&[(ENV_DB_PATH, "/tmp/a.db"), (ENV_MONTHLY_RECEIPT_LIMIT, "lots")]).is_err());
    }

    #[test]
    fn test_display_offset() {
        let cfg = config(&[(ENV_DB_PATH, "/tmp/a.db"), (ENV_UTC_OFFSET, "+01:00")]).unwrap();
        assert_eq!(cfg.utc_offset_seconds, Some(3600));
        assert_eq!(cfg.display_offset(), FixedOffset::east_opt(3600).unwrap());

        let cfg = config(&[(ENV_DB_PATH, "/tmp/a.db"), (ENV_UTC_OFFSET, "-0530")]).unwrap();
        assert_eq!(cfg.utc_offset_seconds, Some(-(5 * 3600 + 30 * 60)));

        let cfg = config(&[(ENV_DB_PATH, "/tmp/a.db"), (ENV_UTC_OFFSET, "local")]).unwrap();
        assert_eq!(cfg.utc_offset_seconds, None);
        assert_eq!(cfg.display_offset(), *Local::now().offset());

        for raw in ["01:00", "+1", "+15:00", "+01:60", "UTC"] {
            assert!(
                config(&[(ENV_DB_PATH, "/tmp/a.db"), (ENV_UTC_OFFSET, raw)]).is_err(),
                "raw: {:?}",
                raw
            );
        }
    }
}
