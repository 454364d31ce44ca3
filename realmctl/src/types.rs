//! Common type definitions shared across the database layer and services.
//!
//! This module defines:
//! - Type aliases for entity IDs ([`AccountId`], [`CharacterId`])
//! - [`StoreRole`], the logical databases the game server persists into
//! - [`format_store_timestamp`] / [`parse_store_timestamp`], the one timestamp format used to talk
//!   to the stores
//!
//! # Stores
//!
//! The game server keeps its state in three logical databases, usually hosted by the same
//! server:
//!
//! - [`StoreRole::Account`]: login accounts (`account` table)
//! - [`StoreRole::Common`]: shared tables, including the GM list (`gmlist` table)
//! - [`StoreRole::Player`]: characters (`player` table)
//!
//! The physical database name for each role comes from the server configuration.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for IDs
pub type AccountId = i64;
pub type CharacterId = i64;

/// Layout of `DATETIME` values as exchanged with the stores.
const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Logical database a connection is opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreRole {
    Account,
    Common,
    Player,
}

impl fmt::Display for StoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreRole::Account => write!(f, "account"),
            StoreRole::Common => write!(f, "common"),
            StoreRole::Player => write!(f, "player"),
        }
    }
}

/// Render a timestamp the way the stores' `DATETIME` columns expect it.
///
/// Both MySQL and SQLite compare values in this layout correctly, so it is used for bound
/// parameters as well as for fixture data.
pub fn format_store_timestamp(at: NaiveDateTime) -> String {
    at.format(STORE_TIMESTAMP_FORMAT).to_string()
}

/// Parse a `DATETIME` value read back through `CAST(... AS CHAR)`.
///
/// Returns `None` for values chrono cannot represent, most notably MySQL's zero date
/// (`0000-00-00 00:00:00`), which the game server writes for "never".
pub fn parse_store_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, STORE_TIMESTAMP_FORMAT))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_timestamp_round_trip() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(17, 4, 5).unwrap();
        let raw = format_store_timestamp(at);
        assert_eq!(raw, "2024-03-09 17:04:05");
        assert_eq!(parse_store_timestamp(&raw), Some(at));
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let parsed = parse_store_timestamp("2024-03-09 17:04:05.250").unwrap();
        assert_eq!(format_store_timestamp(parsed), "2024-03-09 17:04:05");
    }

    #[test]
    fn test_zero_date_is_none() {
        assert_eq!(parse_store_timestamp("0000-00-00 00:00:00"), None);
        assert_eq!(parse_store_timestamp(""), None);
    }

    #[test]
    fn test_store_role_display() {
        assert_eq!(StoreRole::Account.to_string(), "account");
        assert_eq!(StoreRole::Common.to_string(), "common");
        assert_eq!(StoreRole::Player.to_string(), "player");
    }
}
