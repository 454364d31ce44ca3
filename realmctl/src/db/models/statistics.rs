//! Statistics models. Computed on demand, never persisted.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::ActiveUsersPolicy;

/// Counts read from the account store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountCounts {
    pub total: i64,
    pub created_in_window: i64,
    /// Only counted under [`ActiveUsersPolicy::AccountAvailDt`]
    pub available_in_window: Option<i64>,
}

/// Counts read from the player store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerCounts {
    pub total: i64,
    /// Only counted under [`ActiveUsersPolicy::PlayerLastPlay`]
    pub active_accounts_in_window: Option<i64>,
}

/// Point-in-time server statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    pub total_accounts: i64,
    pub total_characters: i64,
    pub accounts_created_in_window: i64,
    pub active_users_in_window: i64,
    pub active_users_policy: ActiveUsersPolicy,
    /// Inclusive lower bound of the window
    pub window_start: NaiveDateTime,
    pub generated_at: NaiveDateTime,
}
