//! Count queries backing the statistics snapshot.

use crate::{
    db::{
        errors::Result,
        models::statistics::{AccountCounts, PlayerCounts},
    },
    types::format_store_timestamp,
};
use chrono::{NaiveDateTime, TimeDelta, Timelike};
use sqlx::AnyConnection;
use tracing::instrument;

/// Inclusive lower bound as bound to the store. Stores compare whole seconds, so a fractional
/// `since` is rounded up rather than truncated into the previous second.
fn window_lower_bound(since: NaiveDateTime) -> String {
    let bound = match since.with_nanosecond(0) {
        Some(whole) if whole < since => whole.checked_add_signed(TimeDelta::seconds(1)).unwrap_or(whole),
        _ => since,
    };
    format_store_timestamp(bound)
}

pub struct Statistics<'c> {
    db: &'c mut AnyConnection,
}

impl<'c> Statistics<'c> {
    pub fn new(db: &'c mut AnyConnection) -> Self {
        Self { db }
    }

    /// Account store counts. `with_availability` additionally counts accounts whose `availDt` is
    /// inside the window.
    #[instrument(skip(self), err)]
    pub async fn account_counts(&mut self, since: NaiveDateTime, with_availability: bool) -> Result<AccountCounts> {
        let since = window_lower_bound(since);

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM account")
            .fetch_one(&mut *self.db)
            .await?;

        let created_in_window = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM account WHERE create_time >= ?")
            .bind(&since)
            .fetch_one(&mut *self.db)
            .await?;

        let available_in_window = if with_availability {
            let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM account WHERE availDt >= ?")
                .bind(&since)
                .fetch_one(&mut *self.db)
                .await?;
            Some(count)
        } else {
            None
        };

        Ok(AccountCounts {
            total,
            created_in_window,
            available_in_window,
        })
    }

    /// Player store counts. `with_activity` additionally counts distinct accounts with a
    /// character played inside the window.
    #[instrument(skip(self), err)]
    pub async fn player_counts(&mut self, since: NaiveDateTime, with_activity: bool) -> Result<PlayerCounts> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM player")
            .fetch_one(&mut *self.db)
            .await?;

        let active_accounts_in_window = if with_activity {
            let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT account_id) FROM player WHERE last_play >= ?")
                .bind(window_lower_bound(since))
                .fetch_one(&mut *self.db)
                .await?;
            Some(count)
        } else {
            None
        };

        Ok(PlayerCounts {
            total,
            active_accounts_in_window,
        })
    }
}
