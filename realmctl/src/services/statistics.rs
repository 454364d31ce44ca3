use chrono::{Local, NaiveDateTime};
use tracing::{debug, instrument};

use crate::config::ActiveUsersPolicy;
use crate::db::ConnectionProvider;
use crate::db::errors::DbError;
use crate::db::handlers::Statistics;
use crate::db::models::statistics::StatisticsSnapshot;
use crate::errors::{Error, Result};
use crate::types::StoreRole;

/// Point-in-time counts across the account and player stores.
///
/// Each snapshot opens one connection per store. Both are closed before the snapshot returns,
/// including when only one of the stores fails; either failure fails the whole snapshot.
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    provider: ConnectionProvider,
}

impl StatisticsAggregator {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    /// Snapshot as of the local wall clock, matching the stores' local `DATETIME` values.
    pub async fn snapshot(&self) -> Result<StatisticsSnapshot> {
        self.snapshot_at(Local::now().naive_local()).await
    }

    /// Snapshot with an explicit evaluation instant. The window is `[now - window, now]`.
    #[instrument(skip(self), err)]
    pub async fn snapshot_at(&self, now: NaiveDateTime) -> Result<StatisticsSnapshot> {
        let settings = &self.provider.config().statistics;
        let window = chrono::Duration::from_std(settings.window).map_err(|e| Error::Configuration {
            message: format!("statistics.window is out of range: {e}"),
        })?;
        let window_start = now.checked_sub_signed(window).ok_or_else(|| Error::Configuration {
            message: format!("statistics.window of {:?} reaches before the earliest representable time", settings.window),
        })?;
        let policy = settings.active_users;

        let mut account_conn = self.provider.connect(StoreRole::Account).await?;
        let mut player_conn = match self.provider.connect(StoreRole::Player).await {
            Ok(conn) => conn,
            Err(e) => {
                account_conn.close().await;
                return Err(e);
            }
        };

        let counts = async {
            let account_counts = Statistics::new(&mut account_conn)
                .account_counts(window_start, policy == ActiveUsersPolicy::AccountAvailDt)
                .await?;
            let player_counts = Statistics::new(&mut player_conn)
                .player_counts(window_start, policy == ActiveUsersPolicy::PlayerLastPlay)
                .await?;
            Ok::<_, DbError>((account_counts, player_counts))
        }
        .await;

        account_conn.close().await;
        player_conn.close().await;

        let (account_counts, player_counts) = counts?;

        let active_users_in_window = match policy {
            ActiveUsersPolicy::PlayerLastPlay => player_counts.active_accounts_in_window,
            ActiveUsersPolicy::AccountAvailDt => account_counts.available_in_window,
        }
        .unwrap_or_default();

        let snapshot = StatisticsSnapshot {
            total_accounts: account_counts.total,
            total_characters: player_counts.total,
            accounts_created_in_window: account_counts.created_in_window,
            active_users_in_window,
            active_users_policy: policy,
            window_start,
            generated_at: now,
        };
        debug!(?snapshot, "Computed statistics snapshot");

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatisticsConfig;
    use crate::test_utils::StoreFixture;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(18, 0, 0).unwrap()
    }

    async fn seeded_fixture() -> StoreFixture {
        let fixture = StoreFixture::new().await;
        let recent = now() - Duration::minutes(5);
        let stale = now() - Duration::minutes(15);

        fixture.insert_account("recent", Some(recent), Some(stale)).await;
        fixture.insert_account("stale", Some(stale), Some(recent)).await;
        fixture.insert_account("older", Some(stale), Some(recent)).await;

        fixture.insert_character(1, "r1", 0, Some(recent)).await;
        fixture.insert_character(1, "r2", 1, Some(recent)).await;
        fixture.insert_character(2, "s1", 2, Some(stale)).await;
        fixture.insert_character(3, "n1", 3, None).await;
        fixture
    }

    #[test_log::test(tokio::test)]
    async fn test_window_includes_recent_and_excludes_stale() {
        let fixture = seeded_fixture().await;
        let aggregator = StatisticsAggregator::new(fixture.provider());

        let snapshot = aggregator.snapshot_at(now()).await.unwrap();
        assert_eq!(snapshot.total_accounts, 3);
        assert_eq!(snapshot.total_characters, 4);
        assert_eq!(snapshot.accounts_created_in_window, 1);
        assert_eq!(snapshot.active_users_in_window, 1);
        assert_eq!(snapshot.active_users_policy, ActiveUsersPolicy::PlayerLastPlay);
        assert_eq!(snapshot.window_start, now() - Duration::minutes(10));
        assert_eq!(snapshot.generated_at, now());
    }

    #[test_log::test(tokio::test)]
    async fn test_avail_dt_policy() {
        let fixture = seeded_fixture().await;
        let mut config = fixture.config();
        config.statistics = StatisticsConfig {
            active_users: ActiveUsersPolicy::AccountAvailDt,
            ..Default::default()
        };
        let aggregator = StatisticsAggregator::new(ConnectionProvider::new(config).unwrap());

        let snapshot = aggregator.snapshot_at(now()).await.unwrap();
        assert_eq!(snapshot.active_users_in_window, 2);
        assert_eq!(snapshot.active_users_policy, ActiveUsersPolicy::AccountAvailDt);
    }

    #[test_log::test(tokio::test)]
    async fn test_configured_window_length() {
        let fixture = seeded_fixture().await;
        let mut config = fixture.config();
        config.statistics.window = std::time::Duration::from_secs(20 * 60);
        let aggregator = StatisticsAggregator::new(ConnectionProvider::new(config).unwrap());

        let snapshot = aggregator.snapshot_at(now()).await.unwrap();
        assert_eq!(snapshot.accounts_created_in_window, 3);
        assert_eq!(snapshot.active_users_in_window, 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_oversized_window_is_configuration_error() {
        let fixture = seeded_fixture().await;
        let mut config = fixture.config();
        config.statistics.window = std::time::Duration::from_secs(300_000 * 365 * 24 * 60 * 60);
        let aggregator = StatisticsAggregator::new(ConnectionProvider::new(config).unwrap());

        let err = aggregator.snapshot_at(now()).await.unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn test_player_store_failure_fails_snapshot() {
        let fixture = seeded_fixture().await;
        let mut config = fixture.config();
        config.db_player_name = "missing_player".to_string();
        let aggregator = StatisticsAggregator::new(ConnectionProvider::new(config).unwrap());

        let err = aggregator.snapshot_at(now()).await.unwrap_err();
        assert!(matches!(err, Error::Connection { store: StoreRole::Player, .. }));

        // The account store is still usable afterwards
        assert!(StatisticsAggregator::new(fixture.provider()).snapshot_at(now()).await.is_ok());
    }

    #[test_log::test(tokio::test)]
    async fn test_player_query_failure_fails_snapshot() {
        let fixture = seeded_fixture().await;
        fixture.execute(StoreRole::Player, "DROP TABLE player").await;
        let aggregator = StatisticsAggregator::new(fixture.provider());

        let err = aggregator.snapshot_at(now()).await.unwrap_err();
        assert!(matches!(err, Error::Query(_)));
    }

    #[test_log::test(tokio::test)]
    async fn test_snapshot_uses_local_clock() {
        let fixture = StoreFixture::new().await;
        fixture
            .insert_account("just_now", Some(Local::now().naive_local() - Duration::minutes(1)), None)
            .await;
        let aggregator = StatisticsAggregator::new(fixture.provider());

        let snapshot = aggregator.snapshot().await.unwrap();
        assert_eq!(snapshot.accounts_created_in_window, 1);
    }
}
