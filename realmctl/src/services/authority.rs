use tracing::{info, instrument};

use crate::db::ConnectionProvider;
use crate::db::handlers::GmList;
use crate::db::models::gm_list::{AuthorityLevel, GmGrantDBRequest, GmGrantDBResponse};
use crate::errors::{Error, Result};
use crate::types::StoreRole;

/// GM grants in the common store.
#[derive(Debug, Clone)]
pub struct AuthorityService {
    provider: ConnectionProvider,
}

impl AuthorityService {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    /// Grant `authority` to a character, keyed by account name.
    ///
    /// Updates the account's existing grant in place, otherwise inserts one with `ALL`/`ALL`
    /// scope. The unique index on `gmlist(mAccount)` is installed on the same connection if it is
    /// missing. Stores that cannot take the index (existing duplicate rows) are updated with a
    /// non-atomic check-then-write instead.
    #[instrument(skip(self), err)]
    pub async fn grant_authority(&self, account: &str, character: &str, authority: AuthorityLevel) -> Result<()> {
        if account.trim().is_empty() {
            return Err(Error::validation("Account name must not be empty"));
        }
        if character.trim().is_empty() {
            return Err(Error::validation("Character name must not be empty"));
        }

        let request = GmGrantDBRequest {
            account: account.to_string(),
            character: character.to_string(),
            authority,
        };

        let mut conn = self.provider.connect(StoreRole::Common).await?;
        let dialect = conn.dialect();
        let result = GmList::new(&mut conn, dialect).grant(&request).await;
        conn.close().await;

        result?;
        info!(account, character, %authority, "Granted authority");
        Ok(())
    }

    pub async fn get_grant(&self, account: &str) -> Result<Option<GmGrantDBResponse>> {
        let mut conn = self.provider.connect(StoreRole::Common).await?;
        let dialect = conn.dialect();
        let result = GmList::new(&mut conn, dialect).get(account).await;
        conn.close().await;

        Ok(result?)
    }

    pub async fn list_grants(&self) -> Result<Vec<GmGrantDBResponse>> {
        let mut conn = self.provider.connect(StoreRole::Common).await?;
        let dialect = conn.dialect();
        let result = GmList::new(&mut conn, dialect).list().await;
        conn.close().await;

        Ok(result?)
    }

    /// Install the unique index on `gmlist(mAccount)`. Returns `true` if it was created.
    pub async fn ensure_unique_index(&self) -> Result<bool> {
        let mut conn = self.provider.connect(StoreRole::Common).await?;
        let dialect = conn.dialect();
        let result = GmList::new(&mut conn, dialect).ensure_unique_index().await;
        conn.close().await;

        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StoreFixture;

    #[test_log::test(tokio::test)]
    async fn test_grant_twice_single_row() {
        let fixture = StoreFixture::new().await;
        let service = AuthorityService::new(fixture.provider());

        service.grant_authority("admin", "Hero", AuthorityLevel::LowWizard).await.unwrap();
        service.grant_authority("admin", "Hero", AuthorityLevel::God).await.unwrap();

        let grants = service.list_grants().await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].authority, AuthorityLevel::God);

        let grant = service.get_grant("admin").await.unwrap().unwrap();
        assert_eq!(grant.character, "Hero");
    }

    #[test_log::test(tokio::test)]
    async fn test_concurrent_grants_leave_one_row() {
        let fixture = StoreFixture::new().await;
        let service = AuthorityService::new(fixture.provider());

        let levels = [AuthorityLevel::God, AuthorityLevel::Implementor, AuthorityLevel::LowWizard];
        let handles: Vec<_> = levels
            .into_iter()
            .map(|level| {
                let service = service.clone();
                tokio::spawn(async move {
                    // SQLite may report the file as busy under contention; retry that only
                    loop {
                        match service.grant_authority("race", "Racer", level).await {
                            Ok(()) => break,
                            Err(Error::Query(e)) if e.to_string().contains("locked") => tokio::task::yield_now().await,
                            Err(e) => panic!("grant failed: {e:?}"),
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let grants = service.list_grants().await.unwrap();
        assert_eq!(grants.len(), 1);
        assert!(levels.contains(&grants[0].authority));
    }

    #[test_log::test(tokio::test)]
    async fn test_empty_names_rejected() {
        let fixture = StoreFixture::new().await;
        let service = AuthorityService::new(fixture.provider());

        assert!(matches!(
            service.grant_authority("", "Hero", AuthorityLevel::God).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            service.grant_authority("admin", " ", AuthorityLevel::God).await,
            Err(Error::Validation { .. })
        ));
        assert!(service.list_grants().await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_ensure_unique_index_then_grant() {
        let fixture = StoreFixture::without_gm_index().await;
        let service = AuthorityService::new(fixture.provider());

        assert!(service.ensure_unique_index().await.unwrap());
        service.grant_authority("admin", "A", AuthorityLevel::God).await.unwrap();
        service.grant_authority("admin", "B", AuthorityLevel::Player).await.unwrap();

        let grants = service.list_grants().await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].character, "B");
        assert_eq!(grants[0].authority, AuthorityLevel::Player);
    }

    #[test_log::test(tokio::test)]
    async fn test_grant_twice_without_index_single_row() {
        let fixture = StoreFixture::without_gm_index().await;
        let service = AuthorityService::new(fixture.provider());

        service.grant_authority("admin", "Hero", AuthorityLevel::God).await.unwrap();
        service.grant_authority("admin", "Hero", AuthorityLevel::Implementor).await.unwrap();

        let grants = service.list_grants().await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].authority, AuthorityLevel::Implementor);

        // The first grant installed the index
        assert!(!service.ensure_unique_index().await.unwrap());
    }
}
