use crate::db::ConnectionProvider;
use crate::db::handlers::Characters;
use crate::db::models::characters::CharacterDBResponse;
use crate::errors::Result;
use crate::types::{AccountId, StoreRole};

/// Read-only character listing from the player store.
#[derive(Debug, Clone)]
pub struct CharacterService {
    provider: ConnectionProvider,
}

impl CharacterService {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    pub async fn list_characters(&self, account_id: AccountId) -> Result<Vec<CharacterDBResponse>> {
        let mut conn = self.provider.connect(StoreRole::Player).await?;
        let result = Characters::new(&mut conn).list_for_account(account_id).await;
        conn.close().await;

        Ok(result?)
    }
}
