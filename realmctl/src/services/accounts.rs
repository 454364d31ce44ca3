use chrono::Local;
use tracing::{info, instrument};

use crate::auth::password::game_password_digest;
use crate::db::ConnectionProvider;
use crate::db::errors::DbError;
use crate::db::handlers::Accounts;
use crate::db::models::accounts::{AccountCreateDBRequest, AccountDBResponse, AccountStatus};
use crate::errors::{Error, Result};
use crate::types::{AccountId, StoreRole};

/// Account lifecycle against the account store. Every call opens and closes its own connection.
#[derive(Debug, Clone)]
pub struct AccountService {
    provider: ConnectionProvider,
}

impl AccountService {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    /// All accounts. A failed query is an error, never a partial list.
    pub async fn list_accounts(&self) -> Result<Vec<AccountDBResponse>> {
        let mut conn = self.provider.connect(StoreRole::Account).await?;
        let result = Accounts::new(&mut conn).list().await;
        conn.close().await;

        Ok(result?)
    }

    pub async fn get_account_by_login(&self, login: &str) -> Result<Option<AccountDBResponse>> {
        let mut conn = self.provider.connect(StoreRole::Account).await?;
        let result = Accounts::new(&mut conn).get_by_login(login).await;
        conn.close().await;

        Ok(result?)
    }

    /// Create an account with status `OK`, storing the game server's digest of the password.
    #[instrument(skip(self, password), err)]
    pub async fn create_account(&self, login: &str, password: &str) -> Result<AccountDBResponse> {
        if login.trim().is_empty() {
            return Err(Error::validation("Login must not be empty"));
        }
        if password.is_empty() {
            return Err(Error::validation("Password must not be empty"));
        }

        let request = AccountCreateDBRequest {
            login: login.to_string(),
            password: game_password_digest(password),
            status: AccountStatus::Ok,
            created_at: Local::now().naive_local(),
        };

        let mut conn = self.provider.connect(StoreRole::Account).await?;
        let result = Accounts::new(&mut conn).create(&request).await;
        conn.close().await;

        match result {
            Ok(account) => {
                info!(account_id = account.id, "Created account");
                Ok(account)
            }
            Err(e) if is_duplicate_login(&e) => Err(Error::DuplicateLogin { login: login.to_string() }),
            Err(e) => Err(e.into()),
        }
    }

    /// Set an account's status. Returns `false` if the account does not exist.
    #[instrument(skip(self), err)]
    pub async fn update_status(&self, account_id: AccountId, status: AccountStatus) -> Result<bool> {
        let mut conn = self.provider.connect(StoreRole::Account).await?;
        let result = Accounts::new(&mut conn).update_status(account_id, status).await;
        conn.close().await;

        Ok(result?)
    }
}

/// Any insert failure that points at the login column is a duplicate login.
fn is_duplicate_login(err: &DbError) -> bool {
    err.mentions_column("login")
}
