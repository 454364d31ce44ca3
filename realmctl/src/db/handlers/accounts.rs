//! Database repository for accounts (account store).

use crate::{
    db::{
        errors::{DbError, Result},
        models::accounts::{AccountCreateDBRequest, AccountDBResponse, AccountStatus},
    },
    types::{AccountId, format_store_timestamp, parse_store_timestamp},
};
use anyhow::anyhow;
use sqlx::{AnyConnection, FromRow};
use tracing::instrument;

// Integer and DATETIME columns are cast so both drivers hand back i64 / text
const SELECT_ACCOUNT: &str = "SELECT CAST(id AS SIGNED) AS id, login, status, CAST(create_time AS CHAR) AS create_time FROM account";

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Account {
    id: i64,
    login: String,
    status: String,
    create_time: Option<String>,
}

impl Account {
    fn into_response(self, password: Option<String>) -> Result<AccountDBResponse> {
        let status = self
            .status
            .parse::<AccountStatus>()
            .map_err(|_| DbError::Other(anyhow!("account {} has unknown status '{}'", self.id, self.status)))?;

        Ok(AccountDBResponse {
            id: self.id,
            login: self.login,
            password,
            status,
            created_at: self.create_time.as_deref().and_then(parse_store_timestamp),
        })
    }
}

pub struct Accounts<'c> {
    db: &'c mut AnyConnection,
}

impl<'c> Accounts<'c> {
    pub fn new(db: &'c mut AnyConnection) -> Self {
        Self { db }
    }

    /// All accounts, in the store's native order.
    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<AccountDBResponse>> {
        let rows = sqlx::query_as::<_, Account>(SELECT_ACCOUNT).fetch_all(&mut *self.db).await?;

        rows.into_iter().map(|row| row.into_response(None)).collect()
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: AccountId) -> Result<Option<AccountDBResponse>> {
        let row = sqlx::query_as::<_, Account>(&format!("{SELECT_ACCOUNT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        row.map(|row| row.into_response(None)).transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_login(&mut self, login: &str) -> Result<Option<AccountDBResponse>> {
        let row = sqlx::query_as::<_, Account>(&format!("{SELECT_ACCOUNT} WHERE login = ?"))
            .bind(login)
            .fetch_optional(&mut *self.db)
            .await?;

        row.map(|row| row.into_response(None)).transpose()
    }

    /// Insert a new account and read it back.
    #[instrument(skip(self, request), fields(login = %request.login), err)]
    pub async fn create(&mut self, request: &AccountCreateDBRequest) -> Result<AccountDBResponse> {
        let result = sqlx::query("INSERT INTO account (login, password, status, create_time) VALUES (?, ?, ?, ?)")
            .bind(&request.login)
            .bind(&request.password)
            .bind(request.status.as_str())
            .bind(format_store_timestamp(request.created_at))
            .execute(&mut *self.db)
            .await?;

        let id = result
            .last_insert_id()
            .ok_or_else(|| DbError::Other(anyhow!("store did not report the new account id")))?;

        let row = sqlx::query_as::<_, Account>(&format!("{SELECT_ACCOUNT} WHERE id = ?"))
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;

        row.into_response(Some(request.password.clone()))
    }

    /// Set an account's status. Returns `false` if no account has this id.
    ///
    /// Setting the status an account already has succeeds. MySQL reports zero affected rows in
    /// that case, so a zero count is confirmed with a lookup before reporting a missing account.
    #[instrument(skip(self), err)]
    pub async fn update_status(&mut self, id: AccountId, status: AccountStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE account SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM account WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists > 0)
    }
}
