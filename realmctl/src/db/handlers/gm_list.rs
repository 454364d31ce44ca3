//! Database repository for GM grants (common store).
//!
//! A grant is keyed by account name. [`GmList::grant`] installs the `gmlist_account_unique` index
//! when it is missing and then writes with one atomic [`GmList::upsert`]. If the index cannot be
//! created (duplicate rows already exist, or the user lacks the privilege) it falls back to
//! [`GmList::update_or_insert`], which is not atomic: concurrent grants for a new account can
//! still insert duplicate rows on such a store.

use crate::db::{
    connection::Dialect,
    errors::{DbError, Result},
    models::gm_list::{AuthorityLevel, GmGrantDBRequest, GmGrantDBResponse, SCOPE_ALL},
};
use anyhow::anyhow;
use sqlx::{AnyConnection, FromRow};
use tracing::{info, instrument, warn};

pub const UNIQUE_INDEX_NAME: &str = "gmlist_account_unique";

const SELECT_GRANT: &str = "SELECT mAccount AS account, mName AS name, mContactIP AS contact_ip, mServerIP AS server_ip, CAST(mAuthority AS CHAR) AS authority FROM gmlist";

#[derive(Debug, Clone, FromRow)]
struct GmGrant {
    account: String,
    name: String,
    contact_ip: String,
    server_ip: String,
    authority: String,
}

impl TryFrom<GmGrant> for GmGrantDBResponse {
    type Error = DbError;

    fn try_from(row: GmGrant) -> Result<Self> {
        let authority = row
            .authority
            .parse::<AuthorityLevel>()
            .map_err(|_| DbError::Other(anyhow!("grant for '{}' has unknown authority '{}'", row.account, row.authority)))?;

        Ok(Self {
            account: row.account,
            character: row.name,
            contact_ip: row.contact_ip,
            server_ip: row.server_ip,
            authority,
        })
    }
}

pub struct GmList<'c> {
    db: &'c mut AnyConnection,
    dialect: Dialect,
}

impl<'c> GmList<'c> {
    pub fn new(db: &'c mut AnyConnection, dialect: Dialect) -> Self {
        Self { db, dialect }
    }

    /// Grant through the unique index, installing it first if needed.
    #[instrument(skip(self, request), fields(account = %request.account), err)]
    pub async fn grant(&mut self, request: &GmGrantDBRequest) -> Result<()> {
        match self.ensure_unique_index().await {
            Ok(_) => self.upsert(request).await,
            Err(e) => {
                warn!(error = %e, "No unique index on gmlist(mAccount), granting without it");
                self.update_or_insert(request).await
            }
        }
    }

    /// Insert a grant with `ALL`/`ALL` scope, or update the character name and authority of the
    /// existing grant for this account. Existing scopes are left alone.
    #[instrument(skip(self, request), fields(account = %request.account, authority = %request.authority), err)]
    pub async fn upsert(&mut self, request: &GmGrantDBRequest) -> Result<()> {
        let statement = match self.dialect {
            Dialect::MySql => {
                r#"
                INSERT INTO gmlist (mAccount, mName, mContactIP, mServerIP, mAuthority)
                VALUES (?, ?, ?, ?, ?)
                ON DUPLICATE KEY UPDATE mName = VALUES(mName), mAuthority = VALUES(mAuthority)
                "#
            }
            Dialect::Sqlite => {
                r#"
                INSERT INTO gmlist (mAccount, mName, mContactIP, mServerIP, mAuthority)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(mAccount) DO UPDATE SET mName = excluded.mName, mAuthority = excluded.mAuthority
                "#
            }
        };

        sqlx::query(statement)
            .bind(&request.account)
            .bind(&request.character)
            .bind(SCOPE_ALL)
            .bind(SCOPE_ALL)
            .bind(request.authority.as_str())
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Update every grant row for the account, or insert one if there is none.
    ///
    /// Same effect as [`GmList::upsert`] but works without the unique index.
    #[instrument(skip(self, request), fields(account = %request.account, authority = %request.authority), err)]
    pub async fn update_or_insert(&mut self, request: &GmGrantDBRequest) -> Result<()> {
        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM gmlist WHERE mAccount = ?")
            .bind(&request.account)
            .fetch_one(&mut *self.db)
            .await?;

        if existing > 0 {
            sqlx::query("UPDATE gmlist SET mName = ?, mAuthority = ? WHERE mAccount = ?")
                .bind(&request.character)
                .bind(request.authority.as_str())
                .bind(&request.account)
                .execute(&mut *self.db)
                .await?;
        } else {
            sqlx::query("INSERT INTO gmlist (mAccount, mName, mContactIP, mServerIP, mAuthority) VALUES (?, ?, ?, ?, ?)")
                .bind(&request.account)
                .bind(&request.character)
                .bind(SCOPE_ALL)
                .bind(SCOPE_ALL)
                .bind(request.authority.as_str())
                .execute(&mut *self.db)
                .await?;
        }

        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn get(&mut self, account: &str) -> Result<Option<GmGrantDBResponse>> {
        let row = sqlx::query_as::<_, GmGrant>(&format!("{SELECT_GRANT} WHERE mAccount = ?"))
            .bind(account)
            .fetch_optional(&mut *self.db)
            .await?;

        row.map(GmGrantDBResponse::try_from).transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<GmGrantDBResponse>> {
        let rows = sqlx::query_as::<_, GmGrant>(&format!("{SELECT_GRANT} ORDER BY mAccount"))
            .fetch_all(&mut *self.db)
            .await?;

        rows.into_iter().map(GmGrantDBResponse::try_from).collect()
    }

    /// Create the unique index on `gmlist(mAccount)` if it is missing.
    ///
    /// Returns `true` if the index was created. Fails if duplicate grants already exist.
    #[instrument(skip(self), err)]
    pub async fn ensure_unique_index(&mut self) -> Result<bool> {
        let existing_query = match self.dialect {
            Dialect::MySql => {
                "SELECT COUNT(*) FROM information_schema.statistics WHERE table_schema = DATABASE() AND table_name = 'gmlist' AND index_name = ?"
            }
            Dialect::Sqlite => "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?",
        };

        let existing = sqlx::query_scalar::<_, i64>(existing_query)
            .bind(UNIQUE_INDEX_NAME)
            .fetch_one(&mut *self.db)
            .await?;
        if existing > 0 {
            return Ok(false);
        }

        sqlx::query(&format!("CREATE UNIQUE INDEX {UNIQUE_INDEX_NAME} ON gmlist (mAccount)"))
            .execute(&mut *self.db)
            .await?;
        info!(index = UNIQUE_INDEX_NAME, "Created unique index on gmlist");

        Ok(true)
    }
}
