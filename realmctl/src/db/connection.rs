//! Store connections.
//!
//! Every store operation opens its own connection through [`ConnectionProvider::connect`], uses
//! it, and closes it with [`StoreConnection::close`] before returning, whatever the outcome.
//! There is no pool: the admin tool issues a handful of statements per user action, and the game
//! server's database should not see idle connections held on its behalf.
//!
//! Connections are [`sqlx::AnyConnection`]s so the same repositories run against the game
//! server's MySQL instance and against local SQLite files (see
//! [`DatabaseBackend`](crate::config::DatabaseBackend)).
//!
//! ```ignore
//! let mut conn = provider.connect(StoreRole::Account).await?;
//! let result = Accounts::new(&mut conn).list().await;
//! conn.close().await;
//! let accounts = result?;
//! ```

use sqlx::{AnyConnection, Connection};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{ConfigStore, DatabaseBackend, ServerConfig};
use crate::errors::{Error, Result};
use crate::types::StoreRole;

/// SQL flavour of a connection, for the few statements that differ between backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Sqlite,
}

/// A live connection to one logical store.
///
/// Derefs to [`AnyConnection`], so repositories can be built straight from it.
pub struct StoreConnection {
    conn: AnyConnection,
    role: StoreRole,
    dialect: Dialect,
}

impl StoreConnection {
    pub fn role(&self) -> StoreRole {
        self.role
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Close the connection gracefully.
    ///
    /// Close failures are logged rather than returned: by the time a connection is closed the
    /// operation's own result is already decided, and it must not be replaced by a teardown
    /// error.
    pub async fn close(self) {
        let role = self.role;
        if let Err(e) = self.conn.close().await {
            warn!(store = %role, error = %e, "Failed to close store connection cleanly");
        } else {
            debug!(store = %role, "Closed store connection");
        }
    }
}

impl std::fmt::Debug for StoreConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConnection")
            .field("role", &self.role)
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl Deref for StoreConnection {
    type Target = AnyConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for StoreConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

/// Opens connections to the stores named in a validated [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    config: Arc<ServerConfig>,
}

impl ConnectionProvider {
    /// Create a provider from an in-memory configuration.
    ///
    /// Fails with [`Error::Configuration`] if the configuration is incomplete.
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        sqlx::any::install_default_drivers();
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Load the configuration from a [`ConfigStore`] and create a provider from it.
    pub fn from_store(store: &ConfigStore) -> Result<Self> {
        Self::new(store.load()?)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        match self.config.backend {
            DatabaseBackend::Mysql => Dialect::MySql,
            DatabaseBackend::Sqlite { .. } => Dialect::Sqlite,
        }
    }

    /// Open one connection to the given store.
    #[instrument(skip(self), fields(store = %role), err)]
    pub async fn connect(&self, role: StoreRole) -> Result<StoreConnection> {
        let url = self.connection_url(role)?;

        let conn = tokio::time::timeout(self.config.connect_timeout, AnyConnection::connect(url.as_str()))
            .await
            .map_err(|_| Error::Connection {
                store: role,
                message: format!("timed out after {:?}", self.config.connect_timeout),
            })?
            .map_err(|e| Error::Connection {
                store: role,
                message: e.to_string(),
            })?;

        debug!(store = %role, database = self.config.database_name(role), "Opened store connection");

        Ok(StoreConnection {
            conn,
            role,
            dialect: self.dialect(),
        })
    }

    /// Build the driver URL for a store. Credentials are percent-encoded.
    fn connection_url(&self, role: StoreRole) -> Result<Url> {
        let database = self.config.database_name(role);
        let invalid = |detail: String| Error::Configuration {
            message: format!("invalid connection settings for the {role} store: {detail}"),
        };

        match &self.config.backend {
            DatabaseBackend::Mysql => {
                let mut url = Url::parse(&format!("mysql://{}:{}", self.config.host, self.config.port))
                    .map_err(|e| invalid(e.to_string()))?;
                url.set_username(&self.config.user)
                    .map_err(|_| invalid("user cannot be set".to_string()))?;
                if !self.config.password.is_empty() {
                    url.set_password(Some(&self.config.password))
                        .map_err(|_| invalid("password cannot be set".to_string()))?;
                }
                url.set_path(database);
                Ok(url)
            }
            DatabaseBackend::Sqlite { directory } => {
                let path = directory.join(format!("{database}.db"));
                let absolute = std::path::absolute(&path).map_err(|e| invalid(e.to_string()))?;
                // mode=rw: never create missing stores
                Url::parse(&format!("sqlite://{}?mode=rw", absolute.display())).map_err(|e| invalid(e.to_string()))
            }
        }
    }
}
