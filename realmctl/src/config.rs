//! Server configuration management.
//!
//! Configuration lives in a JSON file (default `config/server_config.json`) with environment
//! variable overrides. The file path can be specified via the `-f` flag or the `REALMCTL_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **Built-in defaults** - every field has one, see [`ServerConfig::default`]
//! 2. **JSON config file** - the persisted configuration
//! 3. **Environment variables** - Variables prefixed with `REALMCTL_` override file values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `REALMCTL_STATISTICS__WINDOW=15m` sets the `statistics.window` field.
//!
//! ## Two kinds of loading
//!
//! Store operations need a complete configuration, so [`ConfigStore::load`] treats a missing or
//! unreadable file, or one that leaves a required field empty, as a hard
//! [`Error::Configuration`]. Preference consumers (theme, language) can use
//! [`ConfigStore::load_or_default`], which falls back to the defaults instead.
//!
//! ## Example
//!
//! ```json
//! {
//!     "host": "10.0.0.5",
//!     "port": 3306,
//!     "user": "realm",
//!     "password": "secret",
//!     "db_account_name": "srv1_account",
//!     "db_common_name": "srv1_common",
//!     "db_player_name": "srv1_player",
//!     "theme": "dark",
//!     "language": "en",
//!     "update_url": "https://updates.example.com/version.json",
//!     "version": "1.2.0"
//! }
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Json},
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::{Error, Result};
use crate::types::StoreRole;

/// Default location of the persisted configuration, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/server_config.json";

/// Version reported when the configuration does not carry one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Main server configuration.
///
/// Field names match the persisted JSON document. All fields have defaults so a partial file
/// still loads; [`ServerConfig::validate`] decides whether the result is usable for store access.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Database server host
    pub host: String,
    /// Database server port
    pub port: u16,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Physical database name of the account store
    pub db_account_name: String,
    /// Physical database name of the common store (GM list)
    pub db_common_name: String,
    /// Physical database name of the player store
    pub db_player_name: String,
    /// UI theme, `light` or `dark`
    pub theme: String,
    /// UI language code
    pub language: String,
    /// Where the release manifest is published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_url: Option<Url>,
    /// Version of the installed build, compared against the manifest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Which database driver to use
    pub backend: DatabaseBackend,
    /// Upper bound on a single connection attempt
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Upper bound on manifest and download requests
    #[serde(with = "humantime_serde")]
    pub update_timeout: Duration,
    /// Statistics aggregation settings
    pub statistics: StatisticsConfig,
    /// Game server process control
    pub server: ServerControlConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: String::new(),
            password: String::new(),
            db_account_name: String::new(),
            db_common_name: String::new(),
            db_player_name: String::new(),
            theme: "light".to_string(),
            language: "es".to_string(),
            update_url: None,
            version: None,
            backend: DatabaseBackend::default(),
            connect_timeout: Duration::from_secs(10),
            update_timeout: Duration::from_secs(300),
            statistics: StatisticsConfig::default(),
            server: ServerControlConfig::default(),
        }
    }
}

/// Database driver selection.
///
/// `mysql` talks to the game server's MySQL instance using `host`, `port`, `user` and
/// `password`. `sqlite` reads local database files instead - each logical database is
/// `<directory>/<database name>.db` - which is handy for offline inspection of a dump and is
/// what the test suite runs against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatabaseBackend {
    #[default]
    Mysql,
    Sqlite {
        directory: PathBuf,
    },
}

/// How "active users" are counted in a statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActiveUsersPolicy {
    /// Distinct owners of characters whose `player.last_play` falls in the window
    #[default]
    PlayerLastPlay,
    /// Accounts whose `account.availDt` falls in the window
    AccountAvailDt,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Length of the trailing window for "recent" counts
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    pub active_users: ActiveUsersPolicy,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(10 * 60),
            active_users: ActiveUsersPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerControlConfig {
    /// Program and arguments that restart the game server; run without a shell
    pub restart_command: Vec<String>,
}

impl Default for ServerControlConfig {
    fn default() -> Self {
        Self {
            restart_command: vec!["/etc/init.d/metin2".to_string(), "restart".to_string()],
        }
    }
}

impl ServerConfig {
    /// Physical database name for a logical store.
    pub fn database_name(&self, role: StoreRole) -> &str {
        match role {
            StoreRole::Account => &self.db_account_name,
            StoreRole::Common => &self.db_common_name,
            StoreRole::Player => &self.db_player_name,
        }
    }

    /// Installed version, falling back to [`DEFAULT_VERSION`].
    pub fn current_version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    /// Validate that the configuration is complete enough to open store connections.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        if matches!(self.backend, DatabaseBackend::Mysql) {
            if self.host.trim().is_empty() {
                missing.push("host");
            }
            if self.port == 0 {
                missing.push("port");
            }
            if self.user.trim().is_empty() {
                missing.push("user");
            }
        }
        for (field, value) in [
            ("db_account_name", &self.db_account_name),
            ("db_common_name", &self.db_common_name),
            ("db_player_name", &self.db_player_name),
        ] {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }

        if !missing.is_empty() {
            return Err(Error::Configuration {
                message: format!("missing required settings: {}", missing.join(", ")),
            });
        }

        if self.statistics.window.is_zero() {
            return Err(Error::Configuration {
                message: "statistics.window must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Loads and saves [`ServerConfig`] at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn figment(&self) -> Figment {
        Figment::new()
            // Load persisted config file
            .merge(Json::file(&self.path))
            // Environment variables can still override specific values
            .merge(Env::prefixed("REALMCTL_").ignore(&["config", "account_password"]).split("__"))
    }

    /// Load a configuration that store operations can rely on.
    ///
    /// Fails if the file is missing, cannot be parsed, or leaves a required setting empty.
    pub fn load(&self) -> Result<ServerConfig> {
        if !self.path.is_file() {
            return Err(Error::Configuration {
                message: format!("configuration file {} not found", self.path.display()),
            });
        }

        let config: ServerConfig = self.figment().extract().map_err(|e| Error::Configuration {
            message: format!("could not read {}: {e}", self.path.display()),
        })?;
        config.validate()?;

        debug!(path = %self.path.display(), "Loaded server configuration");
        Ok(config)
    }

    /// Load whatever is available, falling back to defaults.
    ///
    /// Intended for preference consumers; the result may not be usable for store access.
    pub fn load_or_default(&self) -> ServerConfig {
        if !self.path.is_file() {
            debug!(path = %self.path.display(), "No configuration file, using defaults");
            return ServerConfig::default();
        }

        match self.figment().extract() {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable configuration, using defaults");
                ServerConfig::default()
            }
        }
    }

    /// Persist the configuration as pretty-printed JSON, creating parent directories.
    pub fn save(&self, config: &ServerConfig) -> Result<()> {
        let io_err = |source| Error::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(config).map_err(|e| Error::Configuration {
            message: format!("could not serialize configuration: {e}"),
        })?;
        std::fs::write(&self.path, body).map_err(io_err)?;

        info!(path = %self.path.display(), "Saved server configuration");
        Ok(())
    }
}
