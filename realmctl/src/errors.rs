use crate::db::errors::DbError;
use crate::types::StoreRole;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Configuration missing, unreadable, or incomplete
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Store unreachable or credentials rejected
    #[error("Could not connect to the {store} store: {message}")]
    Connection { store: StoreRole, message: String },

    /// Query against a reachable store failed
    #[error(transparent)]
    Query(#[from] DbError),

    /// Account creation hit an existing login
    #[error("An account with login '{login}' already exists")]
    DuplicateLogin { login: String },

    /// Caller supplied an out-of-domain value
    #[error("{message}")]
    Validation { message: String },

    /// Transport failure talking to the update feed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Local file or process failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse failure classes the view layer picks its message from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    CouldNotConnect,
    CouldNotApply,
    InvalidInput,
}

impl FailureCategory {
    pub fn headline(&self) -> &'static str {
        match self {
            FailureCategory::CouldNotConnect => "Could not connect",
            FailureCategory::CouldNotApply => "Could not execute the requested change",
            FailureCategory::InvalidInput => "Input was invalid",
        }
    }
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation { message: message.into() }
    }

    pub fn network(err: impl std::fmt::Display) -> Self {
        Error::Network { message: err.to_string() }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            Error::Configuration { .. } | Error::Connection { .. } => FailureCategory::CouldNotConnect,
            Error::Query(_) | Error::Network { .. } | Error::Io { .. } => FailureCategory::CouldNotApply,
            Error::Validation { .. } | Error::DuplicateLogin { .. } => FailureCategory::InvalidInput,
        }
    }

    /// Returns a user-facing message: the category headline followed by the detail.
    pub fn user_message(&self) -> String {
        let detail = match self {
            Error::Query(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            other => other.to_string(),
        };
        format!("{}: {}", self.category().headline(), detail)
    }

    /// Log full error details, with the level depending on severity.
    pub fn log(&self) {
        match self {
            Error::Query(DbError::Other(_)) | Error::Io { .. } => {
                tracing::error!("Internal error: {:#}", self);
            }
            Error::Configuration { .. } | Error::Connection { .. } | Error::Network { .. } => {
                tracing::error!("{}", self);
            }
            Error::Query(_) | Error::DuplicateLogin { .. } => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Validation { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::network(err)
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
