use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation: {message}")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    /// Whether this error was raised by a statement touching the given column.
    ///
    /// Neither MySQL nor SQLite report the column in a structured way, so this looks at the
    /// constraint name and the driver message (`Duplicate entry 'x' for key 'login'`,
    /// `UNIQUE constraint failed: account.login`).
    pub fn mentions_column(&self, column: &str) -> bool {
        match self {
            DbError::UniqueViolation { constraint, message, .. } => {
                constraint.as_deref().is_some_and(|c| c.contains(column)) || message.contains(column)
            }
            DbError::Other(err) => format!("{err:#}").contains(column),
            DbError::NotFound => false,
        }
    }
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DbError::UniqueViolation {
                constraint: db_err.constraint().map(|s| s.to_string()),
                table: db_err.table().map(|s| s.to_string()),
                message: db_err.message().to_string(),
            },
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
