//! Database models for accounts.

use crate::errors::Error;
use crate::types::AccountId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether an account may log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "BLOCK")]
    Block,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Ok => "OK",
            AccountStatus::Block => "BLOCK",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(AccountStatus::Ok),
            "BLOCK" => Ok(AccountStatus::Block),
            other => Err(Error::validation(format!(
                "Unknown account status '{other}', expected OK or BLOCK"
            ))),
        }
    }
}

/// Database request for creating a new account
#[derive(Debug, Clone)]
pub struct AccountCreateDBRequest {
    pub login: String,
    /// Already-derived digest, see [`crate::auth::password::game_password_digest`]
    pub password: String,
    pub status: AccountStatus,
    pub created_at: NaiveDateTime,
}

/// Database response for an account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountDBResponse {
    pub id: AccountId,
    pub login: String,
    /// Only populated when the digest was just written; listings never read it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub status: AccountStatus,
    pub created_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("OK".parse::<AccountStatus>().unwrap(), AccountStatus::Ok);
        assert_eq!("BLOCK".parse::<AccountStatus>().unwrap(), AccountStatus::Block);

        for bad in ["ok", "Block", "BANNED", ""] {
            let err = bad.parse::<AccountStatus>().unwrap_err();
            assert!(matches!(err, Error::Validation { .. }), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&AccountStatus::Block).unwrap(), "\"BLOCK\"");
        assert_eq!(AccountStatus::Ok.to_string(), "OK");
    }
}
