//! Database models for GM grants (`gmlist` table).

use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scope value meaning "any contact address" / "any server".
pub const SCOPE_ALL: &str = "ALL";

/// In-game privilege tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorityLevel {
    Implementor,
    God,
    LowWizard,
    Player,
}

impl AuthorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorityLevel::Implementor => "IMPLEMENTOR",
            AuthorityLevel::God => "GOD",
            AuthorityLevel::LowWizard => "LOW_WIZARD",
            AuthorityLevel::Player => "PLAYER",
        }
    }
}

impl fmt::Display for AuthorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthorityLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IMPLEMENTOR" => Ok(AuthorityLevel::Implementor),
            "GOD" => Ok(AuthorityLevel::God),
            "LOW_WIZARD" => Ok(AuthorityLevel::LowWizard),
            "PLAYER" => Ok(AuthorityLevel::Player),
            other => Err(Error::validation(format!(
                "Unknown authority level '{other}', expected IMPLEMENTOR, GOD, LOW_WIZARD or PLAYER"
            ))),
        }
    }
}

/// Database request for granting authority
#[derive(Debug, Clone)]
pub struct GmGrantDBRequest {
    pub account: String,
    pub character: String,
    pub authority: AuthorityLevel,
}

/// Database response for a GM grant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GmGrantDBResponse {
    pub account: String,
    pub character: String,
    pub contact_ip: String,
    pub server_ip: String,
    pub authority: AuthorityLevel,
}
