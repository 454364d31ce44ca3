//! Database models for characters (`player` table).

use crate::types::{AccountId, CharacterId};
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    Warrior,
    Assassin,
    Sura,
    Shaman,
    Lycan,
    /// Job code missing from the lookup table
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Display class and gender for a job code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    pub class: CharacterClass,
    pub gender: Option<Gender>,
}

impl JobInfo {
    pub const UNKNOWN: JobInfo = JobInfo {
        class: CharacterClass::Unknown,
        gender: None,
    };

    /// Resolve a `player.job` code. Codes outside the table resolve to [`JobInfo::UNKNOWN`].
    pub fn from_code(code: i64) -> Self {
        use CharacterClass::*;
        use Gender::*;

        let (class, gender) = match code {
            0 => (Warrior, Male),
            4 => (Warrior, Female),
            5 => (Assassin, Male),
            1 => (Assassin, Female),
            2 => (Sura, Male),
            6 => (Sura, Female),
            7 => (Shaman, Male),
            3 => (Shaman, Female),
            8 => (Lycan, Male),
            _ => return Self::UNKNOWN,
        };
        JobInfo {
            class,
            gender: Some(gender),
        }
    }
}

/// Database response for a character
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterDBResponse {
    pub id: CharacterId,
    pub name: String,
    pub job_code: i64,
    pub job: JobInfo,
    pub account_id: AccountId,
    pub last_play: Option<NaiveDateTime>,
}
