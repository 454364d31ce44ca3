//! Database repository for characters (player store). Read-only: the game server owns this table.

use crate::{
    db::{errors::Result, models::characters::{CharacterDBResponse, JobInfo}},
    types::{AccountId, parse_store_timestamp},
};
use sqlx::{AnyConnection, FromRow};
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct Character {
    id: i64,
    name: String,
    job: i64,
    account_id: i64,
    last_play: Option<String>,
}

impl From<Character> for CharacterDBResponse {
    fn from(row: Character) -> Self {
        Self {
            id: row.id,
            name: row.name,
            job_code: row.job,
            job: JobInfo::from_code(row.job),
            account_id: row.account_id,
            last_play: row.last_play.as_deref().and_then(parse_store_timestamp),
        }
    }
}

pub struct Characters<'c> {
    db: &'c mut AnyConnection,
}

impl<'c> Characters<'c> {
    pub fn new(db: &'c mut AnyConnection) -> Self {
        Self { db }
    }

    /// Characters owned by an account. Empty when the account has none (or does not exist).
    #[instrument(skip(self), err)]
    pub async fn list_for_account(&mut self, account_id: AccountId) -> Result<Vec<CharacterDBResponse>> {
        let rows = sqlx::query_as::<_, Character>(
            r#"
            SELECT CAST(id AS SIGNED) AS id,
                   name,
                   CAST(job AS SIGNED) AS job,
                   CAST(account_id AS SIGNED) AS account_id,
                   CAST(last_play AS CHAR) AS last_play
            FROM player
            WHERE account_id = ?
            ORDER BY id
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows.into_iter().map(CharacterDBResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::characters::{CharacterClass, Gender};
    use crate::test_utils::StoreFixture;
    use crate::types::StoreRole;

    #[test_log::test(tokio::test)]
    async fn test_account_without_characters_is_empty() {
        let fixture = StoreFixture::new().await;
        fixture.insert_character(1, "Someone", 0, None).await;

        let mut conn = fixture.provider().connect(StoreRole::Player).await.unwrap();
        let characters = Characters::new(&mut conn).list_for_account(2).await.unwrap();
        conn.close().await;

        assert!(characters.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_lists_exactly_owned_characters() {
        let fixture = StoreFixture::new().await;
        // 3 accounts x 4 characters
        for account_id in 1..=3 {
            for slot in 0..4 {
                fixture
                    .insert_character(account_id, &format!("hero{account_id}_{slot}"), slot, None)
                    .await;
            }
        }

        let mut conn = fixture.provider().connect(StoreRole::Player).await.unwrap();
        let mut repo = Characters::new(&mut conn);
        for account_id in 1..=3 {
            let characters = repo.list_for_account(account_id).await.unwrap();
            assert_eq!(characters.len(), 4);
            assert!(characters.iter().all(|c| c.account_id == account_id));
            assert!(characters.iter().all(|c| c.name.starts_with(&format!("hero{account_id}_"))));
        }
        conn.close().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_job_resolution_and_unknown_codes() {
        let fixture = StoreFixture::new().await;
        let last_play = chrono::NaiveDate::from_ymd_opt(2024, 5, 4)
            .unwrap()
            .and_hms_opt(20, 15, 0)
            .unwrap();
        fixture.insert_character(7, "Lycan", 8, Some(last_play)).await;
        fixture.insert_character(7, "Mystery", 99, None).await;

        let mut conn = fixture.provider().connect(StoreRole::Player).await.unwrap();
        let characters = Characters::new(&mut conn).list_for_account(7).await.unwrap();
        conn.close().await;

        assert_eq!(characters.len(), 2);
        assert_eq!(characters[0].job.class, CharacterClass::Lycan);
        assert_eq!(characters[0].job.gender, Some(Gender::Male));
        assert_eq!(characters[0].last_play, Some(last_play));
        assert_eq!(characters[1].job_code, 99);
        assert_eq!(characters[1].job, JobInfo::UNKNOWN);
        assert_eq!(characters[1].last_play, None);
    }
}
