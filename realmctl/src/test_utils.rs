//! Test utilities: SQLite-backed copies of the three stores.

use crate::config::{DatabaseBackend, ServerConfig};
use crate::db::ConnectionProvider;
use crate::db::handlers::gm_list::UNIQUE_INDEX_NAME;
use crate::types::{StoreRole, format_store_timestamp};
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tempfile::TempDir;

const ACCOUNT_SCHEMA: &str = r#"
CREATE TABLE account (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    login TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'OK',
    create_time DATETIME,
    availDt DATETIME
)"#;

const PLAYER_SCHEMA: &str = r#"
CREATE TABLE player (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    job INTEGER NOT NULL DEFAULT 0,
    last_play DATETIME
)"#;

const GMLIST_SCHEMA: &str = r#"
CREATE TABLE gmlist (
    mID INTEGER PRIMARY KEY AUTOINCREMENT,
    mAccount TEXT NOT NULL,
    mName TEXT NOT NULL,
    mContactIP TEXT NOT NULL DEFAULT 'ALL',
    mServerIP TEXT NOT NULL DEFAULT 'ALL',
    mAuthority TEXT NOT NULL DEFAULT 'PLAYER'
)"#;

/// Three SQLite stores in a temporary directory, laid out the way the game server's databases
/// are. Dropping the fixture removes the files.
pub struct StoreFixture {
    dir: TempDir,
}

impl StoreFixture {
    /// Stores with the GM unique index already installed.
    pub async fn new() -> Self {
        let fixture = Self::without_gm_index().await;
        fixture
            .execute(
                StoreRole::Common,
                &format!("CREATE UNIQUE INDEX {UNIQUE_INDEX_NAME} ON gmlist (mAccount)"),
            )
            .await;
        fixture
    }

    /// Stores as an older game server installation ships them, without the GM unique index.
    pub async fn without_gm_index() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let fixture = Self { dir };

        for (role, schema) in [
            (StoreRole::Account, ACCOUNT_SCHEMA),
            (StoreRole::Common, GMLIST_SCHEMA),
            (StoreRole::Player, PLAYER_SCHEMA),
        ] {
            let mut conn = SqliteConnectOptions::new()
                .filename(fixture.database_path(role))
                .create_if_missing(true)
                .connect()
                .await
                .expect("Failed to create fixture store");
            sqlx::query(schema)
                .execute(&mut conn)
                .await
                .expect("Failed to create fixture schema");
            conn.close().await.expect("Failed to close fixture store");
        }

        fixture
    }

    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            db_account_name: "srv1_account".to_string(),
            db_common_name: "srv1_common".to_string(),
            db_player_name: "srv1_player".to_string(),
            backend: DatabaseBackend::Sqlite {
                directory: self.dir.path().to_path_buf(),
            },
            ..Default::default()
        }
    }

    pub fn provider(&self) -> ConnectionProvider {
        ConnectionProvider::new(self.config()).expect("Fixture config should be valid")
    }

    fn database_path(&self, role: StoreRole) -> std::path::PathBuf {
        let config = self.config();
        self.dir.path().join(format!("{}.db", config.database_name(role)))
    }

    async fn connect(&self, role: StoreRole) -> SqliteConnection {
        SqliteConnectOptions::new()
            .filename(self.database_path(role))
            .connect()
            .await
            .expect("Failed to open fixture store")
    }

    /// Run a raw statement against one store.
    pub async fn execute(&self, role: StoreRole, sql: &str) {
        let mut conn = self.connect(role).await;
        sqlx::query(sql).execute(&mut conn).await.expect("Fixture statement failed");
        conn.close().await.expect("Failed to close fixture store");
    }

    /// Fetch a single text value from one store.
    pub async fn fetch_text(&self, role: StoreRole, sql: &str) -> String {
        let mut conn = self.connect(role).await;
        let value = sqlx::query_scalar::<_, String>(sql)
            .fetch_one(&mut conn)
            .await
            .expect("Fixture query failed");
        conn.close().await.expect("Failed to close fixture store");
        value
    }

    pub async fn insert_account(&self, login: &str, create_time: Option<NaiveDateTime>, avail_dt: Option<NaiveDateTime>) {
        let mut conn = self.connect(StoreRole::Account).await;
        sqlx::query("INSERT INTO account (login, password, status, create_time, availDt) VALUES (?, '*FIXTURE', 'OK', ?, ?)")
            .bind(login)
            .bind(create_time.map(format_store_timestamp))
            .bind(avail_dt.map(format_store_timestamp))
            .execute(&mut conn)
            .await
            .expect("Failed to insert fixture account");
        conn.close().await.expect("Failed to close fixture store");
    }

    pub async fn insert_character(&self, account_id: i64, name: &str, job: i64, last_play: Option<NaiveDateTime>) {
        let mut conn = self.connect(StoreRole::Player).await;
        sqlx::query("INSERT INTO player (account_id, name, job, last_play) VALUES (?, ?, ?, ?)")
            .bind(account_id)
            .bind(name)
            .bind(job)
            .bind(last_play.map(format_store_timestamp))
            .execute(&mut conn)
            .await
            .expect("Failed to insert fixture character");
        conn.close().await.expect("Failed to close fixture store");
    }
}
