//! Repository implementations for database access.
//!
//! Each repository borrows one open connection for its lifetime and issues parameterized
//! statements against it. Repositories never open or close connections themselves; that is the
//! job of the services in [`crate::services`].
//!
//! # Available Repositories
//!
//! - [`Accounts`]: account listing, creation and status changes (account store)
//! - [`Characters`]: character listing per account (player store)
//! - [`GmList`]: GM grant upsert and lookup (common store)
//! - [`Statistics`]: count queries for the statistics snapshot (account and player stores)
//!
//! # Common Pattern
//!
//! ```ignore
//! use realmctl::db::handlers::Accounts;
//!
//! let mut conn = provider.connect(StoreRole::Account).await?;
//! let result = Accounts::new(&mut conn).list().await;
//! conn.close().await;
//! ```
//!
//! Integer columns are selected through `CAST(... AS SIGNED)` and `DATETIME` columns through
//! `CAST(... AS CHAR)` so that MySQL and SQLite rows decode to the same Rust types.

pub mod accounts;
pub mod characters;
pub mod gm_list;
pub mod statistics;

pub use accounts::Accounts;
pub use characters::Characters;
pub use gm_list::GmList;
pub use statistics::Statistics;
