//! Database record models matching table schemas.
//!
//! This module contains struct definitions that correspond to rows of the game server's
//! tables. Repositories in [`crate::db::handlers`] return these models and accept their
//! request types.
//!
//! # Design Principles
//!
//! - **Schema Mapping**: Each response struct mirrors one table, with column names translated
//!   (`mAccount` becomes `account`, `create_time` becomes `created_at`)
//! - **Typed values**: Status, authority level and job code columns are decoded into enums, so
//!   out-of-domain values are rejected at the edge
//! - **Request/Response split**: `*DBRequest` types carry what a write needs, `*DBResponse` types
//!   what a read returns
//!
//! # Models
//!
//! - [`accounts`]: Login accounts and their status (account store)
//! - [`characters`]: Characters and the job lookup table (player store)
//! - [`gm_list`]: GM grants and authority levels (common store)
//! - [`statistics`]: Aggregated counts across stores

pub mod accounts;
pub mod characters;
pub mod gm_list;
pub mod statistics;
