//! Database layer for the game server's stores.
//!
//! This module implements access to the account, common and player stores using SQLx's `Any`
//! driver, so the same code runs against MySQL (the game server's own database) and SQLite
//! (local stores, used by the test suite).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Services   │  (connection lifetime, validation)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ MySQL/SQLite│
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`connection`]: Opening and closing connections per store
//! - [`handlers`]: Repository implementations
//! - [`models`]: Record structures matching table schemas
//! - [`errors`]: Database-specific error types

pub mod connection;
pub mod errors;
pub mod handlers;
pub mod models;

pub use connection::{ConnectionProvider, Dialect, StoreConnection};
