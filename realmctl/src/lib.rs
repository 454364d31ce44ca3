//! # realmctl: Administration Backend for a Game Server Cluster
//!
//! `realmctl` manages the persisted state of a multiplayer game server: login accounts, the
//! characters that belong to them, GM grants, and operational statistics. It also keeps its own
//! binary up to date from a release feed.
//!
//! ## Overview
//!
//! The game server keeps its state in three logical databases (the account, common and player
//! stores, see [`types::StoreRole`]). `realmctl` talks to them directly: it does not speak the
//! game server's network protocol, and the game server remains the only writer of character
//! data.
//!
//! ## Architecture
//!
//! Configuration is loaded by [`config::ConfigStore`] and handed to a
//! [`db::ConnectionProvider`], which opens one connection per operation. There is no pool:
//! each service call connects, runs its statements, and closes the connection on every exit
//! path.
//!
//! ### Core Components
//!
//! The **database layer** ([`db`]) holds the connection provider, the connection-scoped
//! repositories in [`db::handlers`] and the record types in [`db::models`]. Repositories run
//! unchanged against MySQL and SQLite through SQLx's `Any` driver.
//!
//! The **service layer** ([`services`]) is what callers use: [`services::AccountService`],
//! [`services::CharacterService`], [`services::AuthorityService`] and
//! [`services::StatisticsAggregator`]. Services validate input, own connection lifetime, and map
//! store failures onto the crate's [`errors::Error`].
//!
//! The **update subsystem** ([`update`]) checks the release manifest and streams new builds to
//! disk with progress reporting and cancellation. It does not touch the stores.
//!
//! [`server_control`] runs the game server's restart command, and [`cli`] is the command-line
//! front end.
//!
//! ## Errors
//!
//! Every failure maps to one of three categories the front end shows to the operator: could not
//! connect, could not execute the requested change, or input was invalid (see
//! [`errors::FailureCategory`]).

pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod server_control;
pub mod services;
pub mod telemetry;
pub mod types;
pub mod update;

#[cfg(test)]
mod test_utils;

pub use config::{ConfigStore, ServerConfig};
pub use errors::{Error, Result};

/// Install the process-wide rustls crypto provider used by the HTTP client.
///
/// Safe to call more than once; later calls are no-ops.
pub fn install_crypto_provider() {
    // Err only means a provider is already installed
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}
