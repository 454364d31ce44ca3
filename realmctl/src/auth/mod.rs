//! Credentials written on behalf of game accounts.
//!
//! The admin tool itself has no login; this module only derives the password digests stored in
//! the `account` table.

pub mod password;
