//! Store operations as the view layer calls them.
//!
//! A service owns connection lifetime: each operation connects to the store it needs, runs the
//! repository calls, and closes the connection on every exit path before handing back the
//! result. Input validation that does not need the store happens before connecting.
//!
//! - [`AccountService`]: account listing, creation and status changes
//! - [`CharacterService`]: characters per account
//! - [`AuthorityService`]: GM grants
//! - [`StatisticsAggregator`]: counts across the account and player stores

pub mod accounts;
pub mod authority;
pub mod characters;
pub mod statistics;

pub use accounts::AccountService;
pub use authority::AuthorityService;
pub use characters::CharacterService;
pub use statistics::StatisticsAggregator;
