//! # Manager Side
//!
//! Everything the league manager owns, leaves first:
//!
//! - [`RegistrationLedger`]: ids and tokens for joining players and referees.
//! - [`StandingsTable`]: win/draw/loss/points per player.
//! - [`RoundScheduler`]: circle-method schedule, referee assignment, round cursor.
//! - [`LeagueStartCoordinator`]: debounced, at-most-once league start.
//! - [`LeagueManager`]: the agent tying them together.

pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod manager;
pub mod scheduler;
pub mod standings;

pub use coordinator::*;
pub use error::*;
pub use ledger::*;
pub use manager::*;
pub use scheduler::*;
pub use standings::*;
