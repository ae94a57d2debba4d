//! # Referee Side
//!
//! - [`GameRule`] / [`EvenOddRule`]: how a match is decided.
//! - [`MatchOrchestrator`]: the per-match state machine.
//! - [`RefereeAgent`]: accepts `START_MATCH`, runs orchestrators, tracks active matches.

pub mod agent;
pub mod error;
pub mod orchestrator;
pub mod rules;

pub use agent::*;
pub use error::*;
pub use orchestrator::*;
pub use rules::*;
