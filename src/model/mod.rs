//! Plain data shared by the manager, referees and players.
//!
//! Nothing in here owns a task or a channel; agents hold these values inside
//! their single-writer state.

pub mod game;
pub mod ids;
pub mod participant;

pub use game::*;
pub use ids::*;
pub use participant::*;

use tokio::time::Instant;

/// Lifecycle of one league instance.
///
/// `Registering -> Starting` may repeat while late joiners push the deadline
/// back; `InProgress -> Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeagueState {
    Registering,
    Starting { deadline: Instant },
    /// Zero-based index of the current round.
    InProgress { round: usize },
    Completed,
}

impl LeagueState {
    pub fn has_started(&self) -> bool {
        matches!(
            self,
            LeagueState::InProgress { .. } | LeagueState::Completed
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeagueState::Registering => "registering",
            LeagueState::Starting { .. } => "starting",
            LeagueState::InProgress { .. } => "in_progress",
            LeagueState::Completed => "completed",
        }
    }
}
