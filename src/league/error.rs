//! Error types for the league manager.

use crate::model::{MatchId, PlayerId};
use crate::protocol::{ProtocolError, Reply};
use crate::transport::TransportError;
use thiserror::Error;

/// Errors that can occur while running the league.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LeagueError {
    /// Missing or wrong credentials, or a sender acting outside its role.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The match is not part of the current round.
    #[error("Unknown match: {0}")]
    UnknownMatch(MatchId),

    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// A result report that does not agree with the schedule.
    #[error("Invalid report: {0}")]
    InvalidReport(String),

    /// A round cannot start without at least one registered referee.
    #[error("No referee available")]
    NoRefereeAvailable,

    #[error("League has not started")]
    LeagueNotStarted,

    #[error("Unsupported message: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An error occurred while communicating with the agent system.
    #[error("Agent communication error: {0}")]
    AgentCommunicationError(String),
}

impl From<String> for LeagueError {
    fn from(msg: String) -> Self {
        LeagueError::AgentCommunicationError(msg)
    }
}

impl LeagueError {
    /// Status string carried by a `REJECTED` reply.
    pub fn status(&self) -> &'static str {
        match self {
            LeagueError::Unauthorized(_) => "UNAUTHORIZED",
            LeagueError::UnknownMatch(_) => "UNKNOWN_MATCH",
            LeagueError::UnknownPlayer(_) => "UNKNOWN_PLAYER",
            LeagueError::InvalidReport(_) => "INVALID_REPORT",
            LeagueError::NoRefereeAvailable => "NO_REFEREE_AVAILABLE",
            LeagueError::LeagueNotStarted => "LEAGUE_NOT_STARTED",
            LeagueError::Unsupported(_) => "UNSUPPORTED",
            LeagueError::Transport(_)
            | LeagueError::Protocol(_)
            | LeagueError::AgentCommunicationError(_) => "ERROR",
        }
    }

    pub fn into_reply(self) -> Reply {
        Reply::rejected(self.status(), self.to_string())
    }
}
