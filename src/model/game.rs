//! Game vocabulary shared by every agent: parity choices, per-player results and
//! the outcome record a referee produces for one match.

use crate::model::{MatchId, PlayerId, RefereeId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A player's stated parity for the drawn number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParityChoice {
    Even,
    Odd,
}

impl ParityChoice {
    /// Whether `number` has this parity.
    pub fn matches(self, number: u32) -> bool {
        match self {
            ParityChoice::Even => number % 2 == 0,
            ParityChoice::Odd => number % 2 == 1,
        }
    }
}

impl Display for ParityChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParityChoice::Even => write!(f, "even"),
            ParityChoice::Odd => write!(f, "odd"),
        }
    }
}

impl FromStr for ParityChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "even" => Ok(ParityChoice::Even),
            "odd" => Ok(ParityChoice::Odd),
            other => Err(format!("not a parity choice: {other:?}")),
        }
    }
}

/// Result of a match from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchResult {
    Win,
    Draw,
    Loss,
    TechnicalLoss,
}

impl MatchResult {
    /// League points awarded for this result.
    pub fn points(self) -> u32 {
        match self {
            MatchResult::Win => 3,
            MatchResult::Draw => 1,
            MatchResult::Loss | MatchResult::TechnicalLoss => 0,
        }
    }
}

impl Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MatchResult::Win => "WIN",
            MatchResult::Draw => "DRAW",
            MatchResult::Loss => "LOSS",
            MatchResult::TechnicalLoss => "TECHNICAL_LOSS",
        };
        f.write_str(label)
    }
}

/// How a match ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The game rule was applied to two valid choices.
    Decided {
        drawn_number: u32,
        choice_a: ParityChoice,
        choice_b: ParityChoice,
    },
    /// The match could not be completed; both players lose.
    TechnicalLoss { reason: String },
}

/// Everything a referee knows about a finished match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub match_id: MatchId,
    pub round_id: u32,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub result_a: MatchResult,
    pub result_b: MatchResult,
    pub winner: Option<PlayerId>,
    pub resolution: Resolution,
}

impl MatchOutcome {
    pub fn technical_loss(
        match_id: MatchId,
        round_id: u32,
        player_a: PlayerId,
        player_b: PlayerId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            match_id,
            round_id,
            player_a,
            player_b,
            result_a: MatchResult::TechnicalLoss,
            result_b: MatchResult::TechnicalLoss,
            winner: None,
            resolution: Resolution::TechnicalLoss {
                reason: reason.into(),
            },
        }
    }

    pub fn drawn_number(&self) -> Option<u32> {
        match self.resolution {
            Resolution::Decided { drawn_number, .. } => Some(drawn_number),
            Resolution::TechnicalLoss { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Decided { .. } => None,
            Resolution::TechnicalLoss { reason } => Some(reason),
        }
    }

    pub fn is_technical_loss(&self) -> bool {
        matches!(self.resolution, Resolution::TechnicalLoss { .. })
    }
}

/// The manager's read-only projection of a scheduled match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAssignment {
    pub match_id: MatchId,
    pub round_id: u32,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub referee_id: Option<RefereeId>,
}

impl MatchAssignment {
    pub fn involves(&self, player: PlayerId) -> bool {
        self.player_a == player || self.player_b == player
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_table() {
        assert_eq!(MatchResult::Win.points(), 3);
        assert_eq!(MatchResult::Draw.points(), 1);
        assert_eq!(MatchResult::Loss.points(), 0);
        assert_eq!(MatchResult::TechnicalLoss.points(), 0);
    }

    #[test]
    fn test_parity_matching() {
        assert!(ParityChoice::Even.matches(4));
        assert!(!ParityChoice::Even.matches(7));
        assert!(ParityChoice::Odd.matches(7));
        assert_eq!("odd".parse::<ParityChoice>(), Ok(ParityChoice::Odd));
        assert!("EVEN".parse::<ParityChoice>().is_err());
    }

    #[test]
    fn test_result_wire_names() {
        let json = serde_json::to_string(&MatchResult::TechnicalLoss).unwrap();
        assert_eq!(json, "\"TECHNICAL_LOSS\"");
        assert_eq!(MatchResult::TechnicalLoss.to_string(), "TECHNICAL_LOSS");
    }
}
