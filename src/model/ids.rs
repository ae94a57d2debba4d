//! Identifier types.
//!
//! Players and referees get disjoint, monotonically assigned numeric suffixes
//! (`P01…`, `REF01…`). Ids serialize as their display string so the wire format
//! stays human readable.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Raised when an identifier string does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} identifier: {value:?}")]
pub struct IdParseError {
    pub kind: &'static str,
    pub value: String,
}

fn parse_suffix(value: &str, prefix: &str, kind: &'static str) -> Result<u32, IdParseError> {
    value
        .strip_prefix(prefix)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| IdParseError {
            kind,
            value: value.to_string(),
        })
}

/// Type-safe identifier for players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(pub u32);

impl Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{:02}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_suffix(s, "P", "player").map(Self)
    }
}

impl TryFrom<String> for PlayerId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.to_string()
    }
}

/// Type-safe identifier for referees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefereeId(pub u32);

impl Display for RefereeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "REF{:02}", self.0)
    }
}

impl FromStr for RefereeId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_suffix(s, "REF", "referee").map(Self)
    }
}

impl TryFrom<String> for RefereeId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RefereeId> for String {
    fn from(id: RefereeId) -> Self {
        id.to_string()
    }
}

/// Identifies a match by its 1-based round and 1-based position within the round (`R2M1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchId {
    pub round: u32,
    pub index: u32,
}

impl MatchId {
    pub fn new(round: u32, index: u32) -> Self {
        Self { round, index }
    }
}

impl Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}M{}", self.round, self.index)
    }
}

impl FromStr for MatchId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdParseError {
            kind: "match",
            value: s.to_string(),
        };
        let rest = s.strip_prefix('R').ok_or_else(invalid)?;
        let (round, index) = rest.split_once('M').ok_or_else(invalid)?;
        Ok(Self {
            round: round.parse().map_err(|_| invalid())?,
            index: index.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for MatchId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MatchId> for String {
    fn from(id: MatchId) -> Self {
        id.to_string()
    }
}

/// Role half of a sender identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Player,
    Referee,
    Manager,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Referee => "referee",
            Role::Manager => "manager",
        }
    }
}

/// Sender identity of the form `role:identifier`, e.g. `player:P01`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub role: Role,
    pub name: String,
}

impl Identity {
    pub fn player(id: PlayerId) -> Self {
        Self {
            role: Role::Player,
            name: id.to_string(),
        }
    }

    pub fn referee(id: RefereeId) -> Self {
        Self {
            role: Role::Referee,
            name: id.to_string(),
        }
    }

    pub fn manager() -> Self {
        Self {
            role: Role::Manager,
            name: "league".to_string(),
        }
    }

    /// The player id encoded in this identity, if any.
    pub fn player_id(&self) -> Option<PlayerId> {
        match self.role {
            Role::Player => self.name.parse().ok(),
            _ => None,
        }
    }

    /// The referee id encoded in this identity, if any.
    pub fn referee_id(&self) -> Option<RefereeId> {
        match self.role {
            Role::Referee => self.name.parse().ok(),
            _ => None,
        }
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.role.as_str(), self.name)
    }
}

impl FromStr for Identity {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdParseError {
            kind: "sender",
            value: s.to_string(),
        };
        let (role, name) = s.split_once(':').ok_or_else(invalid)?;
        let role = match role {
            "player" => Role::Player,
            "referee" => Role::Referee,
            "manager" => Role::Manager,
            _ => return Err(invalid()),
        };
        if name.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            role,
            name: name.to_string(),
        })
    }
}
