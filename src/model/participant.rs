use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Opaque bearer token issued at registration.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn generate() -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        Self(format!("tok_{token}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AuthToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Tokens never show up in logs.
impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

impl Display for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

/// A registered player or referee.
///
/// `I` is the identifier type, so a `Participant<PlayerId>` can never be mistaken
/// for a `Participant<RefereeId>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant<I> {
    pub id: I,
    pub display_name: String,
    pub endpoint: String,
    pub auth_token: AuthToken,
}

pub const UNKNOWN_NAME: &str = "Unknown";

pub type PlayerRecord = Participant<crate::model::PlayerId>;
pub type RefereeRecord = Participant<crate::model::RefereeId>;
