//! Error types for match orchestration.

use crate::model::PlayerId;
use crate::transport::TransportError;
use thiserror::Error;

/// Why a match could not be played to a normal result.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchError {
    #[error("{player} did not join: {detail}")]
    JoinTimeout { player: PlayerId, detail: String },

    #[error("{player} did not choose in time: {detail}")]
    ChoiceTimeout { player: PlayerId, detail: String },

    #[error("{player} sent an invalid choice {value:?}")]
    InvalidChoiceValue { player: PlayerId, value: String },

    /// The request never got a usable reply.
    #[error("Delivery failed: {0}")]
    DeliveryFailure(#[from] TransportError),
}

impl MatchError {
    /// Reason string recorded with a technical loss.
    ///
    /// Anything that goes wrong while collecting choices counts as `choice_timeout`.
    pub fn reason(&self) -> &'static str {
        match self {
            MatchError::JoinTimeout { .. } => "join_timeout",
            MatchError::ChoiceTimeout { .. } | MatchError::InvalidChoiceValue { .. } => {
                "choice_timeout"
            }
            MatchError::DeliveryFailure(_) => "delivery_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons() {
        let invalid = MatchError::InvalidChoiceValue {
            player: PlayerId(1),
            value: "maybe".into(),
        };
        assert_eq!(invalid.reason(), "choice_timeout");
        assert_eq!(
            MatchError::JoinTimeout {
                player: PlayerId(2),
                detail: "declined".into()
            }
            .reason(),
            "join_timeout"
        );
        let delivery: MatchError = TransportError::UnknownEndpoint("x".into()).into();
        assert_eq!(delivery.reason(), "delivery_failure");
    }
}
