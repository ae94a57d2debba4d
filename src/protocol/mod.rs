//! # Wire Protocol
//!
//! Every exchange between agents is an [`Envelope`] carrying one [`Message`] and
//! answered by one [`Reply`]. Both enums are closed sets tagged by their wire name:
//!
//! ```json
//! {
//!   "sender": "referee:REF01",
//!   "authToken": "tok_…",
//!   "conversationId": "conv-5f1c…",
//!   "timestamp": "2026-01-01T12:00:00Z",
//!   "message": { "type": "MATCH_RESULT_REPORT", "payload": { "matchId": "R1M1", … } }
//! }
//! ```
//!
//! Payloads reject unknown fields, so a typo in a field name fails at decode time
//! instead of silently falling back to a default deep inside an agent.

pub mod messages;

pub use messages::*;

use crate::model::{AuthToken, Identity};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Errors raised while encoding, decoding or interpreting wire messages.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply { expected: &'static str, got: String },
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        ProtocolError::Malformed(e.to_string())
    }
}

/// Addressing and authentication metadata wrapped around every [`Message`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Envelope {
    /// `role:identifier`, e.g. `player:P01`.
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<AuthToken>,
    pub conversation_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: Message,
}

impl Envelope {
    pub fn new(sender: &Identity, auth_token: Option<AuthToken>, message: Message) -> Self {
        Self {
            sender: sender.to_string(),
            auth_token,
            conversation_id: format!("conv-{:016x}", rand::thread_rng().gen::<u64>()),
            timestamp: Utc::now(),
            message,
        }
    }

    /// The parsed sender identity, if it is well formed.
    pub fn identity(&self) -> Option<Identity> {
        self.sender.parse().ok()
    }
}

pub fn encode_envelope(envelope: &Envelope) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(envelope)?)
}

pub fn decode_envelope(raw: &str) -> Result<Envelope, ProtocolError> {
    Ok(serde_json::from_str(raw)?)
}

pub fn encode_reply(reply: &Reply) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(reply)?)
}

pub fn decode_reply(raw: &str) -> Result<Reply, ProtocolError> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchId, MatchResult, PlayerId};

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = Envelope::new(
            &Identity::manager(),
            None,
            Message::ChooseParityCall(ChooseParityCall {
                match_id: MatchId::new(1, 2),
                deadline: Utc::now(),
            }),
        );
        let raw = encode_envelope(&envelope).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["sender"], "manager:league");
        assert_eq!(value["message"]["type"], "CHOOSE_PARITY_CALL");
        assert_eq!(value["message"]["payload"]["matchId"], "R1M2");
        assert!(value.get("authToken").is_none());

        let back = decode_envelope(&raw).unwrap();
        assert_eq!(back.message.kind(), "CHOOSE_PARITY_CALL");
        assert_eq!(back.identity(), Some(Identity::manager()));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let raw = r#"{
            "sender": "referee:REF01",
            "conversationId": "c1",
            "timestamp": "2026-01-01T00:00:00Z",
            "message": {"type": "LEAGUE_QUERY", "payload": {"queryType": "stats", "verbose": true}}
        }"#;
        assert!(matches!(
            decode_envelope(raw),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_message_type_is_rejected() {
        let raw = r#"{
            "sender": "referee:REF01",
            "conversationId": "c1",
            "timestamp": "2026-01-01T00:00:00Z",
            "message": {"type": "SURRENDER", "payload": {}}
        }"#;
        assert!(decode_envelope(raw).is_err());
    }

    #[test]
    fn test_registration_meta_defaults() {
        let raw = r#"{
            "sender": "player:alice",
            "conversationId": "c1",
            "timestamp": "2026-01-01T00:00:00Z",
            "message": {"type": "LEAGUE_REGISTER_REQUEST", "payload": {}}
        }"#;
        let envelope = decode_envelope(raw).unwrap();
        match envelope.message {
            Message::LeagueRegisterRequest(req) => {
                assert_eq!(req.player_meta.display_name, None);
                assert_eq!(req.player_meta.contact_endpoint, None);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_result_report_round_trip() {
        let report = MatchResultReport {
            match_id: MatchId::new(2, 1),
            round_id: 2,
            player_a_id: PlayerId(1),
            player_b_id: PlayerId(3),
            player_a_result: MatchResult::Win,
            player_b_result: MatchResult::Loss,
            winner_id: Some(PlayerId(1)),
            drawn_number: Some(4),
            reason: None,
        };
        let raw = serde_json::to_string(&Message::MatchResultReport(report.clone())).unwrap();
        assert!(raw.contains("\"playerAResult\":\"WIN\""));
        let back: Message = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, Message::MatchResultReport(report));
    }

    #[test]
    fn test_rejected_reply_shape() {
        let reply = Reply::rejected("UNAUTHORIZED", "bad token");
        let raw = encode_reply(&reply).unwrap();
        assert!(raw.contains("\"type\":\"REJECTED\""));
        assert_eq!(decode_reply(&raw).unwrap(), reply);
        assert_eq!(decode_reply(r#"{"type":"ACK"}"#).unwrap(), Reply::Ack);
    }
}
