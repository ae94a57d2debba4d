use crate::model::{
    MatchId, MatchOutcome, MatchResult, ParityChoice, PlayerId, RefereeId,
};
use crate::model::AuthToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// REQUESTS
// =============================================================================

/// Every request an agent can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    LeagueRegisterRequest(LeagueRegisterRequest),
    RefereeRegisterRequest(RefereeRegisterRequest),
    MatchResultReport(MatchResultReport),
    LeagueQuery(LeagueQuery),
    StartMatch(StartMatch),
    GameInvitation(GameInvitation),
    ChooseParityCall(ChooseParityCall),
    GameOver(GameOver),
}

impl Message {
    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::LeagueRegisterRequest(_) => "LEAGUE_REGISTER_REQUEST",
            Message::RefereeRegisterRequest(_) => "REFEREE_REGISTER_REQUEST",
            Message::MatchResultReport(_) => "MATCH_RESULT_REPORT",
            Message::LeagueQuery(_) => "LEAGUE_QUERY",
            Message::StartMatch(_) => "START_MATCH",
            Message::GameInvitation(_) => "GAME_INVITATION",
            Message::ChooseParityCall(_) => "CHOOSE_PARITY_CALL",
            Message::GameOver(_) => "GAME_OVER",
        }
    }
}

/// Self-description supplied by a joining player. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlayerMeta {
    pub display_name: Option<String>,
    pub contact_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LeagueRegisterRequest {
    #[serde(default)]
    pub player_meta: PlayerMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RefereeMeta {
    pub display_name: Option<String>,
    pub contact_endpoint: Option<String>,
    pub max_concurrent_matches: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RefereeRegisterRequest {
    #[serde(default)]
    pub referee_meta: RefereeMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatchResultReport {
    pub match_id: MatchId,
    pub round_id: u32,
    pub player_a_id: PlayerId,
    pub player_b_id: PlayerId,
    pub player_a_result: MatchResult,
    pub player_b_result: MatchResult,
    pub winner_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawn_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&MatchOutcome> for MatchResultReport {
    fn from(outcome: &MatchOutcome) -> Self {
        Self {
            match_id: outcome.match_id,
            round_id: outcome.round_id,
            player_a_id: outcome.player_a,
            player_b_id: outcome.player_b,
            player_a_result: outcome.result_a,
            player_b_result: outcome.result_b,
            winner_id: outcome.winner,
            drawn_number: outcome.drawn_number(),
            reason: outcome.reason().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Standings,
    Schedule,
    Stats,
    NextMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LeagueQuery {
    pub query_type: QueryType,
}

/// Manager to referee: run this match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StartMatch {
    pub match_id: MatchId,
    pub round_id: u32,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub player_a_endpoint: String,
    pub player_b_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GameInvitation {
    pub match_id: MatchId,
    pub round_id: u32,
    pub opponent_id: PlayerId,
    pub join_deadline: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChooseParityCall {
    pub match_id: MatchId,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GameOver {
    pub match_id: MatchId,
    pub drawn_number: Option<u32>,
    pub your_choice: Option<ParityChoice>,
    pub opponent_choice: Option<ParityChoice>,
    pub result: MatchResult,
    pub points_earned: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// =============================================================================
// REPLIES
// =============================================================================

/// Every reply an agent can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reply {
    LeagueRegisterResponse(LeagueRegisterResponse),
    RefereeRegisterResponse(RefereeRegisterResponse),
    MatchResultAck(MatchResultAck),
    LeagueQueryResponse(LeagueQueryResponse),
    GameJoinAck(GameJoinAck),
    ChooseParityResponse(ChooseParityResponse),
    Ack,
    Rejected(Rejected),
}

impl Reply {
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::LeagueRegisterResponse(_) => "LEAGUE_REGISTER_RESPONSE",
            Reply::RefereeRegisterResponse(_) => "REFEREE_REGISTER_RESPONSE",
            Reply::MatchResultAck(_) => "MATCH_RESULT_ACK",
            Reply::LeagueQueryResponse(_) => "LEAGUE_QUERY_RESPONSE",
            Reply::GameJoinAck(_) => "GAME_JOIN_ACK",
            Reply::ChooseParityResponse(_) => "CHOOSE_PARITY_RESPONSE",
            Reply::Ack => "ACK",
            Reply::Rejected(_) => "REJECTED",
        }
    }

    pub fn rejected(status: impl Into<String>, reason: impl Into<String>) -> Self {
        Reply::Rejected(Rejected {
            status: status.into(),
            reason: reason.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LeagueRegisterResponse {
    pub status: String,
    pub player_id: PlayerId,
    pub auth_token: AuthToken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RefereeRegisterResponse {
    pub status: String,
    pub referee_id: RefereeId,
    pub auth_token: AuthToken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatchResultAck {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LeagueQueryResponse {
    pub query_type: QueryType,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GameJoinAck {
    pub match_id: MatchId,
    pub accepted: bool,
}

/// A player's answer to [`ChooseParityCall`].
///
/// The choice stays a raw string here; the referee decides whether it is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChooseParityResponse {
    pub match_id: MatchId,
    pub parity_choice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Rejected {
    pub status: String,
    pub reason: String,
}
