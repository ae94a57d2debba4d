use crate::clients::WireClient;
use crate::league::LeagueError;
use crate::model::{AuthToken, Identity, MatchOutcome};
use crate::protocol::{
    LeagueQuery, LeagueRegisterRequest, LeagueRegisterResponse, MatchResultReport, Message,
    PlayerMeta, ProtocolError, QueryType, RefereeMeta, RefereeRegisterRequest,
    RefereeRegisterResponse, Reply,
};
use crate::transport::Transport;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Client for talking to the league manager.
#[derive(Clone)]
pub struct LeagueClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
    identity: Identity,
    auth_token: Option<AuthToken>,
}

impl WireClient for LeagueClient {
    type Error = LeagueError;

    fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn auth_token(&self) -> Option<&AuthToken> {
        self.auth_token.as_ref()
    }
}

fn unexpected(expected: &'static str, reply: &Reply) -> LeagueError {
    ProtocolError::UnexpectedReply {
        expected,
        got: reply.kind().to_string(),
    }
    .into()
}

impl LeagueClient {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>, identity: Identity) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            identity,
            auth_token: None,
        }
    }

    /// The same client acting as a registered participant.
    pub fn with_credentials(&self, identity: Identity, auth_token: AuthToken) -> Self {
        Self {
            transport: self.transport.clone(),
            endpoint: self.endpoint.clone(),
            identity,
            auth_token: Some(auth_token),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip(self))]
    pub async fn register_player(&self, player_meta: PlayerMeta) -> Result<LeagueRegisterResponse, LeagueError> {
        let message = Message::LeagueRegisterRequest(LeagueRegisterRequest { player_meta });
        match self.request(&self.endpoint, message).await? {
            Reply::LeagueRegisterResponse(response) => Ok(response),
            other => Err(unexpected("LEAGUE_REGISTER_RESPONSE", &other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn register_referee(&self, referee_meta: RefereeMeta) -> Result<RefereeRegisterResponse, LeagueError> {
        let message = Message::RefereeRegisterRequest(RefereeRegisterRequest { referee_meta });
        match self.request(&self.endpoint, message).await? {
            Reply::RefereeRegisterResponse(response) => Ok(response),
            other => Err(unexpected("REFEREE_REGISTER_RESPONSE", &other)),
        }
    }

    /// Reports a finished match and returns the manager's status (`ACCEPTED` or `DUPLICATE`).
    #[instrument(skip(self, outcome), fields(match_id = %outcome.match_id))]
    pub async fn report_result(&self, outcome: &MatchOutcome) -> Result<String, LeagueError> {
        debug!("Reporting result");
        let message = Message::MatchResultReport(MatchResultReport::from(outcome));
        match self.request(&self.endpoint, message).await? {
            Reply::MatchResultAck(ack) => Ok(ack.status),
            other => Err(unexpected("MATCH_RESULT_ACK", &other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn query(&self, query_type: QueryType) -> Result<serde_json::Value, LeagueError> {
        let message = Message::LeagueQuery(LeagueQuery { query_type });
        match self.request(&self.endpoint, message).await? {
            Reply::LeagueQueryResponse(response) => Ok(response.data),
            other => Err(unexpected("LEAGUE_QUERY_RESPONSE", &other)),
        }
    }
}
