use crate::clients::LeagueClient;
use crate::framework::{AgentBehavior, AgentServer, AgentClient};
use crate::league::LeagueError;
use crate::model::{Identity, MatchId, PlayerId, Role};
use crate::player::ParityStrategy;
use crate::protocol::{
    ChooseParityResponse, Envelope, GameJoinAck, GameOver, Message, PlayerMeta, QueryType, Reply,
};
use crate::transport::WireAgent;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug)]
pub enum PlayerRequest {
    /// Register with the league manager.
    Register,
    Inbound(Envelope),
    /// Ask the manager something on this player's behalf.
    Query(QueryType),
    History,
}

#[derive(Debug)]
pub enum PlayerReply {
    Registered(PlayerId),
    Wire(Reply),
    QueryResult(serde_json::Value),
    History(Vec<GameOver>),
}

pub struct PlayerContext {
    /// Client pointed at the manager. Before registration it carries the provisional identity.
    pub league: LeagueClient,
}

/// Player agent: answers invitations and choice calls, keeps a record of its games.
pub struct PlayerAgent {
    display_name: String,
    endpoint: String,
    strategy: Box<dyn ParityStrategy>,
    accept_invitations: bool,
    registered: Option<(PlayerId, LeagueClient)>,
    opponents: HashMap<MatchId, PlayerId>,
    history: Vec<GameOver>,
}

impl PlayerAgent {
    pub fn new(display_name: impl Into<String>, endpoint: impl Into<String>, strategy: Box<dyn ParityStrategy>) -> Self {
        Self {
            display_name: display_name.into(),
            endpoint: endpoint.into(),
            strategy,
            accept_invitations: true,
            registered: None,
            opponents: HashMap::new(),
            history: Vec::new(),
        }
    }

    /// A player that declines every invitation.
    pub fn declining(mut self) -> Self {
        self.accept_invitations = false;
        self
    }

    pub fn spawnable(self, buffer_size: usize) -> (AgentServer<PlayerAgent>, AgentClient<PlayerAgent>) {
        AgentServer::new(self, buffer_size)
    }

    async fn register(&mut self, ctx: &PlayerContext) -> Result<PlayerId, LeagueError> {
        let response = ctx
            .league
            .register_player(PlayerMeta {
                display_name: Some(self.display_name.clone()),
                contact_endpoint: Some(self.endpoint.clone()),
            })
            .await?;
        let league = ctx
            .league
            .with_credentials(Identity::player(response.player_id), response.auth_token);
        info!(player_id = %response.player_id, name = %self.display_name, "Player registered");
        self.registered = Some((response.player_id, league));
        Ok(response.player_id)
    }

    fn on_envelope(&mut self, envelope: Envelope) -> Reply {
        let from_referee = envelope
            .identity()
            .is_some_and(|identity| identity.role == Role::Referee);
        if !from_referee {
            return Reply::rejected("UNAUTHORIZED", "players only answer referees");
        }
        match envelope.message {
            Message::GameInvitation(invitation) => {
                debug!(match_id = %invitation.match_id, opponent = %invitation.opponent_id, "Invitation");
                if self.accept_invitations {
                    self.opponents.insert(invitation.match_id, invitation.opponent_id);
                }
                Reply::GameJoinAck(GameJoinAck {
                    match_id: invitation.match_id,
                    accepted: self.accept_invitations,
                })
            }
            Message::ChooseParityCall(call) => {
                let opponent = self.opponents.get(&call.match_id).copied();
                let choice = self.strategy.choose(call.match_id, opponent);
                debug!(match_id = %call.match_id, %choice, "Choice made");
                Reply::ChooseParityResponse(ChooseParityResponse {
                    match_id: call.match_id,
                    parity_choice: choice.to_string(),
                })
            }
            Message::GameOver(game_over) => {
                info!(
                    player = %self.display_name,
                    match_id = %game_over.match_id,
                    result = %game_over.result,
                    points = game_over.points_earned,
                    "Game over"
                );
                self.opponents.remove(&game_over.match_id);
                self.history.push(game_over);
                Reply::Ack
            }
            other => Reply::rejected("UNSUPPORTED", format!("player does not handle {}", other.kind())),
        }
    }
}

#[async_trait]
impl AgentBehavior for PlayerAgent {
    type Request = PlayerRequest;
    type Reply = PlayerReply;
    type Context = PlayerContext;
    type Error = LeagueError;

    async fn handle(&mut self, request: PlayerRequest, ctx: &PlayerContext) -> Result<PlayerReply, LeagueError> {
        match request {
            PlayerRequest::Register => Ok(PlayerReply::Registered(self.register(ctx).await?)),
            PlayerRequest::Inbound(envelope) => Ok(PlayerReply::Wire(self.on_envelope(envelope))),
            PlayerRequest::Query(query_type) => {
                let (_, league) = self
                    .registered
                    .as_ref()
                    .ok_or_else(|| LeagueError::Unauthorized("player is not registered".to_string()))?;
                Ok(PlayerReply::QueryResult(league.query(query_type).await?))
            }
            PlayerRequest::History => Ok(PlayerReply::History(self.history.clone())),
        }
    }

    async fn on_stop(&mut self, _ctx: &PlayerContext) {
        let points: u32 = self.history.iter().map(|g| g.points_earned).sum();
        info!(player = %self.display_name, games = self.history.len(), points, "Player stopped");
    }
}

impl WireAgent for PlayerAgent {
    fn inbound(envelope: Envelope) -> PlayerRequest {
        PlayerRequest::Inbound(envelope)
    }

    fn outbound(reply: PlayerReply) -> Reply {
        match reply {
            PlayerReply::Wire(reply) => reply,
            _ => Reply::Ack,
        }
    }
}
