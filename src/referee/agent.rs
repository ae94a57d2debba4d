use crate::clients::{LeagueClient, PlayerLink};
use crate::framework::{AgentBehavior, AgentClient, AgentServer};
use crate::model::{AuthToken, Identity, MatchId, MatchOutcome, RefereeId, Role};
use crate::protocol::{Envelope, Message, RefereeMeta, Reply, StartMatch};
use crate::referee::{
    GameRule, MatchObserver, MatchOrchestrator, MatchState, MatchTicket, MatchTimeouts,
};
use crate::transport::{Transport, WireAgent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RefereeError {
    #[error("Registration failed: {0}")]
    Registration(#[from] crate::league::LeagueError),
}

#[derive(Debug)]
pub enum RefereeRequest {
    /// Register with the league manager.
    Register,
    Inbound(Envelope),
    MatchProgress { match_id: MatchId, state: MatchState },
    MatchFinished { outcome: MatchOutcome },
    ActiveMatches,
}

#[derive(Debug)]
pub enum RefereeReply {
    Registered(RefereeId),
    Wire(Reply),
    Active(Vec<(MatchId, MatchState)>),
    Ack,
}

pub struct RefereeContext {
    pub transport: Arc<dyn Transport>,
    /// Unauthenticated client pointed at the manager; credentials are added on registration.
    pub league: LeagueClient,
    pub self_client: AgentClient<RefereeAgent>,
}

struct ActiveMatch {
    state: MatchState,
    task: JoinHandle<MatchOutcome>,
}

/// Referee agent: accepts matches from the manager and runs each one in its own task.
pub struct RefereeAgent {
    display_name: String,
    endpoint: String,
    max_concurrent_matches: Option<u32>,
    rule: Arc<dyn GameRule>,
    timeouts: MatchTimeouts,
    credentials: Option<(RefereeId, AuthToken)>,
    active: HashMap<MatchId, ActiveMatch>,
    matches_refereed: usize,
}

impl RefereeAgent {
    pub fn new(
        display_name: impl Into<String>,
        endpoint: impl Into<String>,
        rule: Arc<dyn GameRule>,
        timeouts: MatchTimeouts,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            endpoint: endpoint.into(),
            max_concurrent_matches: None,
            rule,
            timeouts,
            credentials: None,
            active: HashMap::new(),
            matches_refereed: 0,
        }
    }

    pub fn with_max_concurrent_matches(mut self, limit: Option<u32>) -> Self {
        self.max_concurrent_matches = limit;
        self
    }

    pub fn spawnable(self, buffer_size: usize) -> (AgentServer<RefereeAgent>, AgentClient<RefereeAgent>) {
        AgentServer::new(self, buffer_size)
    }

    async fn register(&mut self, ctx: &RefereeContext) -> Result<RefereeId, RefereeError> {
        let response = ctx
            .league
            .register_referee(RefereeMeta {
                display_name: Some(self.display_name.clone()),
                contact_endpoint: Some(self.endpoint.clone()),
                max_concurrent_matches: self.max_concurrent_matches,
            })
            .await?;
        info!(referee_id = %response.referee_id, endpoint = %self.endpoint, "Referee registered");
        self.credentials = Some((response.referee_id, response.auth_token));
        Ok(response.referee_id)
    }

    fn on_envelope(&mut self, envelope: Envelope, ctx: &RefereeContext) -> Reply {
        let from_manager = envelope
            .identity()
            .is_some_and(|identity| identity.role == Role::Manager);
        match envelope.message {
            Message::StartMatch(start) if from_manager => self.start_match(start, ctx),
            Message::StartMatch(_) => {
                Reply::rejected("UNAUTHORIZED", "START_MATCH must come from the manager")
            }
            other => Reply::rejected("UNSUPPORTED", format!("referee does not handle {}", other.kind())),
        }
    }

    fn start_match(&mut self, start: StartMatch, ctx: &RefereeContext) -> Reply {
        let Some((referee_id, token)) = self.credentials.clone() else {
            return Reply::rejected("NOT_REGISTERED", "referee has not registered yet");
        };
        if self.active.contains_key(&start.match_id) {
            debug!(match_id = %start.match_id, "Match already running");
            return Reply::Ack;
        }
        if let Some(limit) = self.max_concurrent_matches {
            if self.active.len() >= limit as usize {
                return Reply::rejected("REFEREE_BUSY", format!("{limit} matches already running"));
            }
        }

        let identity = Identity::referee(referee_id);
        let match_id = start.match_id;
        let orchestrator = MatchOrchestrator::new(
            MatchTicket::from(start),
            PlayerLink::new(ctx.transport.clone(), identity.clone()),
            ctx.league.with_credentials(identity, token),
            self.rule.clone(),
            self.timeouts,
        )
        .with_observer(Arc::new(ctx.self_client.clone()));

        let task = tokio::spawn(orchestrator.run());
        self.active.insert(
            match_id,
            ActiveMatch {
                state: MatchState::Created,
                task,
            },
        );
        info!(%referee_id, %match_id, active = self.active.len(), "Match accepted");
        Reply::Ack
    }
}

#[async_trait]
impl AgentBehavior for RefereeAgent {
    type Request = RefereeRequest;
    type Reply = RefereeReply;
    type Context = RefereeContext;
    type Error = RefereeError;

    async fn handle(&mut self, request: RefereeRequest, ctx: &RefereeContext) -> Result<RefereeReply, RefereeError> {
        match request {
            RefereeRequest::Register => Ok(RefereeReply::Registered(self.register(ctx).await?)),
            RefereeRequest::Inbound(envelope) => Ok(RefereeReply::Wire(self.on_envelope(envelope, ctx))),
            RefereeRequest::MatchProgress { match_id, state } => {
                if let Some(active) = self.active.get_mut(&match_id) {
                    active.state = state;
                }
                Ok(RefereeReply::Ack)
            }
            RefereeRequest::MatchFinished { outcome } => {
                self.active.remove(&outcome.match_id);
                debug!(match_id = %outcome.match_id, active = self.active.len(), "Match retired");
                self.matches_refereed += 1;
                Ok(RefereeReply::Ack)
            }
            RefereeRequest::ActiveMatches => {
                let mut active: Vec<(MatchId, MatchState)> =
                    self.active.iter().map(|(id, m)| (*id, m.state)).collect();
                active.sort_by_key(|(id, _)| *id);
                Ok(RefereeReply::Active(active))
            }
        }
    }

    async fn on_stop(&mut self, _ctx: &RefereeContext) {
        for (match_id, active) in self.active.drain() {
            warn!(%match_id, state = ?active.state, "Aborting unfinished match");
            active.task.abort();
        }
        info!(
            referee = %self.display_name,
            matches_refereed = self.matches_refereed,
            "Referee stopped"
        );
    }
}

impl WireAgent for RefereeAgent {
    fn inbound(envelope: Envelope) -> RefereeRequest {
        RefereeRequest::Inbound(envelope)
    }

    fn outbound(reply: RefereeReply) -> Reply {
        match reply {
            RefereeReply::Wire(reply) => reply,
            _ => Reply::Ack,
        }
    }
}

#[async_trait]
impl MatchObserver for AgentClient<RefereeAgent> {
    async fn on_transition(&self, match_id: MatchId, state: MatchState) {
        if let Err(e) = self.cast(RefereeRequest::MatchProgress { match_id, state }).await {
            debug!(%match_id, error = %e, "Referee gone, progress dropped");
        }
    }

    async fn on_finished(&self, outcome: &MatchOutcome) {
        if let Err(e) = self
            .cast(RefereeRequest::MatchFinished {
                outcome: outcome.clone(),
            })
            .await
        {
            debug!(match_id = %outcome.match_id, error = %e, "Referee gone, outcome dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockTransport;
    use crate::model::PlayerId;
    use crate::protocol::RefereeRegisterResponse;
    use crate::referee::EvenOddRule;
    use crate::transport::InboundHandler;
    use std::time::Duration;

    const MANAGER: &str = "local://league-manager";

    fn spawn_referee(mock: &Arc<MockTransport>) -> (AgentClient<RefereeAgent>, JoinHandle<()>) {
        let timeouts = MatchTimeouts {
            join: Duration::from_secs(5),
            choice: Duration::from_secs(30),
        };
        let (server, client) =
            RefereeAgent::new("Ref", "local://referee-1", Arc::new(EvenOddRule::new()), timeouts).spawnable(8);
        let transport: Arc<dyn Transport> = mock.clone();
        let context = RefereeContext {
            transport: transport.clone(),
            league: LeagueClient::new(
                transport,
                MANAGER,
                Identity {
                    role: Role::Referee,
                    name: "referee-1".to_string(),
                },
            ),
            self_client: client.clone(),
        };
        (client, tokio::spawn(server.run(context)))
    }

    fn start_match() -> Envelope {
        Envelope::new(
            &Identity::manager(),
            None,
            Message::StartMatch(StartMatch {
                match_id: MatchId::new(1, 1),
                round_id: 1,
                player_a: PlayerId(1),
                player_b: PlayerId(2),
                player_a_endpoint: "local://player-1".to_string(),
                player_b_endpoint: "local://player-2".to_string(),
            }),
        )
    }

    async fn active(client: &AgentClient<RefereeAgent>) -> Vec<(MatchId, MatchState)> {
        match client.call(RefereeRequest::ActiveMatches).await.unwrap() {
            RefereeReply::Active(active) => active,
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_finished_match_leaves_active_table() {
        let mock = Arc::new(MockTransport::new());
        mock.expect_send(MANAGER)
            .of_type("REFEREE_REGISTER_REQUEST")
            .return_reply(Reply::RefereeRegisterResponse(RefereeRegisterResponse {
                status: "ACCEPTED".to_string(),
                referee_id: RefereeId(1),
                auth_token: AuthToken::generate(),
            }));
        mock.expect_send("local://player-1").of_type("GAME_INVITATION").never_reply();
        mock.expect_send("local://player-2").of_type("GAME_INVITATION").never_reply();
        let (client, handle) = spawn_referee(&mock);

        // Unregistered referees refuse work.
        match client.deliver(start_match()).await.unwrap() {
            Reply::Rejected(r) => assert_eq!(r.status, "NOT_REGISTERED"),
            other => panic!("unexpected reply {other:?}"),
        }
        assert!(matches!(
            client.call(RefereeRequest::Register).await.unwrap(),
            RefereeReply::Registered(RefereeId(1))
        ));

        assert_eq!(client.deliver(start_match()).await.unwrap(), Reply::Ack);
        // A repeated START_MATCH does not start a second run.
        assert_eq!(client.deliver(start_match()).await.unwrap(), Reply::Ack);
        assert_eq!(active(&client).await.len(), 1);

        let outcome = MatchOutcome::technical_loss(MatchId::new(1, 1), 1, PlayerId(1), PlayerId(2), "join_timeout");
        client
            .call(RefereeRequest::MatchFinished { outcome })
            .await
            .unwrap();
        assert!(active(&client).await.is_empty());

        client.shutdown().await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_observer_outlives_referee() {
        let mock = Arc::new(MockTransport::new());
        let (client, handle) = spawn_referee(&mock);
        client.shutdown().await.unwrap();
        handle.await.unwrap();

        // Casts into a stopped referee are dropped quietly.
        client.on_transition(MatchId::new(1, 1), MatchState::Invited).await;
        let outcome = MatchOutcome::technical_loss(MatchId::new(1, 1), 1, PlayerId(1), PlayerId(2), "choice_timeout");
        client.on_finished(&outcome).await;
        assert!(client.call(RefereeRequest::ActiveMatches).await.is_err());
    }
}
