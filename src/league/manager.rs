//! # League Manager Agent
//!
//! The manager owns every piece of league-wide state: the ledger, the standings,
//! the schedule and the start coordinator. It runs inside an [`AgentServer`], so
//! all of it is mutated by one logical thread of control; concurrently arriving
//! result reports from different referees are serialized by the mailbox.
//!
//! ## Requests
//!
//! | Request | Source |
//! |---|---|
//! | [`ManagerRequest::Inbound`] | wire messages from players and referees |
//! | [`ManagerRequest::StartDeadlineElapsed`] | the start countdown, via the manager's own client |
//! | [`ManagerRequest::StartNow`] | operator override that skips the countdown |
//! | [`ManagerRequest::ResumeRound`] | the manager itself, after a referee joins a stalled league |
//! | [`ManagerRequest::Snapshot`] | tests and the binary |
//!
//! The manager only ever awaits *referee* endpoints (to hand out matches). Referees
//! answer `START_MATCH` without calling back, so the manager can never wait on itself.

use crate::config::LeagueConfig;
use crate::framework::{AgentBehavior, AgentClient, AgentServer};
use crate::league::{
    Completion, LeagueError, LeagueStartCoordinator, RegistrationLedger, RoundScheduler,
    StandingsEntry, StandingsTable, StartTrigger,
};
use crate::model::{Identity, LeagueState, MatchAssignment, MatchResult, PlayerId, RefereeId, Role};
use crate::protocol::{
    Envelope, LeagueQuery, LeagueQueryResponse, LeagueRegisterRequest, LeagueRegisterResponse,
    MatchResultAck, MatchResultReport, Message, ProtocolError, QueryType, RefereeRegisterRequest,
    RefereeRegisterResponse, Reply, StartMatch,
};
use crate::transport::{Transport, WireAgent};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub enum ManagerRequest {
    Inbound(Envelope),
    StartDeadlineElapsed { generation: u64 },
    StartNow,
    /// Hands out a round that stalled for lack of referees.
    ResumeRound,
    Snapshot,
}

#[derive(Debug)]
pub enum ManagerReply {
    Wire(Reply),
    Snapshot(LeagueSnapshot),
    Ack,
}

/// Point-in-time view of the league, published after every request.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueSnapshot {
    pub state: LeagueState,
    pub players: usize,
    pub referees: usize,
    pub total_rounds: usize,
    /// Results counted in the current round.
    pub completed_in_round: usize,
    pub matches_reported: usize,
    pub standings: Vec<StandingsEntry>,
    pub champion: Option<StandingsEntry>,
}

impl LeagueSnapshot {
    fn initial() -> Self {
        Self {
            state: LeagueState::Registering,
            players: 0,
            referees: 0,
            total_rounds: 0,
            completed_in_round: 0,
            matches_reported: 0,
            standings: Vec::new(),
            champion: None,
        }
    }
}

/// Dependencies injected at `run()`.
pub struct ManagerContext {
    pub transport: Arc<dyn Transport>,
    /// Handle to the manager's own mailbox, used by the start countdown.
    pub self_client: AgentClient<LeagueManager>,
}

/// Delivers countdown expiry into the manager's mailbox.
struct MailboxTrigger {
    client: AgentClient<LeagueManager>,
}

#[async_trait]
impl StartTrigger for MailboxTrigger {
    async fn fire(&self, generation: u64) {
        if let Err(e) = self
            .client
            .cast(ManagerRequest::StartDeadlineElapsed { generation })
            .await
        {
            warn!(generation, error = %e, "Could not deliver start countdown");
        }
    }
}

pub struct LeagueManager {
    config: LeagueConfig,
    identity: Identity,
    ledger: RegistrationLedger,
    standings: StandingsTable,
    scheduler: RoundScheduler,
    coordinator: Option<LeagueStartCoordinator>,
    state: LeagueState,
    /// Set when the current round could not be handed to referees.
    round_stalled: bool,
    matches_reported: usize,
    status: watch::Sender<LeagueSnapshot>,
}

impl LeagueManager {
    pub fn new(config: LeagueConfig) -> (Self, watch::Receiver<LeagueSnapshot>) {
        let (status, receiver) = watch::channel(LeagueSnapshot::initial());
        let manager = Self {
            config,
            identity: Identity::manager(),
            ledger: RegistrationLedger::new(),
            standings: StandingsTable::new(),
            scheduler: RoundScheduler::new(),
            coordinator: None,
            state: LeagueState::Registering,
            round_stalled: false,
            matches_reported: 0,
            status,
        };
        (manager, receiver)
    }

    /// Builds the agent and its mailbox.
    pub fn spawnable(
        config: LeagueConfig,
    ) -> (
        AgentServer<LeagueManager>,
        AgentClient<LeagueManager>,
        watch::Receiver<LeagueSnapshot>,
    ) {
        let capacity = config.mailbox_capacity;
        let (manager, status) = Self::new(config);
        let (server, client) = AgentServer::new(manager, capacity);
        (server, client, status)
    }

    pub fn snapshot(&self) -> LeagueSnapshot {
        LeagueSnapshot {
            state: self.state,
            players: self.ledger.player_count(),
            referees: self.ledger.referee_count(),
            total_rounds: self.scheduler.rounds().len(),
            completed_in_round: self
                .scheduler
                .current_round()
                .map_or(0, |r| r.completed_count()),
            matches_reported: self.matches_reported,
            standings: self.standings.ranked(),
            champion: match self.state {
                LeagueState::Completed => self.standings.champion(),
                _ => None,
            },
        }
    }

    fn publish(&self) {
        self.status.send_replace(self.snapshot());
    }

    fn coordinator(&mut self) -> Result<&mut LeagueStartCoordinator, LeagueError> {
        self.coordinator
            .as_mut()
            .ok_or_else(|| LeagueError::AgentCommunicationError("manager not started".to_string()))
    }

    // -------------------------------------------------------------------------
    // Inbound dispatch
    // -------------------------------------------------------------------------

    async fn dispatch(&mut self, envelope: Envelope, ctx: &ManagerContext) -> Result<Reply, LeagueError> {
        let Envelope {
            sender,
            auth_token,
            message,
            ..
        } = envelope;
        match message {
            Message::LeagueRegisterRequest(request) => self.register_player(&sender, request).await,
            Message::RefereeRegisterRequest(request) => self.register_referee(request, ctx).await,
            Message::MatchResultReport(report) => {
                let identity = self.ledger.authorize(&sender, auth_token.as_ref())?;
                let referee = identity.referee_id().ok_or_else(|| {
                    LeagueError::Unauthorized(format!("{sender} may not report results"))
                })?;
                self.handle_result(report, referee, ctx).await
            }
            Message::LeagueQuery(query) => {
                let identity = self.ledger.authorize(&sender, auth_token.as_ref())?;
                self.handle_query(query, &identity)
            }
            other => Err(LeagueError::Unsupported(other.kind())),
        }
    }

    async fn register_player(&mut self, sender: &str, request: LeagueRegisterRequest) -> Result<Reply, LeagueError> {
        let registration = self.ledger.register_player(sender, request.player_meta);
        if registration.is_new {
            if self.state.has_started() {
                warn!(player_id = %registration.id, "Registered after league start, not scheduled");
            } else {
                let name = self
                    .ledger
                    .player(registration.id)
                    .map(|p| p.display_name.clone())
                    .unwrap_or_default();
                self.standings.register_player(registration.id, name);
            }
        }
        self.evaluate_start().await?;
        Ok(Reply::LeagueRegisterResponse(LeagueRegisterResponse {
            status: "ACCEPTED".to_string(),
            player_id: registration.id,
            auth_token: registration.auth_token,
        }))
    }

    async fn register_referee(&mut self, request: RefereeRegisterRequest, ctx: &ManagerContext) -> Result<Reply, LeagueError> {
        let registration = self.ledger.register_referee(request.referee_meta);
        self.evaluate_start().await?;
        let reply = Reply::RefereeRegisterResponse(RefereeRegisterResponse {
            status: "ACCEPTED".to_string(),
            referee_id: registration.id,
            auth_token: registration.auth_token,
        });
        if self.round_stalled {
            // The new referee is still waiting on this reply, so the round is
            // handed out from a later turn of the mailbox.
            info!(referee_id = %registration.id, "Referee joined, resuming stalled round");
            let client = ctx.self_client.clone();
            tokio::spawn(async move {
                if let Err(e) = client.cast(ManagerRequest::ResumeRound).await {
                    warn!(error = %e, "Could not resume stalled round");
                }
            });
        }
        Ok(reply)
    }

    async fn evaluate_start(&mut self) -> Result<(), LeagueError> {
        let players = self.standings.player_ids().len();
        let referees = self.ledger.referee_count();
        if let Some(deadline) = self.coordinator()?.evaluate(players, referees).await {
            self.state = LeagueState::Starting { deadline };
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // League progression
    // -------------------------------------------------------------------------

    async fn start_league(&mut self, ctx: &ManagerContext) {
        let players = self.standings.player_ids();
        let rounds = self.scheduler.generate_schedule(&players);
        info!(
            players = players.len(),
            rounds,
            matches = self.scheduler.total_matches(),
            "League started"
        );
        if rounds == 0 {
            self.complete_league();
            return;
        }
        self.state = LeagueState::InProgress { round: 0 };
        self.start_round(ctx).await;
    }

    /// Assigns referees to the current round and hands every match out.
    async fn start_round(&mut self, ctx: &ManagerContext) {
        let referees = self.ledger.referee_ids().to_vec();
        if let Err(e) = self.scheduler.assign_referees(&referees) {
            error!(error = %e, "Round cannot start");
            self.round_stalled = true;
            return;
        }
        self.round_stalled = false;

        let Some(round) = self.scheduler.current_round() else {
            return;
        };
        let round_id = round.round_id();
        let matches = round.matches.clone();
        info!(round = round_id, matches = matches.len(), "ROUND_ANNOUNCEMENT");

        for assignment in matches {
            if let Err(e) = self.send_start_match(&assignment, ctx).await {
                warn!(match_id = %assignment.match_id, error = %e, "START_MATCH delivery failed");
            }
        }
    }

    async fn send_start_match(&self, assignment: &MatchAssignment, ctx: &ManagerContext) -> Result<(), LeagueError> {
        let referee_id = assignment.referee_id.ok_or(LeagueError::NoRefereeAvailable)?;
        let referee = self
            .ledger
            .referee(referee_id)
            .ok_or(LeagueError::NoRefereeAvailable)?;
        let endpoint_of = |id: PlayerId| {
            self.ledger
                .player(id)
                .map(|p| p.endpoint.clone())
                .ok_or(LeagueError::UnknownPlayer(id))
        };
        let start = StartMatch {
            match_id: assignment.match_id,
            round_id: assignment.round_id,
            player_a: assignment.player_a,
            player_b: assignment.player_b,
            player_a_endpoint: endpoint_of(assignment.player_a)?,
            player_b_endpoint: endpoint_of(assignment.player_b)?,
        };
        debug!(match_id = %start.match_id, referee_id = %referee_id, "Sending START_MATCH");
        let envelope = Envelope::new(&self.identity, None, Message::StartMatch(start));
        ctx.transport.send(&referee.endpoint, envelope).await?;
        Ok(())
    }

    async fn handle_result(
        &mut self,
        report: MatchResultReport,
        referee: RefereeId,
        ctx: &ManagerContext,
    ) -> Result<Reply, LeagueError> {
        if !matches!(self.state, LeagueState::InProgress { .. }) {
            return Err(LeagueError::LeagueNotStarted);
        }
        self.validate_report(&report, referee)?;

        match self.scheduler.record_completion(report.match_id) {
            Completion::Unknown => return Err(LeagueError::UnknownMatch(report.match_id)),
            Completion::Duplicate => {
                warn!(match_id = %report.match_id, "Duplicate result ignored");
                return Ok(Reply::MatchResultAck(MatchResultAck {
                    status: "DUPLICATE".to_string(),
                }));
            }
            completion => {
                self.standings
                    .record_result(report.player_a_id, report.player_a_result)?;
                self.standings
                    .record_result(report.player_b_id, report.player_b_result)?;
                self.matches_reported += 1;
                info!(
                    match_id = %report.match_id,
                    player_a = %report.player_a_id,
                    result_a = %report.player_a_result,
                    player_b = %report.player_b_id,
                    result_b = %report.player_b_result,
                    "STANDINGS_UPDATE"
                );
                if completion == Completion::RoundComplete {
                    self.on_round_complete(ctx).await;
                }
            }
        }
        Ok(Reply::MatchResultAck(MatchResultAck {
            status: "ACCEPTED".to_string(),
        }))
    }

    fn validate_report(&self, report: &MatchResultReport, referee: RefereeId) -> Result<(), LeagueError> {
        let round = self
            .scheduler
            .current_round()
            .ok_or(LeagueError::LeagueNotStarted)?;
        let assignment = round
            .find(report.match_id)
            .ok_or(LeagueError::UnknownMatch(report.match_id))?;
        if assignment.referee_id != Some(referee) {
            return Err(LeagueError::Unauthorized(format!(
                "{referee} is not assigned to {}",
                report.match_id
            )));
        }
        if (assignment.player_a, assignment.player_b) != (report.player_a_id, report.player_b_id) {
            return Err(LeagueError::InvalidReport(format!(
                "{} is {} vs {}, report names {} vs {}",
                report.match_id,
                assignment.player_a,
                assignment.player_b,
                report.player_a_id,
                report.player_b_id
            )));
        }
        Self::check_results(report)
    }

    /// The two results must describe one match, and `winner_id` must agree with them.
    fn check_results(report: &MatchResultReport) -> Result<(), LeagueError> {
        use MatchResult::*;
        let winner = match (report.player_a_result, report.player_b_result) {
            (Win, Loss) => Some(report.player_a_id),
            (Loss, Win) => Some(report.player_b_id),
            (Draw, Draw) | (TechnicalLoss, TechnicalLoss) => None,
            (a, b) => {
                return Err(LeagueError::InvalidReport(format!(
                    "{} reports {a} against {b}",
                    report.match_id
                )))
            }
        };
        if report.winner_id != winner {
            return Err(LeagueError::InvalidReport(format!(
                "{} names winner {:?}, results say {:?}",
                report.match_id, report.winner_id, winner
            )));
        }
        Ok(())
    }

    async fn on_round_complete(&mut self, ctx: &ManagerContext) {
        let round = self.scheduler.current_round().map_or(0, |r| r.round_id());
        info!(round, "ROUND_COMPLETE\n{}", self.standings.render_table());

        if self.scheduler.advance_round() {
            if let Some(index) = self.scheduler.current_index() {
                self.state = LeagueState::InProgress { round: index };
            }
            self.start_round(ctx).await;
        } else {
            self.complete_league();
        }
    }

    fn complete_league(&mut self) {
        self.state = LeagueState::Completed;
        match self.standings.champion() {
            Some(champion) => info!(
                champion = %champion.player_id,
                name = %champion.display_name,
                points = champion.points,
                "LEAGUE_COMPLETED\n{}",
                self.standings.render_table()
            ),
            None => info!("LEAGUE_COMPLETED without players"),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    fn handle_query(&self, query: LeagueQuery, identity: &Identity) -> Result<Reply, LeagueError> {
        let data = match query.query_type {
            QueryType::Standings => serde_json::to_value(self.standings.ranked()),
            QueryType::Schedule => serde_json::to_value(self.scheduler.summary()),
            QueryType::Stats => serde_json::to_value(self.standings.stats()),
            QueryType::NextMatch => {
                let next = match identity.role {
                    Role::Player => identity
                        .player_id()
                        .and_then(|id| self.scheduler.player_next_match(id)),
                    _ => None,
                };
                serde_json::to_value(next)
            }
        }
        .map_err(ProtocolError::from)?;
        Ok(Reply::LeagueQueryResponse(LeagueQueryResponse {
            query_type: query.query_type,
            data,
        }))
    }
}

#[async_trait]
impl AgentBehavior for LeagueManager {
    type Request = ManagerRequest;
    type Reply = ManagerReply;
    type Context = ManagerContext;
    type Error = LeagueError;

    async fn on_start(&mut self, ctx: &ManagerContext) -> Result<(), LeagueError> {
        let trigger = Arc::new(MailboxTrigger {
            client: ctx.self_client.clone(),
        });
        self.coordinator = Some(LeagueStartCoordinator::new(
            self.config.min_players,
            self.config.min_referees,
            self.config.start_wait(),
            trigger,
        ));
        Ok(())
    }

    async fn handle(&mut self, request: ManagerRequest, ctx: &ManagerContext) -> Result<ManagerReply, LeagueError> {
        let reply = match request {
            ManagerRequest::Inbound(envelope) => {
                let kind = envelope.message.kind();
                let reply = match self.dispatch(envelope, ctx).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!(kind, error = %e, "Request rejected");
                        e.into_reply()
                    }
                };
                ManagerReply::Wire(reply)
            }
            ManagerRequest::StartDeadlineElapsed { generation } => {
                if self.coordinator()?.on_expiry(generation) {
                    self.start_league(ctx).await;
                }
                ManagerReply::Ack
            }
            ManagerRequest::StartNow => {
                if self.coordinator()?.start_now().await {
                    self.start_league(ctx).await;
                }
                ManagerReply::Ack
            }
            ManagerRequest::ResumeRound => {
                if self.round_stalled && matches!(self.state, LeagueState::InProgress { .. }) {
                    self.start_round(ctx).await;
                }
                ManagerReply::Ack
            }
            ManagerRequest::Snapshot => ManagerReply::Snapshot(self.snapshot()),
        };
        self.publish();
        Ok(reply)
    }

    async fn on_stop(&mut self, _ctx: &ManagerContext) {
        if let Some(coordinator) = self.coordinator.as_mut() {
            coordinator.disarm().await;
        }
        info!(
            state = self.state.label(),
            matches_reported = self.matches_reported,
            "League manager stopped"
        );
    }
}

impl WireAgent for LeagueManager {
    fn inbound(envelope: Envelope) -> ManagerRequest {
        ManagerRequest::Inbound(envelope)
    }

    fn outbound(reply: ManagerReply) -> Reply {
        match reply {
            ManagerReply::Wire(reply) => reply,
            ManagerReply::Snapshot(_) | ManagerReply::Ack => Reply::Ack,
        }
    }
}
