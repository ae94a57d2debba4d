//! # Match Orchestration
//!
//! One [`MatchOrchestrator`] drives one match from invitation to report:
//!
//! ```text
//! Created ──► Invited ──► ChoicesPending ──► Resolved ──► Reported
//!                │               │
//!                └───────┬───────┘
//!                        ▼
//!                  TechnicalLoss ──► (notify + report)
//! ```
//!
//! ## Shared deadlines
//!
//! Both players are asked at once and both requests race the *same* deadline. A
//! slow player never delays gathering the other player's answer, and a request
//! still pending when the deadline passes is dropped (cancelled).
//!
//! ## All-or-nothing technical loss
//!
//! If either player fails to join, or fails to produce a valid choice in time,
//! both players get `TECHNICAL_LOSS`. The compliant player is not awarded a win.
//!
//! ## Containment
//!
//! [`MatchOrchestrator::run`] cannot fail: every error ends as a technical loss.
//! Notifications and the final report are best effort and only logged.

use crate::clients::{LeagueClient, PlayerLink};
use crate::model::{MatchId, MatchOutcome, ParityChoice, PlayerId, Resolution};
use crate::protocol::{ChooseParityCall, GameInvitation, GameOver, StartMatch};
use crate::referee::{GameRule, MatchError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchState {
    Created,
    Invited,
    ChoicesPending,
    Resolved,
    Reported,
    TechnicalLoss,
}

/// Everything the referee is told about a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTicket {
    pub match_id: MatchId,
    pub round_id: u32,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub endpoint_a: String,
    pub endpoint_b: String,
}

impl From<StartMatch> for MatchTicket {
    fn from(start: StartMatch) -> Self {
        Self {
            match_id: start.match_id,
            round_id: start.round_id,
            player_a: start.player_a,
            player_b: start.player_b,
            endpoint_a: start.player_a_endpoint,
            endpoint_b: start.player_b_endpoint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchTimeouts {
    pub join: Duration,
    pub choice: Duration,
}

/// Hears about a match's progress. Implemented by the referee agent's client.
#[async_trait]
pub trait MatchObserver: Send + Sync + 'static {
    async fn on_transition(&self, match_id: MatchId, state: MatchState);
    async fn on_finished(&self, outcome: &MatchOutcome);
}

fn wall_deadline(after: Duration) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::from_std(after).unwrap_or_else(|_| chrono::Duration::zero())
}

pub struct MatchOrchestrator {
    ticket: MatchTicket,
    state: MatchState,
    players: PlayerLink,
    league: LeagueClient,
    rule: Arc<dyn GameRule>,
    timeouts: MatchTimeouts,
    observer: Option<Arc<dyn MatchObserver>>,
}

impl MatchOrchestrator {
    pub fn new(
        ticket: MatchTicket,
        players: PlayerLink,
        league: LeagueClient,
        rule: Arc<dyn GameRule>,
        timeouts: MatchTimeouts,
    ) -> Self {
        Self {
            ticket,
            state: MatchState::Created,
            players,
            league,
            rule,
            timeouts,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn MatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    /// Plays the match to the end and returns the reported outcome.
    pub async fn run(mut self) -> MatchOutcome {
        info!(match_id = %self.ticket.match_id, player_a = %self.ticket.player_a, player_b = %self.ticket.player_b, "Match starting");

        self.transition(MatchState::Invited).await;
        if let Err(e) = self.invite_both().await {
            return self.abandon(e).await;
        }

        self.transition(MatchState::ChoicesPending).await;
        let (choice_a, choice_b) = match self.collect_choices().await {
            Ok(choices) => choices,
            Err(e) => return self.abandon(e).await,
        };

        let verdict = self.rule.resolve(choice_a, choice_b);
        let winner = match (verdict.result_a.points(), verdict.result_b.points()) {
            (a, b) if a > b => Some(self.ticket.player_a),
            (a, b) if b > a => Some(self.ticket.player_b),
            _ => None,
        };
        let outcome = MatchOutcome {
            match_id: self.ticket.match_id,
            round_id: self.ticket.round_id,
            player_a: self.ticket.player_a,
            player_b: self.ticket.player_b,
            result_a: verdict.result_a,
            result_b: verdict.result_b,
            winner,
            resolution: Resolution::Decided {
                drawn_number: verdict.drawn_number,
                choice_a,
                choice_b,
            },
        };
        info!(
            match_id = %outcome.match_id,
            drawn_number = verdict.drawn_number,
            choice_a = %choice_a,
            choice_b = %choice_b,
            winner = ?outcome.winner,
            "Match resolved"
        );
        self.transition(MatchState::Resolved).await;

        self.finish(outcome, MatchState::Reported).await
    }

    async fn transition(&mut self, state: MatchState) {
        info!(match_id = %self.ticket.match_id, from = ?self.state, to = ?state, "Match transition");
        self.state = state;
        if let Some(observer) = &self.observer {
            observer.on_transition(self.ticket.match_id, state).await;
        }
    }

    async fn invite_both(&self) -> Result<(), MatchError> {
        let t = &self.ticket;
        let deadline = Instant::now() + self.timeouts.join;
        let join_deadline = wall_deadline(self.timeouts.join);
        let invitation = |opponent_id| GameInvitation {
            match_id: t.match_id,
            round_id: t.round_id,
            opponent_id,
            join_deadline,
        };

        let (a, b) = tokio::join!(
            timeout_at(deadline, self.players.invite(t.player_a, &t.endpoint_a, invitation(t.player_b))),
            timeout_at(deadline, self.players.invite(t.player_b, &t.endpoint_b, invitation(t.player_a))),
        );
        let joined = |player: PlayerId, result: Result<Result<(), MatchError>, _>| match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e @ MatchError::JoinTimeout { .. })) => Err(e),
            Ok(Err(e)) => Err(MatchError::JoinTimeout {
                player,
                detail: e.to_string(),
            }),
            Err(_) => Err(MatchError::JoinTimeout {
                player,
                detail: "join deadline elapsed".to_string(),
            }),
        };
        joined(t.player_a, a)?;
        joined(t.player_b, b)
    }

    async fn collect_choices(&self) -> Result<(ParityChoice, ParityChoice), MatchError> {
        let t = &self.ticket;
        let deadline = Instant::now() + self.timeouts.choice;
        let call = ChooseParityCall {
            match_id: t.match_id,
            deadline: wall_deadline(self.timeouts.choice),
        };

        let (a, b) = tokio::join!(
            timeout_at(deadline, self.players.choose_parity(t.player_a, &t.endpoint_a, call.clone())),
            timeout_at(deadline, self.players.choose_parity(t.player_b, &t.endpoint_b, call)),
        );
        let chosen = |player: PlayerId, result: Result<Result<ParityChoice, MatchError>, _>| match result {
            Ok(Ok(choice)) => Ok(choice),
            Ok(Err(e @ MatchError::InvalidChoiceValue { .. })) => Err(e),
            Ok(Err(e)) => Err(MatchError::ChoiceTimeout {
                player,
                detail: e.to_string(),
            }),
            Err(_) => Err(MatchError::ChoiceTimeout {
                player,
                detail: "choice deadline elapsed".to_string(),
            }),
        };
        Ok((chosen(t.player_a, a)?, chosen(t.player_b, b)?))
    }

    async fn abandon(mut self, cause: MatchError) -> MatchOutcome {
        warn!(match_id = %self.ticket.match_id, reason = cause.reason(), error = %cause, "Technical loss");
        self.transition(MatchState::TechnicalLoss).await;
        let t = &self.ticket;
        let outcome = MatchOutcome::technical_loss(t.match_id, t.round_id, t.player_a, t.player_b, cause.reason());
        self.finish(outcome, MatchState::TechnicalLoss).await
    }

    /// Notifies both players, reports to the manager and hands the outcome back.
    async fn finish(mut self, outcome: MatchOutcome, terminal: MatchState) -> MatchOutcome {
        self.notify_players(&outcome).await;

        match self.league.report_result(&outcome).await {
            Ok(status) => info!(match_id = %outcome.match_id, %status, "Result reported"),
            Err(e) => error!(match_id = %outcome.match_id, error = %e, "Result report failed"),
        }
        if terminal == MatchState::Reported {
            self.transition(MatchState::Reported).await;
        }
        if let Some(observer) = &self.observer {
            observer.on_finished(&outcome).await;
        }
        outcome
    }

    async fn notify_players(&self, outcome: &MatchOutcome) {
        let t = &self.ticket;
        let (your_a, your_b) = match &outcome.resolution {
            Resolution::Decided { choice_a, choice_b, .. } => (Some(*choice_a), Some(*choice_b)),
            Resolution::TechnicalLoss { .. } => (None, None),
        };
        let game_over = |result: crate::model::MatchResult, yours, theirs| GameOver {
            match_id: outcome.match_id,
            drawn_number: outcome.drawn_number(),
            your_choice: yours,
            opponent_choice: theirs,
            result,
            points_earned: result.points(),
            reason: outcome.reason().map(str::to_string),
        };

        let (a, b) = tokio::join!(
            self.players.game_over(&t.endpoint_a, game_over(outcome.result_a, your_a, your_b)),
            self.players.game_over(&t.endpoint_b, game_over(outcome.result_b, your_b, your_a)),
        );
        for (player, result) in [(t.player_a, a), (t.player_b, b)] {
            if let Err(e) = result {
                warn!(match_id = %t.match_id, player = %player, error = %e, "GAME_OVER delivery failed");
            }
        }
    }
}
