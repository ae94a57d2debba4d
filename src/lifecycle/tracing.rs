//! # Observability & Tracing
//!
//! This module provides the tracing setup for the whole league.
//!
//! ## Overview
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber` formatter filtered by
//! `RUST_LOG`. The module prefix is hidden (`with_target(false)`); agents identify
//! themselves through structured fields instead (`agent_type`, `match_id`,
//! `player_id`, `referee_id`, `round`).
//!
//! ## What Gets Traced
//!
//! - **Agent lifecycle**: `Agent started` / `Shutdown` with `agent_type`
//! - **Registration**: `Player registered`, `Referee registered`
//! - **Matches**: one `Match transition` event per state change, keyed by `match_id`
//! - **League progress**: `ROUND_ANNOUNCEMENT`, `STANDINGS_UPDATE`, `ROUND_COMPLETE`,
//!   `LEAGUE_COMPLETED` (the last two carry a rendered standings table)
//! - **Failures**: technical losses, rejected requests, failed deliveries
//!
//! ## Usage Examples
//!
//! ```bash
//! # League progress only
//! RUST_LOG=info cargo run
//!
//! # Every envelope and mailbox request
//! RUST_LOG=debug cargo run
//!
//! # Just the referee state machines
//! RUST_LOG=parity_league::referee=info cargo run
//! ```
//!
//! ## Workflow Trace Example
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO Start countdown armed generation=1 wait_secs=0 players=4 referees=1
//! INFO League started players=4 rounds=3 matches=6
//! INFO ROUND_ANNOUNCEMENT round=1 matches=2
//! INFO Match transition match_id=R1M1 from=Created to=Invited
//! INFO Match transition match_id=R1M1 from=Invited to=ChoicesPending
//! INFO Match resolved match_id=R1M1 drawn_number=4 choice_a=even choice_b=odd winner=Some(P01)
//! INFO STANDINGS_UPDATE match_id=R1M1 player_a=P01 result_a=WIN player_b=P04 result_b=LOSS
//! ```

/// Installs the global subscriber. Call once, at process start.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
