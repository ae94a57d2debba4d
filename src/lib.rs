#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Parity League
//!
//! > **A round-robin even/odd tournament run by message-passing agents.**
//!
//! Players and referees join a league manager over a request/response boundary.
//! Once enough of them have registered, the manager builds a round-robin schedule
//! and hands each match to a referee. The referee invites both players, collects a
//! timed "even"/"odd" choice from each, draws a number and reports the result.
//! Standings accumulate round by round until a champion emerges.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Agents own their state
//!
//! The manager, every referee and every player is an agent: private state behind a
//! mailbox, driven by the generic [`AgentServer`](framework::AgentServer) loop. The
//! manager's registries, schedule and standings are therefore mutated by exactly
//! one logical thread of control, with no locks. Separate agents (and separate
//! matches) still run fully in parallel.
//!
//! ### Two hard pieces
//!
//! - **The match state machine** ([`referee::MatchOrchestrator`]): invite → collect
//!   timed choices → resolve → notify → report, with an all-or-nothing technical
//!   loss when a player does not join or does not answer in time.
//! - **League progression** ([`league::LeagueManager`]): debounced auto-start,
//!   circle-method scheduling, referee assignment, round-completion counting and
//!   league completion.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Each side has its own error type ([`LeagueError`](league::LeagueError),
//! [`MatchError`](referee::MatchError), [`TransportError`](transport::TransportError)).
//! Business errors become `REJECTED` replies at the boundary; match errors become
//! technical losses. Nothing is process-fatal.
//!
//! ### 2. Async Context Injection
//! Dependencies (transport, a handle to the agent's own mailbox) are injected when
//! the agent is `run()`, not when it is built. This "late binding" lets the manager
//! arm timers that post back into its own mailbox.
//!
//! ### 3. Strict Wire Schemas
//! Every message is a variant of a closed, tagged enum ([`protocol::Message`]) with
//! `deny_unknown_fields` payloads. The in-process network serializes every hop, so
//! malformed messages are rejected at the edge, never deep inside an agent.
//!
//! ### 4. Observability
//! `tracing` everywhere, with `match_id`, `player_id`, `referee_id` and `round`
//! fields. See the [`lifecycle::tracing`] module.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! Generic agent runtime plus a scripted [`MockTransport`](framework::mock::MockTransport).
//!
//! ### 2. The Boundary ([`protocol`], [`transport`])
//! Message schemas, the [`Transport`](transport::Transport) trait and the
//! [`LocalNetwork`](transport::LocalNetwork) that routes envelopes between agents.
//!
//! ### 3. The Domain ([`model`], [`league`], [`referee`], [`player`])
//! Identifiers and results; the manager's ledger, standings, scheduler and start
//! coordinator; the referee's rule and orchestrator; the player's strategies.
//!
//! ### 4. The Interface ([`clients`])
//! [`LeagueClient`](clients::LeagueClient) and [`PlayerLink`](clients::PlayerLink)
//! wrap the transport in typed calls.
//!
//! ### 5. The Orchestrator ([`lifecycle`], [`config`])
//! [`LeagueSystem`](lifecycle::LeagueSystem) spawns and wires every agent;
//! [`LeagueConfig`](config::LeagueConfig) holds thresholds and timeouts.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run a six-player league with two referees
//! RUST_LOG=info cargo run -- --players 6 --referees 2 --wait 1
//!
//! # Run tests
//! cargo test
//! ```

pub mod clients;
pub mod config;
pub mod framework;
pub mod league;
pub mod lifecycle;
pub mod model;
pub mod player;
pub mod protocol;
pub mod referee;
pub mod transport;
