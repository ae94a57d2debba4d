//! Type-safe wrappers around the [`Transport`](crate::transport::Transport).
//!
//! Agents never build envelopes by hand; they call methods on these clients, which
//! stamp the sender credentials and map replies to typed results.

pub mod league_client;
pub mod player_link;
pub mod wire_client;

pub use league_client::*;
pub use player_link::*;
pub use wire_client::*;
