//! # System Lifecycle & Orchestration
//!
//! Individual agents are simple; wiring them together is where the complexity
//! lives. [`LeagueSystem`] is the conductor:
//!
//! 1. **Agent creation** - build the manager, referees and players with their mailboxes
//! 2. **Context injection** - hand each agent its transport and a handle to itself at `run()`
//! 3. **Endpoint binding** - put every agent on the [`LocalNetwork`](crate::transport::LocalNetwork)
//! 4. **Registration** - referees and players register with the manager over the wire
//! 5. **Graceful shutdown** - explicit `Shutdown` to every agent, then await all tasks
//!
//! ```rust,ignore
//! let mut system = LeagueSystem::start(LeagueConfig::default());
//! system.add_referee().await?;
//! for name in ["Ada", "Brian", "Chen", "Dana"] {
//!     system.add_player(name, Box::new(RandomParity)).await?;
//! }
//! let final_state = system.wait_for_completion().await?;
//! system.shutdown().await?;
//! ```
//!
//! ## Why explicit shutdown
//!
//! The dependency graph is cyclic: the manager holds a client to itself for the
//! start countdown, referees hold one for match progress, and the network holds
//! one for every bound endpoint. Dropping clients would never close those
//! mailboxes, so [`LeagueSystem::shutdown`] unbinds all endpoints and sends
//! `Shutdown` to each agent.
//!
//! See [`tracing`] for the logging setup.

pub mod league_system;
pub mod tracing;

pub use league_system::*;
pub use tracing::*;
