//! Generic agent runtime.
//!
//! This module provides the building blocks every league agent is made of.
//!
//! # Main Components
//!
//! - [`AgentBehavior`] - Trait that agent state implements to be driven by a mailbox loop
//! - [`AgentServer`] - Generic loop that owns the state and processes requests one at a time
//! - [`AgentClient`] - Cloneable handle for calling into an agent
//! - [`FrameworkError`] - Common error types
//!
//! # Testing
//!
//! See [`mock`] module for a scripted [`Transport`](crate::transport::Transport) that lets
//! referee and manager logic run without spawning real peers.

pub mod core;
pub mod mock;

pub use core::*;
