//! Player side: parity strategies and the [`PlayerAgent`].

pub mod agent;
pub mod strategy;

pub use agent::*;
pub use strategy::*;
