//! # The RPC Boundary
//!
//! Agents never hold references to each other. They address peers by endpoint
//! string and exchange [`Envelope`]s through a [`Transport`]:
//!
//! ```rust,ignore
//! let reply = transport.send("local://referee-1", envelope).await?;
//! ```
//!
//! A non-success reply ([`Reply::Rejected`]) surfaces as [`TransportError::Rejected`],
//! so callers only ever see "a useful reply" or "an error".
//!
//! On the receiving side, any agent whose behavior implements [`WireAgent`] can be
//! bound to an endpoint: its [`AgentClient`] becomes an [`InboundHandler`] that
//! pushes each envelope through the agent's mailbox.

pub mod local;

pub use local::LocalNetwork;

use crate::framework::{AgentBehavior, AgentClient, FrameworkError};
use crate::protocol::{Envelope, ProtocolError, Reply};
use async_trait::async_trait;

/// Failures of a single request/response round trip.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("Codec error: {0}")]
    Codec(#[from] ProtocolError),

    #[error("Rejected ({status}): {reason}")]
    Rejected { status: String, reason: String },
}

/// Client half of the boundary.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Performs one round trip and returns the peer's reply.
    async fn send(&self, endpoint: &str, envelope: Envelope) -> Result<Reply, TransportError>;
}

/// Server half of the boundary: whatever sits behind an endpoint.
#[async_trait]
pub trait InboundHandler: Send + Sync + 'static {
    async fn deliver(&self, envelope: Envelope) -> Result<Reply, TransportError>;
}

/// Turns a `Rejected` reply into an error.
pub fn accept(reply: Reply) -> Result<Reply, TransportError> {
    match reply {
        Reply::Rejected(rejected) => Err(TransportError::Rejected {
            status: rejected.status,
            reason: rejected.reason,
        }),
        other => Ok(other),
    }
}

/// An agent that can sit behind an endpoint.
pub trait WireAgent: AgentBehavior {
    /// Wraps an inbound envelope into a mailbox request.
    fn inbound(envelope: Envelope) -> Self::Request;

    /// Extracts the wire reply from a mailbox reply.
    fn outbound(reply: Self::Reply) -> Reply;
}

#[async_trait]
impl<T: WireAgent> InboundHandler for AgentClient<T> {
    async fn deliver(&self, envelope: Envelope) -> Result<Reply, TransportError> {
        match self.call(T::inbound(envelope)).await {
            Ok(reply) => Ok(T::outbound(reply)),
            Err(FrameworkError::AgentError(e)) => Ok(Reply::rejected("ERROR", e.to_string())),
            Err(e) => Err(TransportError::Unreachable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{GameJoinAck, Rejected};
    use crate::model::MatchId;

    #[test]
    fn test_accept_maps_rejections() {
        let ok = Reply::GameJoinAck(GameJoinAck {
            match_id: MatchId::new(1, 1),
            accepted: true,
        });
        assert_eq!(accept(ok.clone()), Ok(ok));
        assert_eq!(
            accept(Reply::Rejected(Rejected {
                status: "UNAUTHORIZED".into(),
                reason: "no token".into()
            })),
            Err(TransportError::Rejected {
                status: "UNAUTHORIZED".into(),
                reason: "no token".into()
            })
        );
    }
}
