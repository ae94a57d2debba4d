use crate::protocol::{self, Envelope, Reply};
use crate::transport::{accept, InboundHandler, Transport, TransportError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// In-process network: endpoints map to inbound handlers in a routing table.
///
/// Every hop is serialized to JSON and parsed back, so the schema checks a real
/// network peer would apply run on each request and each reply.
pub struct LocalNetwork {
    routes: RwLock<HashMap<String, Arc<dyn InboundHandler>>>,
    request_timeout: Option<Duration>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            request_timeout: None,
        }
    }

    /// Fails any round trip that takes longer than `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn bind(&self, endpoint: impl Into<String>, handler: Arc<dyn InboundHandler>) {
        let endpoint = endpoint.into();
        debug!(%endpoint, "Bound endpoint");
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(endpoint, handler);
    }

    pub fn unbind(&self, endpoint: &str) {
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(endpoint);
    }

    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints: Vec<String> = self
            .routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        endpoints.sort();
        endpoints
    }

    fn route(&self, endpoint: &str) -> Option<Arc<dyn InboundHandler>> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(endpoint)
            .cloned()
    }

    async fn round_trip(
        handler: Arc<dyn InboundHandler>,
        envelope: Envelope,
    ) -> Result<Reply, TransportError> {
        let wire = protocol::encode_envelope(&envelope)?;
        let envelope = protocol::decode_envelope(&wire)?;
        let reply = handler.deliver(envelope).await?;
        let wire = protocol::encode_reply(&reply)?;
        Ok(protocol::decode_reply(&wire)?)
    }
}

impl Default for LocalNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LocalNetwork {
    async fn send(&self, endpoint: &str, envelope: Envelope) -> Result<Reply, TransportError> {
        let handler = self
            .route(endpoint)
            .ok_or_else(|| TransportError::UnknownEndpoint(endpoint.to_string()))?;
        let kind = envelope.message.kind();
        debug!(endpoint, kind, sender = %envelope.sender, "Sending");

        let reply = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, Self::round_trip(handler, envelope))
                .await
                .map_err(|_| TransportError::Timeout(endpoint.to_string()))?,
            None => Self::round_trip(handler, envelope).await,
        };

        let reply = reply.and_then(accept);
        if let Err(e) = &reply {
            warn!(endpoint, kind, error = %e, "Request failed");
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identity, MatchId};
    use crate::protocol::{GameJoinAck, GameInvitation, Message};
    use chrono::Utc;

    struct Echo;

    #[async_trait]
    impl InboundHandler for Echo {
        async fn deliver(&self, envelope: Envelope) -> Result<Reply, TransportError> {
            match envelope.message {
                Message::GameInvitation(inv) => Ok(Reply::GameJoinAck(GameJoinAck {
                    match_id: inv.match_id,
                    accepted: true,
                })),
                _ => Ok(Reply::rejected("UNSUPPORTED", "echo only joins")),
            }
        }
    }

    struct Stuck;

    #[async_trait]
    impl InboundHandler for Stuck {
        async fn deliver(&self, _envelope: Envelope) -> Result<Reply, TransportError> {
            std::future::pending().await
        }
    }

    fn invitation() -> Envelope {
        Envelope::new(
            &Identity::manager(),
            None,
            Message::GameInvitation(GameInvitation {
                match_id: MatchId::new(1, 1),
                round_id: 1,
                opponent_id: crate::model::PlayerId(2),
                join_deadline: Utc::now(),
            }),
        )
    }

    #[tokio::test]
    async fn test_routes_to_bound_handler() {
        let network = LocalNetwork::new();
        network.bind("local://echo", Arc::new(Echo));

        let reply = network.send("local://echo", invitation()).await.unwrap();
        assert_eq!(reply.kind(), "GAME_JOIN_ACK");

        assert!(matches!(
            network.send("local://nobody", invitation()).await,
            Err(TransportError::UnknownEndpoint(_))
        ));

        network.unbind("local://echo");
        assert!(network.endpoints().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout() {
        let network = LocalNetwork::new().with_request_timeout(Duration::from_secs(1));
        network.bind("local://stuck", Arc::new(Stuck));
        assert_eq!(
            network.send("local://stuck", invitation()).await,
            Err(TransportError::Timeout("local://stuck".into()))
        );
    }
}
