use crate::model::{AuthToken, Identity};
use crate::protocol::{Envelope, Message, Reply};
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for typed clients that speak to a peer over the [`Transport`].
///
/// Implementors provide the transport and the sender credentials; the default
/// [`request`](Self::request) wraps a message in an [`Envelope`] and performs the
/// round trip.
#[async_trait]
pub trait WireClient: Send + Sync {
    /// The client-specific error type.
    type Error: From<TransportError> + Send;

    fn transport(&self) -> &Arc<dyn Transport>;

    /// Sender identity stamped on every envelope.
    fn identity(&self) -> &Identity;

    fn auth_token(&self) -> Option<&AuthToken> {
        None
    }

    #[tracing::instrument(skip(self, message), fields(kind = message.kind()))]
    async fn request(&self, endpoint: &str, message: Message) -> Result<Reply, Self::Error> {
        tracing::debug!("Sending request");
        let envelope = Envelope::new(self.identity(), self.auth_token().cloned(), message);
        self.transport()
            .send(endpoint, envelope)
            .await
            .map_err(Into::into)
    }
}
