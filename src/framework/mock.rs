//! # Mock Framework
//!
//! Utilities for testing agents in isolation.
//!
//! A referee's orchestration talks to two players and the manager. Instead of
//! spawning all three, tests hand it a [`MockTransport`] scripted with the replies
//! each peer should give:
//!
//! ```rust,ignore
//! let mock = Arc::new(MockTransport::new());
//! mock.expect_send("local://player-1")
//!     .of_type("GAME_INVITATION")
//!     .return_reply(join_ack(match_id));
//! mock.expect_send("local://player-2")
//!     .of_type("CHOOSE_PARITY_CALL")
//!     .never_reply(); // simulate a player that went silent
//!
//! // ... run the code under test with `mock.clone()` as its transport ...
//!
//! mock.verify(); // Ensures all expectations were met
//! ```
//!
//! Expectations are matched per endpoint in the order they were added, so the
//! concurrent fan-out to two players does not depend on which request lands first.

use crate::protocol::{Envelope, Reply};
use crate::transport::{accept, Transport, TransportError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

enum Response {
    Reply(Result<Reply, TransportError>),
    Hang,
}

/// One scripted round trip.
struct Expectation {
    endpoint: String,
    kind: Option<&'static str>,
    delay: Option<Duration>,
    response: Response,
}

impl Expectation {
    fn matches(&self, endpoint: &str, envelope: &Envelope) -> bool {
        self.endpoint == endpoint && self.kind.map_or(true, |k| k == envelope.message.kind())
    }
}

/// A transport that answers from a script and records everything sent through it.
#[derive(Default)]
pub struct MockTransport {
    expectations: Arc<Mutex<Vec<Expectation>>>,
    sent: Arc<Mutex<Vec<(String, Envelope)>>>,
}

impl MockTransport {
    /// Creates a mock transport with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects one request to `endpoint`.
    pub fn expect_send(&self, endpoint: impl Into<String>) -> SendExpectationBuilder {
        SendExpectationBuilder {
            endpoint: endpoint.into(),
            kind: None,
            delay: None,
            expectations: self.expectations.clone(),
        }
    }

    /// Every request seen so far, in arrival order.
    pub fn sent(&self) -> Vec<(String, Envelope)> {
        self.sent.lock().unwrap().clone()
    }

    /// Requests of a given message type.
    pub fn sent_of_type(&self, kind: &str) -> Vec<(String, Envelope)> {
        self.sent()
            .into_iter()
            .filter(|(_, envelope)| envelope.message.kind() == kind)
            .collect()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            let pending: Vec<String> = exps
                .iter()
                .map(|e| format!("{} {}", e.endpoint, e.kind.unwrap_or("*")))
                .collect();
            panic!("Not all expectations were met. Remaining: {pending:?}");
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, endpoint: &str, envelope: Envelope) -> Result<Reply, TransportError> {
        let expectation = {
            let mut exps = self.expectations.lock().unwrap();
            let position = exps.iter().position(|e| e.matches(endpoint, &envelope));
            position.map(|i| exps.remove(i))
        };
        let kind = envelope.message.kind();
        self.sent.lock().unwrap().push((endpoint.to_string(), envelope));

        let Some(expectation) = expectation else {
            return Err(TransportError::Unreachable(format!(
                "unexpected {kind} to {endpoint}"
            )));
        };
        if let Some(delay) = expectation.delay {
            tokio::time::sleep(delay).await;
        }
        match expectation.response {
            Response::Reply(result) => result.and_then(accept),
            Response::Hang => std::future::pending().await,
        }
    }
}

/// Builder for `send` expectations.
pub struct SendExpectationBuilder {
    endpoint: String,
    kind: Option<&'static str>,
    delay: Option<Duration>,
    expectations: Arc<Mutex<Vec<Expectation>>>,
}

impl SendExpectationBuilder {
    /// Only match requests carrying this message type.
    pub fn of_type(mut self, kind: &'static str) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Wait this long before answering.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the expectation to return a reply.
    pub fn return_reply(self, reply: Reply) {
        self.push(Response::Reply(Ok(reply)));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: TransportError) {
        self.push(Response::Reply(Err(error)));
    }

    /// Accept the request and never answer it.
    pub fn never_reply(self) {
        self.push(Response::Hang);
    }

    fn push(self, response: Response) {
        self.expectations.lock().unwrap().push(Expectation {
            endpoint: self.endpoint,
            kind: self.kind,
            delay: self.delay,
            response,
        });
    }
}
