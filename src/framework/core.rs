//! # Core Agent Runtime
//!
//! This module defines the generic building blocks every league agent is made of.
//!
//! ## Key Types
//!
//! - [`AgentBehavior`]: The trait that manager, referee and player state implement.
//! - [`AgentServer`]: The mailbox loop that owns the behavior and runs it sequentially.
//! - [`AgentClient`]: The cloneable handle used to call into an agent.
//! - [`FrameworkError`]: Common errors (e.g., AgentClosed, AgentDropped).

use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any agent state must implement to be driven by an [`AgentServer`].
///
/// # Architecture Note
/// The league has three kinds of agents (manager, referee, player). Each one owns
/// private state that must only ever be touched by one logical thread of control.
/// By describing an agent as "a state object plus a `handle` hook" we write the
/// mailbox loop *once* and every agent gets single-writer semantics for free.
///
/// # Async & Context
/// Hooks are `#[async_trait]` so a handler can suspend at network calls. The
/// `Context` associated type is injected into every hook at `run()` time ("late
/// binding"), which is how an agent receives its transport and a handle to its
/// own mailbox without a construction-time cycle.
#[async_trait]
pub trait AgentBehavior: Send + 'static {
    /// Requests accepted by this agent's mailbox.
    type Request: Send + Debug;

    /// Replies produced for `call` requests.
    type Reply: Send + Debug;

    /// The runtime context (dependencies) injected into the agent.
    type Context: Send + Sync;

    /// The error type for this agent.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called once before the first request is processed.
    async fn on_start(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle one request. Requests are processed strictly one at a time.
    async fn handle(
        &mut self,
        request: Self::Request,
        ctx: &Self::Context,
    ) -> Result<Self::Reply, Self::Error>;

    /// Called after the mailbox closes or a shutdown is requested.
    async fn on_stop(&mut self, _ctx: &Self::Context) {}
}

// =============================================================================
// 2. THE GENERIC MESSAGES & ERRORS
// =============================================================================

/// Errors that can occur within the agent runtime itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Agent closed")]
    AgentClosed,
    #[error("Agent dropped response channel")]
    AgentDropped,
    #[error("Agent error: {0}")]
    AgentError(Box<dyn std::error::Error + Send + Sync>),
}

/// Type alias for the one-shot response channel used by agents.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Envelope placed in an agent's mailbox.
///
/// - **Call**: request/response. The caller awaits the reply.
/// - **Cast**: fire-and-forget. Used for self-notifications (timer expiry, match progress).
/// - **Shutdown**: explicit stop, needed because agents hold handles to their own mailbox.
#[derive(Debug)]
pub enum Mailbox<T: AgentBehavior> {
    Call {
        request: T::Request,
        respond_to: Response<T::Reply>,
    },
    Cast {
        request: T::Request,
    },
    Shutdown,
}

// =============================================================================
// 3. THE GENERIC AGENT SERVER
// =============================================================================

/// The generic mailbox loop that drives one agent.
///
/// **Concurrency Model**:
/// Every agent processes its mailbox *sequentially*. The manager's registries,
/// schedule and standings therefore need no `Mutex`: exclusive ownership inside
/// the task is the lock. Separate agents still run in parallel.
pub struct AgentServer<T: AgentBehavior> {
    receiver: mpsc::Receiver<Mailbox<T>>,
    behavior: T,
}

impl<T: AgentBehavior> AgentServer<T> {
    /// Creates a new `AgentServer` and its associated `AgentClient`.
    ///
    /// `buffer_size` is the mailbox capacity; callers wait when it is full.
    pub fn new(behavior: T, buffer_size: usize) -> (Self, AgentClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let server = Self { receiver, behavior };
        (server, AgentClient::new(sender))
    }

    /// Runs the agent's event loop until every client is dropped or a shutdown arrives.
    pub async fn run(mut self, context: T::Context) {
        let agent_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");

        if let Err(e) = self.behavior.on_start(&context).await {
            warn!(agent_type, error = %e, "on_start failed");
            return;
        }
        info!(agent_type, "Agent started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                Mailbox::Call {
                    request,
                    respond_to,
                } => {
                    debug!(agent_type, ?request, "Call");
                    let result = self
                        .behavior
                        .handle(request, &context)
                        .await
                        .map_err(|e| FrameworkError::AgentError(Box::new(e)));
                    if let Err(e) = &result {
                        warn!(agent_type, error = %e, "Call failed");
                    }
                    let _ = respond_to.send(result);
                }
                Mailbox::Cast { request } => {
                    debug!(agent_type, ?request, "Cast");
                    if let Err(e) = self.behavior.handle(request, &context).await {
                        warn!(agent_type, error = %e, "Cast failed");
                    }
                }
                Mailbox::Shutdown => {
                    debug!(agent_type, "Shutdown requested");
                    break;
                }
            }
        }

        self.behavior.on_stop(&context).await;
        info!(agent_type, "Shutdown");
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

/// A type-safe handle for talking to an [`AgentServer`]. Cheap to clone.
pub struct AgentClient<T: AgentBehavior> {
    sender: mpsc::Sender<Mailbox<T>>,
}

impl<T: AgentBehavior> Clone for AgentClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: AgentBehavior> AgentClient<T> {
    pub fn new(sender: mpsc::Sender<Mailbox<T>>) -> Self {
        Self { sender }
    }

    pub async fn call(&self, request: T::Request) -> Result<T::Reply, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(Mailbox::Call {
                request,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::AgentClosed)?;
        response.await.map_err(|_| FrameworkError::AgentDropped)?
    }

    pub async fn cast(&self, request: T::Request) -> Result<(), FrameworkError> {
        self.sender
            .send(Mailbox::Cast { request })
            .await
            .map_err(|_| FrameworkError::AgentClosed)
    }

    pub async fn shutdown(&self) -> Result<(), FrameworkError> {
        self.sender
            .send(Mailbox::Shutdown)
            .await
            .map_err(|_| FrameworkError::AgentClosed)
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================
