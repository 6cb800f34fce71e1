//! crates/todo_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the hosted auth provider, the hosted table store and
//! whatever front end moves the user between screens.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::{NewTodo, Session, SessionChange, Todo, TodoFilter, TodoOrder, TodoPatch, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, JSON).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// A message from the auth provider meant for the user, shown verbatim.
    #[error("{0}")]
    Auth(String),
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Session Change Subscriptions
//=========================================================================================

const SESSION_CHANNEL_CAPACITY: usize = 16;

/// Fan-out of session transitions to every live [`Subscription`].
///
/// Auth adapters own one of these and publish after each transition.
#[derive(Debug, Clone)]
pub struct SessionBroadcaster {
    tx: broadcast::Sender<SessionChange>,
}

impl SessionBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SESSION_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Delivers `change` to current subscribers. Having none is not an error.
    pub fn publish(&self, change: SessionChange) {
        let _ = self.tx.send(change);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered session-change listener. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<SessionChange>,
}

impl Subscription {
    /// Waits for the next transition. `None` once the provider is gone.
    pub async fn recv(&mut self) -> Option<SessionChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session listener lagged behind provider events.");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    /// The session currently held by the provider, if any.
    async fn current_session(&self) -> PortResult<Option<Session>>;

    /// The user behind the current session, as confirmed by the provider.
    async fn current_user(&self) -> PortResult<Option<User>>;

    /// Exchanges an email and password for a session.
    async fn sign_in(&self, email: &str, password: &str) -> PortResult<Session>;

    async fn sign_out(&self) -> PortResult<()>;

    /// Registers a listener for every later session transition.
    fn on_session_change(&self) -> Subscription;
}

/// Row-oriented access to the owner-scoped todo collection.
///
/// Owner isolation is enforced by the store itself and is not re-checked here.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn select(&self, filter: TodoFilter, order: TodoOrder) -> PortResult<Vec<Todo>>;

    /// Inserts a row and returns it as stored, with its assigned id.
    async fn insert(&self, todo: NewTodo) -> PortResult<Todo>;

    async fn update(&self, filter: TodoFilter, patch: TodoPatch) -> PortResult<()>;

    async fn delete(&self, filter: TodoFilter) -> PortResult<()>;
}

//=========================================================================================
// Navigation
//=========================================================================================

/// The screens a front end can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    /// The main surface: the signed-in user's todo list.
    Todos,
    Profile,
}

/// Replaces the current screen. Implemented by the front end.
pub trait Navigator: Send + Sync {
    fn replace(&self, route: Route);
}
