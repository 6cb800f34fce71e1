//! crates/todo_core/src/session.rs
//!
//! The session context passed explicitly to every screen controller.
//!
//! Lifecycle: created at app start with [`SessionContext::start`], kept current
//! from provider events by the session gate, torn down on logout.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::{Session, SessionChange};
use crate::ports::AuthService;

pub struct SessionContext {
    auth: Arc<dyn AuthService>,
    current: RwLock<Option<Session>>,
}

impl SessionContext {
    /// Creates an empty context. Use [`SessionContext::start`] to also load the session.
    pub fn new(auth: Arc<dyn AuthService>) -> Arc<Self> {
        Arc::new(Self {
            auth,
            current: RwLock::new(None),
        })
    }

    /// Creates the context and loads whatever session the provider already holds.
    pub async fn start(auth: Arc<dyn AuthService>) -> Arc<Self> {
        let ctx = Self::new(auth);
        ctx.refresh().await;
        ctx
    }

    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.auth
    }

    /// Re-queries the provider. A failed query counts as no session.
    pub async fn refresh(&self) -> Option<Session> {
        let session = match self.auth.current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Session query failed, treating as signed out: {}", e);
                None
            }
        };
        self.set(session.clone()).await;
        session
    }

    pub async fn apply(&self, change: &SessionChange) {
        debug!(event = ?change.event, "Applying session change.");
        self.set(change.session.clone()).await;
    }

    pub async fn set(&self, session: Option<Session>) {
        *self.current.write().await = session;
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn teardown(&self) {
        self.set(None).await;
    }
}
