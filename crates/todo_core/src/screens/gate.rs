//! crates/todo_core/src/screens/gate.rs
//!
//! The entry screen. Decides between the login flow and the todo surface and
//! keeps watching session changes for as long as it is mounted.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::Session;
use crate::ports::{Navigator, Route, Subscription};
use crate::session::SessionContext;

/// What the gate decided on mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView {
    /// No session: the navigator was sent to the login flow.
    RedirectedToLogin,
    /// A session is present: render the todo surface.
    Todos(Session),
}

pub struct SessionGate {
    ctx: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
    listener: Option<(CancellationToken, JoinHandle<()>)>,
}

impl SessionGate {
    pub fn new(ctx: Arc<SessionContext>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            ctx,
            navigator,
            listener: None,
        }
    }

    /// Registers the session listener, then checks for a session.
    ///
    /// A failed session query is treated exactly like having no session.
    pub async fn mount(&mut self) -> GateView {
        self.stop_listener();

        let subscription = self.ctx.auth().on_session_change();
        let token = CancellationToken::new();
        let handle = tokio::spawn(listen(
            subscription,
            self.ctx.clone(),
            self.navigator.clone(),
            token.clone(),
        ));
        self.listener = Some((token, handle));

        match self.ctx.refresh().await {
            Some(session) => GateView::Todos(session),
            None => {
                info!("No active session, redirecting to login.");
                self.navigator.replace(Route::Login);
                GateView::RedirectedToLogin
            }
        }
    }

    /// Deregisters the session listener and waits for it to stop.
    pub async fn unmount(&mut self) {
        if let Some((token, handle)) = self.listener.take() {
            token.cancel();
            let _ = handle.await;
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    fn stop_listener(&mut self) {
        if let Some((token, _)) = self.listener.take() {
            token.cancel();
        }
    }
}

impl Drop for SessionGate {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

async fn listen(
    mut subscription: Subscription,
    ctx: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
    token: CancellationToken,
) {
    loop {
        let change = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            change = subscription.recv() => change,
        };
        let Some(change) = change else {
            debug!("Session provider closed, listener stopping.");
            break;
        };

        ctx.apply(&change).await;
        if change.session.is_none() {
            info!(event = ?change.event, "Session ended, redirecting to login.");
            navigator.replace(Route::Login);
        }
    }
    subscription.unsubscribe();
}
