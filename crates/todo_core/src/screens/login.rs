//! crates/todo_core/src/screens/login.rs
//!
//! Email/password sign-in form.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::ports::{Navigator, Route};
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMount {
    /// A session already existed; the navigator was sent to the main surface.
    Redirected,
    ShowForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    SignedIn,
    /// The provider rejected the attempt. Holds its message verbatim.
    Failed(String),
    /// Another submission from this form is still in flight. No request was sent.
    AlreadySubmitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginView {
    pub email: String,
    pub error: Option<String>,
    pub submitting: bool,
}

impl LoginView {
    pub fn button_label(&self) -> &'static str {
        if self.submitting {
            "Signing In..."
        } else {
            "Sign In"
        }
    }
}

#[derive(Default)]
struct LoginState {
    email: String,
    password: String,
    error: Option<String>,
}

pub struct LoginFlow {
    ctx: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<LoginState>,
    submitting: AtomicBool,
}

/// Clears the in-flight flag however the submission ends.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl LoginFlow {
    pub fn new(ctx: Arc<SessionContext>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            ctx,
            navigator,
            state: Mutex::new(LoginState::default()),
            submitting: AtomicBool::new(false),
        }
    }

    /// Skips the form when the provider already holds a session.
    pub async fn mount(&self) -> LoginMount {
        match self.ctx.auth().current_session().await {
            Ok(Some(session)) => {
                debug!(user_id = %session.user_id(), "Already signed in, skipping login.");
                self.ctx.set(Some(session)).await;
                self.navigator.replace(Route::Todos);
                LoginMount::Redirected
            }
            Ok(None) => LoginMount::ShowForm,
            Err(e) => {
                warn!("Session check on login mount failed: {}", e);
                LoginMount::ShowForm
            }
        }
    }

    pub async fn set_email(&self, email: impl Into<String>) {
        self.state.lock().await.email = email.into();
    }

    pub async fn set_password(&self, password: impl Into<String>) {
        self.state.lock().await.password = password.into();
    }

    pub async fn submit(&self) -> SubmitOutcome {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return SubmitOutcome::AlreadySubmitting;
        }
        let _guard = SubmitGuard(&self.submitting);

        let (email, password) = {
            let mut state = self.state.lock().await;
            state.error = None;
            (state.email.clone(), state.password.clone())
        };

        match self.ctx.auth().sign_in(&email, &password).await {
            Ok(session) => {
                info!(user_id = %session.user_id(), "Signed in.");
                self.state.lock().await.error = None;
                self.ctx.set(Some(session)).await;
                self.navigator.replace(Route::Todos);
                SubmitOutcome::SignedIn
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Sign-in failed: {}", message);
                self.state.lock().await.error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    pub async fn view(&self) -> LoginView {
        let state = self.state.lock().await;
        LoginView {
            email: state.email.clone(),
            error: state.error.clone(),
            submitting: self.submitting.load(Ordering::Acquire),
        }
    }
}
