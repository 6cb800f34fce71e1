//! crates/todo_core/src/screens/profile.rs
//!
//! Shows who is signed in and offers logout.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::User;
use crate::ports::PortResult;
use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileView {
    Loading,
    NotLoggedIn,
    User {
        id: String,
        email: Option<String>,
        error: Option<String>,
    },
}

struct ProfileState {
    loading: bool,
    user: Option<User>,
    error: Option<String>,
}

pub struct ProfileSurface {
    ctx: Arc<SessionContext>,
    state: Mutex<ProfileState>,
}

impl ProfileSurface {
    pub fn new(ctx: Arc<SessionContext>) -> Self {
        Self {
            ctx,
            state: Mutex::new(ProfileState {
                loading: true,
                user: None,
                error: None,
            }),
        }
    }

    /// Fetches the current user. A failed fetch shows as "not logged in".
    pub async fn mount(&self) {
        let user = match self.ctx.auth().current_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!("Could not load profile user: {}", e);
                None
            }
        };
        let mut state = self.state.lock().await;
        state.user = user;
        state.error = None;
        state.loading = false;
    }

    /// Signs out. On failure the provider's message is shown and the user kept.
    pub async fn logout(&self) -> PortResult<()> {
        self.state.lock().await.error = None;

        match self.ctx.auth().sign_out().await {
            Ok(()) => {
                info!("Signed out.");
                self.state.lock().await.user = None;
                self.ctx.teardown().await;
                Ok(())
            }
            Err(e) => {
                warn!("Sign-out failed: {}", e);
                self.state.lock().await.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn view(&self) -> ProfileView {
        let state = self.state.lock().await;
        if state.loading {
            return ProfileView::Loading;
        }
        match &state.user {
            None => ProfileView::NotLoggedIn,
            Some(user) => ProfileView::User {
                id: user.id.to_string(),
                email: user.email.clone(),
                error: state.error.clone(),
            },
        }
    }
}
