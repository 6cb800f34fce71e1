//! services/app/src/adapters/gotrue.rs
//!
//! This module contains the adapter for the hosted auth service (GoTrue).
//! It implements the `AuthService` port from the `todo_core` crate and is the only
//! holder of the session: in memory, for the lifetime of the process.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use todo_core::domain::{Session, SessionChange, User};
use todo_core::ports::{AuthService, PortError, PortResult, SessionBroadcaster, Subscription};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::supabase::{decode_error, error_message, transport_error, SupabaseEndpoint};

/// Sessions this close to expiry are refreshed before being handed out.
const REFRESH_MARGIN_SECS: i64 = 30;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `AuthService` port using the GoTrue REST API.
pub struct SupabaseAuthAdapter {
    endpoint: SupabaseEndpoint,
    session: RwLock<Option<Session>>,
    refresh_lock: Mutex<()>,
    broadcaster: SessionBroadcaster,
}

impl SupabaseAuthAdapter {
    /// Creates a new `SupabaseAuthAdapter` with no session.
    pub fn new(endpoint: SupabaseEndpoint) -> Self {
        Self {
            endpoint,
            session: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            broadcaster: SessionBroadcaster::new(),
        }
    }

    async fn store(&self, change: SessionChange) {
        *self.session.write().await = change.session.clone();
        self.broadcaster.publish(change);
    }

    /// Exchanges the refresh token for a new session.
    ///
    /// A rejected refresh means the session is gone: it is cleared and
    /// `SignedOut` is published.
    async fn refresh(&self, stale: &Session) -> PortResult<Option<Session>> {
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited.
        let current = self.session.read().await.clone();
        match current {
            None => return Ok(None),
            Some(current) if current.access_token != stale.access_token => {
                return Ok(Some(current));
            }
            Some(_) => {}
        }

        let Some(refresh_token) = stale.refresh_token.as_deref() else {
            info!("Session expired without a refresh token.");
            self.store(SessionChange::signed_out()).await;
            return Ok(None);
        };

        debug!("Refreshing session.");
        let response = self
            .endpoint
            .request(Method::POST, "auth/v1/token", self.endpoint.anon_key())
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_client_error() {
            let (status, message) = error_message(response).await;
            warn!(%status, "Session refresh rejected: {}", message);
            self.store(SessionChange::signed_out()).await;
            return Ok(None);
        }
        if !response.status().is_success() {
            let (status, message) = error_message(response).await;
            return Err(PortError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let record: TokenRecord = response.json().await.map_err(decode_error)?;
        let session = record.to_domain(Utc::now());
        self.store(SessionChange::token_refreshed(session.clone())).await;
        Ok(Some(session))
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: Uuid,
    email: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email.filter(|email| !email.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenRecord {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: UserRecord,
}
impl TokenRecord {
    fn to_domain(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|at| DateTime::<Utc>::from_timestamp(at, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        Session {
            user: self.user.to_domain(),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for SupabaseAuthAdapter {
    async fn current_session(&self) -> PortResult<Option<Session>> {
        let Some(session) = self.session.read().await.clone() else {
            return Ok(None);
        };
        if session.expires_within(Utc::now(), Duration::seconds(REFRESH_MARGIN_SECS)) {
            return self.refresh(&session).await;
        }
        Ok(Some(session))
    }

    async fn current_user(&self) -> PortResult<Option<User>> {
        let Some(session) = self.current_session().await? else {
            return Ok(None);
        };

        let response = self
            .endpoint
            .request(Method::GET, "auth/v1/user", &session.access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => {
                let record: UserRecord = response.json().await.map_err(decode_error)?;
                Ok(Some(record.to_domain()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                info!("Access token rejected, ending session.");
                self.store(SessionChange::signed_out()).await;
                Ok(None)
            }
            _ => {
                let (status, message) = error_message(response).await;
                Err(PortError::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<Session> {
        let response = self
            .endpoint
            .request(Method::POST, "auth/v1/token", self.endpoint.anon_key())
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let (_, message) = error_message(response).await;
            return Err(PortError::Auth(message));
        }

        let record: TokenRecord = response.json().await.map_err(decode_error)?;
        let session = record.to_domain(Utc::now());
        self.store(SessionChange::signed_in(session.clone())).await;
        Ok(session)
    }

    async fn sign_out(&self) -> PortResult<()> {
        let session = self.session.read().await.clone();
        if let Some(session) = session {
            let response = self
                .endpoint
                .request(Method::POST, "auth/v1/logout", &session.access_token)
                .send()
                .await
                .map_err(transport_error)?;

            let status = response.status();
            // An already invalid token still means we are signed out.
            let gone = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND);
            if !status.is_success() && !gone {
                let (_, message) = error_message(response).await;
                return Err(PortError::Auth(message));
            }
        }
        self.store(SessionChange::signed_out()).await;
        Ok(())
    }

    fn on_session_change(&self) -> Subscription {
        self.broadcaster.subscribe()
    }
}
