//! Shared fixtures for tests that run the adapters against a mock backend.
#![allow(dead_code)]

use app_lib::adapters::SupabaseEndpoint;
use async_trait::async_trait;
use serde_json::{json, Value};
use todo_core::domain::{Session, User};
use todo_core::ports::{AuthService, PortResult, SessionBroadcaster, Subscription};
use uuid::Uuid;
use wiremock::MockServer;

pub const ANON_KEY: &str = "anon-key";

pub fn user_id() -> Uuid {
    Uuid::parse_str("6f1d2c3b-4a5e-4f60-8a7b-9c0d1e2f3a4b").unwrap()
}

pub fn endpoint(server: &MockServer) -> SupabaseEndpoint {
    SupabaseEndpoint::new(reqwest::Client::new(), server.uri(), ANON_KEY)
}

pub fn user_json() -> Value {
    json!({ "id": user_id(), "email": "ada@example.com", "aud": "authenticated" })
}

pub fn token_json(access_token: &str, refresh_token: &str, expires_in: i64) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": expires_in,
        "refresh_token": refresh_token,
        "user": user_json(),
    })
}

pub fn todo_json(id: i64, task: &str, is_completed: bool) -> Value {
    json!({
        "id": id,
        "task": task,
        "is_completed": is_completed,
        "user_id": user_id(),
        "inserted_at": "2024-01-01T00:00:00Z",
    })
}

/// An auth provider that always reports the same session.
pub struct StaticAuth {
    pub session: Option<Session>,
    broadcaster: SessionBroadcaster,
}

impl StaticAuth {
    pub fn signed_in(access_token: &str) -> Self {
        Self {
            session: Some(Session {
                user: User {
                    id: user_id(),
                    email: Some("ada@example.com".to_string()),
                },
                access_token: access_token.to_string(),
                refresh_token: None,
                expires_at: None,
            }),
            broadcaster: SessionBroadcaster::new(),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            session: None,
            broadcaster: SessionBroadcaster::new(),
        }
    }
}

#[async_trait]
impl AuthService for StaticAuth {
    async fn current_session(&self) -> PortResult<Option<Session>> {
        Ok(self.session.clone())
    }

    async fn current_user(&self) -> PortResult<Option<User>> {
        Ok(self.session.as_ref().map(|s| s.user.clone()))
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> PortResult<Session> {
        unimplemented!("not used by store tests")
    }

    async fn sign_out(&self) -> PortResult<()> {
        Ok(())
    }

    fn on_session_change(&self) -> Subscription {
        self.broadcaster.subscribe()
    }
}
