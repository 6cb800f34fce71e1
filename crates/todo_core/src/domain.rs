//! crates/todo_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any backend or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// The authenticated identity as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
}

/// An authenticated session. Held in memory only, never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// The identifier todo rows are owned by.
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    /// True when the access token expires before `now + margin`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        self.expires_at.is_some_and(|at| at <= now + margin)
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A single task row as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub task: String,
    pub is_completed: bool,
    pub user_id: Uuid,
}

/// Insert payload for a new todo. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub task: String,
    pub user_id: Uuid,
    pub is_completed: bool,
}

/// Partial update for existing todo rows. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub task: Option<String>,
    pub is_completed: Option<bool>,
}

impl TodoPatch {
    pub fn completion(is_completed: bool) -> Self {
        Self {
            task: None,
            is_completed: Some(is_completed),
        }
    }
}

/// Row selection for store queries and mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoFilter {
    Owner(Uuid),
    Id(i64),
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        match self {
            TodoFilter::Owner(owner) => todo.user_id == *owner,
            TodoFilter::Id(id) => todo.id == *id,
        }
    }
}

/// Row order for `TodoStore::select`. The todo surface always lists newest
/// first; ascending order is part of the store's query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoOrder {
    IdAscending,
    IdDescending,
}

/// Kinds of session transitions the auth provider reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// One session transition: the event and the session after it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl SessionChange {
    pub fn signed_in(session: Session) -> Self {
        Self {
            event: AuthEvent::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            event: AuthEvent::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            event: AuthEvent::TokenRefreshed,
            session: Some(session),
        }
    }
}
