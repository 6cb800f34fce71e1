//! In-memory stand-ins for the ports, shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use todo_core::{
    AuthService, Navigator, NewTodo, PortError, PortResult, Route, Session, SessionBroadcaster,
    SessionChange, Subscription, Todo, TodoFilter, TodoOrder, TodoPatch, TodoStore, User,
};
use uuid::Uuid;

pub fn session_for(email: &str) -> Session {
    Session {
        user: User {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        },
        access_token: format!("token-{email}"),
        refresh_token: None,
        expires_at: None,
    }
}

/// Polls `check` until it holds, failing the test after a second.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

//=========================================================================================
// Auth
//=========================================================================================

#[derive(Default)]
pub struct FakeAuth {
    pub session: Mutex<Option<Session>>,
    accounts: Mutex<HashMap<String, (String, Session)>>,
    pub broadcaster: SessionBroadcaster,
    pub fail_session_query: AtomicBool,
    pub fail_sign_out: AtomicBool,
    pub sign_in_calls: AtomicUsize,
    sign_in_hold: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeAuth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers an account and returns the session a sign-in will yield.
    pub fn with_account(&self, email: &str, password: &str) -> Session {
        let session = session_for(email);
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), session.clone()));
        session
    }

    pub fn signed_in_as(&self, email: &str) -> Session {
        let session = session_for(email);
        *self.session.lock().unwrap() = Some(session.clone());
        session
    }

    pub fn hold_sign_in(&self, gate: Arc<Semaphore>) {
        *self.sign_in_hold.lock().unwrap() = Some(gate);
    }

    /// Simulates a provider-side transition, e.g. token invalidation.
    pub fn emit(&self, change: SessionChange) {
        *self.session.lock().unwrap() = change.session.clone();
        self.broadcaster.publish(change);
    }
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn current_session(&self) -> PortResult<Option<Session>> {
        if self.fail_session_query.load(Ordering::SeqCst) {
            return Err(PortError::Transport("offline".to_string()));
        }
        Ok(self.session.lock().unwrap().clone())
    }

    async fn current_user(&self) -> PortResult<Option<User>> {
        Ok(self.session.lock().unwrap().as_ref().map(|s| s.user.clone()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<Session> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let hold = self.sign_in_hold.lock().unwrap().clone();
        if let Some(gate) = hold {
            gate.acquire().await.unwrap().forget();
        }
        let found = self.accounts.lock().unwrap().get(email).cloned();
        match found {
            Some((expected, session)) if expected == password => {
                *self.session.lock().unwrap() = Some(session.clone());
                self.broadcaster.publish(SessionChange::signed_in(session.clone()));
                Ok(session)
            }
            _ => Err(PortError::Auth("Invalid login credentials".to_string())),
        }
    }

    async fn sign_out(&self) -> PortResult<()> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(PortError::Auth("Network request failed".to_string()));
        }
        *self.session.lock().unwrap() = None;
        self.broadcaster.publish(SessionChange::signed_out());
        Ok(())
    }

    fn on_session_change(&self) -> Subscription {
        self.broadcaster.subscribe()
    }
}

//=========================================================================================
// Store
//=========================================================================================

pub struct FakeStore {
    pub rows: Mutex<Vec<Todo>>,
    next_id: AtomicI64,
    pub fail: AtomicBool,
    pub selects: AtomicUsize,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    hold: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            fail: AtomicBool::new(false),
            selects: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            hold: Mutex::new(None),
        })
    }

    pub fn seed(&self, owner: Uuid, task: &str, is_completed: bool) -> Todo {
        let todo = Todo {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            task: task.to_string(),
            is_completed,
            user_id: owner,
        };
        self.rows.lock().unwrap().push(todo.clone());
        todo
    }

    pub fn failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Makes every later request wait for a permit on `gate`.
    pub fn hold(&self, gate: Arc<Semaphore>) {
        *self.hold.lock().unwrap() = Some(gate);
    }

    pub fn row(&self, id: i64) -> Option<Todo> {
        self.rows.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }

    async fn enter(&self) -> PortResult<()> {
        let hold = self.hold.lock().unwrap().clone();
        if let Some(gate) = hold {
            gate.acquire().await.unwrap().forget();
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Rejected {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TodoStore for FakeStore {
    async fn select(&self, filter: TodoFilter, order: TodoOrder) -> PortResult<Vec<Todo>> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        let mut rows: Vec<Todo> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.id);
        if order == TodoOrder::IdDescending {
            rows.reverse();
        }
        Ok(rows)
    }

    async fn insert(&self, todo: NewTodo) -> PortResult<Todo> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        let row = Todo {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            task: todo.task,
            is_completed: todo.is_completed,
            user_id: todo.user_id,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(&self, filter: TodoFilter, patch: TodoPatch) -> PortResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        for row in self.rows.lock().unwrap().iter_mut().filter(|t| filter.matches(t)) {
            if let Some(task) = &patch.task {
                row.task = task.clone();
            }
            if let Some(done) = patch.is_completed {
                row.is_completed = done;
            }
        }
        Ok(())
    }

    async fn delete(&self, filter: TodoFilter) -> PortResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        self.rows.lock().unwrap().retain(|t| !filter.matches(t));
        Ok(())
    }
}

//=========================================================================================
// Navigation
//=========================================================================================

#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn history(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn replace(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}
