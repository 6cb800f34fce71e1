//! crates/todo_core/src/screens/todos.rs
//!
//! The main surface: the signed-in user's todo list.
//!
//! Local state only changes after the store confirms a mutation. Responses
//! that arrive after the surface was unmounted (or remounted) are dropped.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::domain::{NewTodo, Todo, TodoFilter, TodoOrder, TodoPatch, User};
use crate::ports::{PortError, TodoStore};
use crate::session::SessionContext;

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("Task text must not be empty")]
    EmptyTask,
    #[error("Could not resolve the current user: {0}")]
    Session(PortError),
    #[error("Todo store error: {0}")]
    Store(#[from] PortError),
}

/// Whether an action changed local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    /// Nothing was changed locally: no signed-in user, a duplicate in-flight
    /// action, or a response that outlived its mount.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoView {
    pub todos: Vec<Todo>,
    pub input: String,
    pub loading: bool,
}

struct TodoState {
    todos: Vec<Todo>,
    input: String,
    loading: bool,
    in_flight: HashSet<i64>,
    adding: bool,
}

impl Default for TodoState {
    fn default() -> Self {
        Self {
            todos: Vec::new(),
            input: String::new(),
            loading: true,
            in_flight: HashSet::new(),
            adding: false,
        }
    }
}

pub struct TodoSurface {
    ctx: Arc<SessionContext>,
    store: Arc<dyn TodoStore>,
    state: Mutex<TodoState>,
    epoch: AtomicU64,
}

impl TodoSurface {
    pub fn new(ctx: Arc<SessionContext>, store: Arc<dyn TodoStore>) -> Self {
        Self {
            ctx,
            store,
            state: Mutex::new(TodoState::default()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Loads the current user's todos, newest first.
    ///
    /// With no signed-in user this does nothing; the session gate handles the
    /// redirect. A failed fetch leaves the list empty and is not retried.
    pub async fn mount(&self) -> Result<(), TodoError> {
        let epoch = self.reset().await;

        let result = self.load(epoch).await;

        let mut state = self.state.lock().await;
        if self.is_current(epoch) {
            state.loading = false;
        }
        result
    }

    async fn load(&self, epoch: u64) -> Result<(), TodoError> {
        let Some(user) = self.current_user().await? else {
            debug!("No signed-in user, skipping todo load.");
            return Ok(());
        };

        let rows = self
            .store
            .select(TodoFilter::Owner(user.id), TodoOrder::IdDescending)
            .await
            .map_err(|e| {
                error!("Error fetching todos: {}", e);
                TodoError::Store(e)
            })?;

        let mut state = self.state.lock().await;
        if self.is_current(epoch) {
            info!(count = rows.len(), "Loaded todos.");
            state.todos = rows;
        }
        Ok(())
    }

    /// Drops local state; responses still in flight will not be applied.
    pub async fn unmount(&self) {
        self.reset().await;
    }

    /// Clears local state and starts a new epoch. Epochs are only bumped or
    /// read while the state lock is held.
    async fn reset(&self) -> u64 {
        let mut state = self.state.lock().await;
        *state = TodoState::default();
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        self.state.lock().await.input = text.into();
    }

    /// Creates a todo from the input buffer and puts it at the head of the list.
    pub async fn add(&self) -> Result<Mutation, TodoError> {
        let (epoch, task) = {
            let mut state = self.state.lock().await;
            let epoch = self.epoch.load(Ordering::Acquire);
            let task = state.input.trim().to_string();
            if task.is_empty() {
                return Err(TodoError::EmptyTask);
            }
            if state.adding {
                return Ok(Mutation::Ignored);
            }
            state.adding = true;
            (epoch, task)
        };

        let result = self.insert(task).await;

        let mut state = self.state.lock().await;
        if !self.is_current(epoch) {
            return result.map(|_| Mutation::Ignored);
        }
        state.adding = false;
        match result? {
            Some(row) => {
                debug!(id = row.id, "Todo created.");
                state.todos.insert(0, row);
                state.input.clear();
                Ok(Mutation::Applied)
            }
            None => Ok(Mutation::Ignored),
        }
    }

    async fn insert(&self, task: String) -> Result<Option<Todo>, TodoError> {
        let Some(user) = self.current_user().await? else {
            return Ok(None);
        };
        let new_todo = NewTodo {
            task,
            user_id: user.id,
            is_completed: false,
        };
        self.store.insert(new_todo).await.map(Some).map_err(|e| {
            error!("Error adding todo: {}", e);
            TodoError::Store(e)
        })
    }

    /// Flips a todo's completion flag from `is_completed`.
    pub async fn toggle(&self, id: i64, is_completed: bool) -> Result<Mutation, TodoError> {
        let Some(epoch) = self.begin_mutation(id).await else {
            return Ok(Mutation::Ignored);
        };

        let result = self
            .store
            .update(TodoFilter::Id(id), TodoPatch::completion(!is_completed))
            .await;

        let mut state = self.state.lock().await;
        if !self.is_current(epoch) {
            return result.map(|_| Mutation::Ignored).map_err(TodoError::Store);
        }
        state.in_flight.remove(&id);
        if let Err(e) = result {
            error!(id, "Error updating todo: {}", e);
            return Err(TodoError::Store(e));
        }
        for todo in state.todos.iter_mut().filter(|todo| todo.id == id) {
            todo.is_completed = !is_completed;
        }
        Ok(Mutation::Applied)
    }

    pub async fn delete(&self, id: i64) -> Result<Mutation, TodoError> {
        let Some(epoch) = self.begin_mutation(id).await else {
            return Ok(Mutation::Ignored);
        };

        let result = self.store.delete(TodoFilter::Id(id)).await;

        let mut state = self.state.lock().await;
        if !self.is_current(epoch) {
            return result.map(|_| Mutation::Ignored).map_err(TodoError::Store);
        }
        state.in_flight.remove(&id);
        if let Err(e) = result {
            error!(id, "Error deleting todo: {}", e);
            return Err(TodoError::Store(e));
        }
        state.todos.retain(|todo| todo.id != id);
        Ok(Mutation::Applied)
    }

    pub async fn view(&self) -> TodoView {
        let state = self.state.lock().await;
        TodoView {
            todos: state.todos.clone(),
            input: state.input.clone(),
            loading: state.loading,
        }
    }

    /// Marks `id` as busy. `None` when a mutation for it is already in flight.
    async fn begin_mutation(&self, id: i64) -> Option<u64> {
        let mut state = self.state.lock().await;
        let epoch = self.epoch.load(Ordering::Acquire);
        if !state.in_flight.insert(id) {
            debug!(id, "Mutation already in flight, ignoring.");
            return None;
        }
        Some(epoch)
    }

    async fn current_user(&self) -> Result<Option<User>, TodoError> {
        self.ctx.auth().current_user().await.map_err(|e| {
            error!("Error resolving current user: {}", e);
            TodoError::Session(e)
        })
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) == epoch
    }
}
