//! services/app/src/adapters/postgrest.rs
//!
//! This module contains the todo table adapter, the concrete implementation
//! of the `TodoStore` port from the `todo_core` crate. It talks to the hosted
//! PostgREST endpoint; row ownership is enforced there by row-level security.

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use todo_core::domain::{NewTodo, Todo, TodoFilter, TodoOrder, TodoPatch};
use todo_core::ports::{AuthService, PortError, PortResult, TodoStore};
use tracing::debug;
use uuid::Uuid;

use super::supabase::{decode_error, error_message, transport_error, SupabaseEndpoint};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A table adapter that implements the `TodoStore` port.
#[derive(Clone)]
pub struct SupabaseTodoAdapter {
    endpoint: SupabaseEndpoint,
    table: String,
    auth: Arc<dyn AuthService>,
}

impl SupabaseTodoAdapter {
    /// Creates a new `SupabaseTodoAdapter`. Requests carry the access token of
    /// whatever session `auth` holds at the time.
    pub fn new(endpoint: SupabaseEndpoint, table: impl Into<String>, auth: Arc<dyn AuthService>) -> Self {
        Self {
            endpoint,
            table: table.into(),
            auth,
        }
    }

    fn path(&self) -> String {
        format!("rest/v1/{}", self.table)
    }

    async fn request(&self, method: Method) -> PortResult<reqwest::RequestBuilder> {
        let session = self.auth.current_session().await?;
        let bearer = match &session {
            Some(session) => session.access_token.as_str(),
            None => self.endpoint.anon_key(),
        };
        Ok(self.endpoint.request(method, &self.path(), bearer))
    }
}

//=========================================================================================
// "Impure" Wire Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct TodoRecord {
    id: i64,
    task: String,
    is_completed: bool,
    user_id: Uuid,
}
impl TodoRecord {
    fn to_domain(self) -> Todo {
        Todo {
            id: self.id,
            task: self.task,
            is_completed: self.is_completed,
            user_id: self.user_id,
        }
    }
}

#[derive(Serialize)]
struct NewTodoRecord<'a> {
    task: &'a str,
    user_id: Uuid,
    is_completed: bool,
}

#[derive(Serialize)]
struct PatchRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_completed: Option<bool>,
}

fn filter_param(filter: TodoFilter) -> (&'static str, String) {
    match filter {
        TodoFilter::Owner(owner) => ("user_id", format!("eq.{}", owner)),
        TodoFilter::Id(id) => ("id", format!("eq.{}", id)),
    }
}

fn order_param(order: TodoOrder) -> &'static str {
    match order {
        TodoOrder::IdAscending => "id.asc",
        TodoOrder::IdDescending => "id.desc",
    }
}

/// Passes successful responses through and maps everything else to a `PortError`.
async fn check(response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let (_, message) = error_message(response).await;
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE => PortError::NotFound(message),
        _ => PortError::Rejected {
            status: status.as_u16(),
            message,
        },
    })
}

//=========================================================================================
// `TodoStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl TodoStore for SupabaseTodoAdapter {
    async fn select(&self, filter: TodoFilter, order: TodoOrder) -> PortResult<Vec<Todo>> {
        let (column, value) = filter_param(filter);
        let response = self
            .request(Method::GET)
            .await?
            .query(&[("select", "*"), (column, value.as_str()), ("order", order_param(order))])
            .send()
            .await
            .map_err(transport_error)?;

        let records: Vec<TodoRecord> = check(response).await?.json().await.map_err(decode_error)?;
        debug!(count = records.len(), "Fetched todo rows.");
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn insert(&self, todo: NewTodo) -> PortResult<Todo> {
        let body = [NewTodoRecord {
            task: &todo.task,
            user_id: todo.user_id,
            is_completed: todo.is_completed,
        }];
        let response = self
            .request(Method::POST)
            .await?
            .query(&[("select", "*")])
            .header("Prefer", "return=representation")
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let record: TodoRecord = check(response).await?.json().await.map_err(decode_error)?;
        Ok(record.to_domain())
    }

    async fn update(&self, filter: TodoFilter, patch: TodoPatch) -> PortResult<()> {
        let (column, value) = filter_param(filter);
        let body = PatchRecord {
            task: patch.task.as_deref(),
            is_completed: patch.is_completed,
        };
        let response = self
            .request(Method::PATCH)
            .await?
            .query(&[(column, value.as_str())])
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        check(response).await?;
        Ok(())
    }

    async fn delete(&self, filter: TodoFilter) -> PortResult<()> {
        let (column, value) = filter_param(filter);
        let response = self
            .request(Method::DELETE)
            .await?
            .query(&[(column, value.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        check(response).await?;
        Ok(())
    }
}
