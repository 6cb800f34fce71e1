//! services/app/src/adapters/supabase.rs
//!
//! Connection details and error mapping shared by the Supabase adapters.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use todo_core::ports::PortError;

use crate::config::Config;

/// Where the hosted project lives and how to reach it.
#[derive(Clone, Debug)]
pub struct SupabaseEndpoint {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseEndpoint {
    pub fn new(http: Client, base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            anon_key: anon_key.into(),
        }
    }

    /// Builds the endpoint and its HTTP client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self::new(
            http,
            config.supabase_url.clone(),
            config.supabase_anon_key.clone(),
        ))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Starts a request carrying the project key and the given bearer token.
    pub fn request(&self, method: reqwest::Method, path: &str, bearer: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }
}

//=========================================================================================
// Error Bodies
//=========================================================================================

/// The union of the error shapes the auth and REST services return.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
    }
}

/// Reads the message out of a failed response, falling back to the status text.
pub async fn error_message(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    (status, message)
}

pub fn transport_error(e: reqwest::Error) -> PortError {
    PortError::Transport(e.to_string())
}

pub fn decode_error(e: reqwest::Error) -> PortError {
    PortError::Unexpected(format!("malformed response body: {}", e))
}
