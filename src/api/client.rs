//! Remote resource access.
//!
//! [`ResourceClient`] is the seam between navigation and the network. The
//! HTTP implementation is synchronous; background execution is layered on top
//! by the loader.

#![allow(missing_docs)]

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use super::model::{Resource, Task};
use crate::core::config::Config;
use crate::core::errors::{CtuError, Result};
use crate::navigator::level::HierarchyLevel;

/// Fetches collections and single tasks from the service.
pub trait ResourceClient: Send + Sync {
    /// Fetch the `level` collection belonging to `parent_id`.
    ///
    /// `parent_id` is `None` only for [`HierarchyLevel::Workspace`].
    fn fetch_children(&self, level: HierarchyLevel, parent_id: Option<&str>) -> Result<Vec<Resource>>;

    fn fetch_task(&self, task_id: &str) -> Result<Task>;
}

/// Endpoint path and response envelope field for a collection request.
pub fn collection_endpoint(
    level: HierarchyLevel,
    parent_id: Option<&str>,
) -> Result<(String, &'static str)> {
    let parent = || {
        parent_id.ok_or_else(|| CtuError::Runtime {
            details: format!("{level} collection requested without a parent id"),
        })
    };
    Ok(match level {
        HierarchyLevel::Workspace => ("/team".to_string(), "teams"),
        HierarchyLevel::Space => (format!("/team/{}/space", parent()?), "spaces"),
        HierarchyLevel::Folder => (format!("/space/{}/folder", parent()?), "folders"),
        HierarchyLevel::List => (format!("/folder/{}/list", parent()?), "lists"),
        HierarchyLevel::TaskCollection => (format!("/list/{}/task", parent()?), "tasks"),
    })
}

/// Blocking HTTP client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    http: Client,
    base_url: String,
}

impl HttpResourceClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(token).map_err(|_| CtuError::InvalidConfig {
            details: "api.token contains characters not allowed in a header".to_string(),
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!("clickup-tui/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| CtuError::Runtime {
                details: format!("failed to build HTTP client: {error}"),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build from a loaded configuration. Requires a token.
    pub fn from_config(config: &Config) -> Result<Self> {
        let token = config.require_token()?;
        Self::new(&config.api.base_url, token, config.request_timeout())
    }

    fn get_json(&self, endpoint: &str) -> Result<Value> {
        let url = format!("{}{endpoint}", self.base_url);
        tracing::debug!(%url, "GET");
        let response = self.http.get(&url).send()?;
        let status = response.status();
        let text = response.text()?;
        interpret_response(endpoint, status, &text)
    }
}

/// Map a status and raw body to the JSON payload or an error.
///
/// A service `err` wins over the status. A non-success status with a body
/// that is not JSON (proxy error pages) is reported by status, not as a
/// decode failure.
fn interpret_response(endpoint: &str, status: StatusCode, text: &str) -> Result<Value> {
    let api_error = |details: String| CtuError::Api {
        endpoint: endpoint.to_string(),
        details,
    };
    let body: Value = match serde_json::from_str(text) {
        Ok(body) => body,
        Err(_) if !status.is_success() => return Err(api_error(format!("HTTP {status}"))),
        Err(error) => return Err(CtuError::decode(endpoint, error.to_string())),
    };

    if let Some(message) = service_error(&body) {
        return Err(api_error(message));
    }
    if !status.is_success() {
        return Err(api_error(format!("HTTP {status}")));
    }
    Ok(body)
}

/// The service reports failures as `{"err": "...", "ECODE": "..."}`.
fn service_error(body: &Value) -> Option<String> {
    let err = body.get("err")?.as_str().filter(|msg| !msg.is_empty())?;
    Some(match body.get("ECODE").and_then(Value::as_str) {
        Some(code) => format!("{err} ({code})"),
        None => err.to_string(),
    })
}

impl ResourceClient for HttpResourceClient {
    fn fetch_children(&self, level: HierarchyLevel, parent_id: Option<&str>) -> Result<Vec<Resource>> {
        let (endpoint, field) = collection_endpoint(level, parent_id)?;
        let body = self.get_json(&endpoint)?;
        let items = body.get(field).ok_or_else(|| {
            CtuError::decode(endpoint.clone(), format!("response has no `{field}` field"))
        })?;
        Resource::collection_from_value(level, items)
    }

    fn fetch_task(&self, task_id: &str) -> Result<Task> {
        let endpoint = format!("/task/{task_id}");
        let body = self.get_json(&endpoint)?;
        serde_json::from_value(body).map_err(|error| CtuError::decode(endpoint, error))
    }
}
