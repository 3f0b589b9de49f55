//! Bearer-authenticated Todoist client
//!
//! `TodoistApi` is the seam the tool dispatcher and the credential bridge
//! program against. `TodoistClient` is the reqwest-backed implementation;
//! tests substitute their own.

use std::future::Future;
use std::pin::Pin;

use common::Secret;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::query::truthy_pairs;

/// Todoist unified API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.todoist.com/api/v1";

/// Boxed future returned by `TodoistApi` methods.
pub type ApiFuture<'a> = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;

/// The three primitive Todoist calls.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`&dyn TodoistApi` is handed to every tool handler).
///
/// Every method resolves to `Value::Null` for `204 No Content`, the parsed
/// JSON body for other 2xx replies, and `Error::Api` for everything else.
pub trait TodoistApi: Send + Sync {
    /// GET `path`, serializing only the truthy entries of `params`.
    fn get<'a>(&'a self, path: &'a str, params: &'a Map<String, Value>) -> ApiFuture<'a>;

    /// POST `path` with `body` serialized as JSON.
    fn post<'a>(&'a self, path: &'a str, body: &'a Value) -> ApiFuture<'a>;

    /// DELETE `path`.
    fn delete<'a>(&'a self, path: &'a str) -> ApiFuture<'a>;
}

/// Todoist client bound to a single access token.
#[derive(Clone)]
pub struct TodoistClient {
    http: reqwest::Client,
    base_url: String,
    token: Secret<String>,
}

impl TodoistClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: Secret<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token,
        }
    }

    /// Full URL for `path`, with the truthy query pairs appended.
    ///
    /// No `?` is emitted when every parameter was dropped.
    pub fn url_for(&self, path: &str, params: &Map<String, Value>) -> Result<Url> {
        let raw = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut url = Url::parse(&raw).map_err(|e| Error::Url(format!("{raw}: {e}")))?;

        let pairs = truthy_pairs(params);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(self.token.expose())
            .header(ACCEPT, "application/json")
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url().to_string()))?;
        handle_response(response).await
    }
}

impl TodoistApi for TodoistClient {
    fn get<'a>(&'a self, path: &'a str, params: &'a Map<String, Value>) -> ApiFuture<'a> {
        Box::pin(async move {
            let url = self.url_for(path, params)?;
            debug!(method = "GET", path, query = url.query().unwrap_or(""), "todoist request");
            self.send(self.request(reqwest::Method::GET, url)).await
        })
    }

    fn post<'a>(&'a self, path: &'a str, body: &'a Value) -> ApiFuture<'a> {
        Box::pin(async move {
            let url = self.url_for(path, &Map::new())?;
            let payload = serde_json::to_vec(body)
                .map_err(|e| Error::Decode(format!("serializing request body: {e}")))?;
            debug!(method = "POST", path, bytes = payload.len(), "todoist request");
            let builder = self
                .request(reqwest::Method::POST, url)
                .header(CONTENT_TYPE, "application/json")
                .body(payload);
            self.send(builder).await
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> ApiFuture<'a> {
        Box::pin(async move {
            let url = self.url_for(path, &Map::new())?;
            debug!(method = "DELETE", path, "todoist request");
            self.send(self.request(reqwest::Method::DELETE, url)).await
        })
    }
}

/// Normalize a Todoist response.
///
/// The error body is read as text, not JSON, so HTML error pages from
/// intermediaries survive intact.
async fn handle_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }

    let text = response
        .text()
        .await
        .map_err(|e| Error::Http(format!("reading response body: {}", e.without_url())))?;
    serde_json::from_str(&text).map_err(|e| Error::Decode(e.to_string()))
}
