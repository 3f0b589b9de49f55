//! `/tools` and `/tools/call` handlers

use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::Value;
use todoist_auth::SessionProps;
use todoist_tools::{DispatchError, ToolResult};
use tracing::{info, warn};

use crate::AppState;
use crate::error::Error;
use crate::metrics;
use crate::session::SessionStore;

/// Body of `POST /tools/call`.
#[derive(Debug, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub(crate) async fn authenticate(sessions: &SessionStore, headers: &HeaderMap) -> Result<SessionProps, Error> {
    let token = bearer_token(headers).ok_or(Error::Unauthorized)?;
    sessions.get(token).await.ok_or(Error::Unauthorized)
}

/// GET /tools: the catalogue, as `{tools: [ToolSpec...]}`.
pub async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({ "tools": state.dispatcher.specs() }))
}

/// POST /tools/call: run one tool under the caller's session.
///
/// The session is checked before the body is parsed.
pub async fn call_tool(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ToolResult>, Error> {
    let request_id = new_request_id();
    let session = authenticate(&state.sessions, &headers)
        .await
        .inspect_err(|_| warn!(request_id = %request_id, "tool call without a valid session"))?;

    let call: ToolCall =
        serde_json::from_slice(&body).map_err(|e| Error::BadBody(e.to_string()))?;

    Ok(Json(run_call(&state, call, &session, &request_id).await?))
}

pub(crate) fn new_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().as_simple())
}

/// Dispatch one call, recording its outcome and duration.
///
/// Shared by `/tools/call` and the MCP endpoint.
pub(crate) async fn run_call(
    state: &AppState,
    call: ToolCall,
    session: &SessionProps,
    request_id: &str,
) -> Result<ToolResult, DispatchError> {
    // Unregistered names share one label
    let tool_label = match state.dispatcher.registry().spec(&call.name) {
        Some(spec) => spec.name.clone(),
        None => "unknown".to_string(),
    };

    let started = Instant::now();
    let result = state
        .dispatcher
        .dispatch(&call.name, call.arguments, session)
        .await;
    let elapsed = started.elapsed().as_secs_f64();

    let outcome = match &result {
        Ok(r) if r.is_error() => "tool_error",
        Ok(_) => "success",
        Err(DispatchError::UnknownTool(_)) => "unknown_tool",
        Err(DispatchError::InvalidArguments { .. }) => "invalid_arguments",
    };
    metrics::record_tool_call(&tool_label, outcome, elapsed);
    info!(
        request_id = %request_id,
        tool = %call.name,
        user = %session.email(),
        outcome,
        elapsed_ms = (elapsed * 1000.0) as u64,
        "tool call"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc-123"));
        assert_eq!(bearer_token(&headers), Some("abc-123"));
    }

    #[test]
    fn arguments_default_to_null() {
        let call: ToolCall = serde_json::from_str(r#"{"name": "get_projects"}"#).unwrap();
        assert_eq!(call.name, "get_projects");
        assert!(call.arguments.is_null());
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let store = SessionStore::default();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(matches!(
            authenticate(&store, &headers).await,
            Err(Error::Unauthorized)
        ));
    }
}
