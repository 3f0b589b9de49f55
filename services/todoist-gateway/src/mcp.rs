//! MCP endpoint
//!
//! Streamable HTTP in its stateless JSON-response form: each `POST /mcp`
//! carries one JSON-RPC message and gets one JSON reply. Notifications are
//! acknowledged with 202 and no body. Every message must carry a gateway
//! session bearer; there is no `Mcp-Session-Id`.
//!
//! Supported methods: `initialize`, `ping`, `tools/list`, `tools/call`.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use rmcp::model::{
    CallToolResult, Content, ErrorCode, ErrorData, Implementation, ServerCapabilities,
    ServerInfo, Tool,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use todoist_auth::SessionProps;
use todoist_tools::{Content as ToolContent, DispatchError, Dispatcher, ToolResult};
use tracing::{debug, warn};

use crate::AppState;
use crate::error::Error;
use crate::tools::{ToolCall, authenticate, new_request_id, run_call};

/// Name reported in the `initialize` result.
pub const SERVER_NAME: &str = "todoist-gateway";

const JSONRPC_VERSION: &str = "2.0";

const INSTRUCTIONS: &str = "Todoist projects, sections and tasks of the signed-in user. \
                            Tool failures come back as results with isError set.";

#[derive(Debug, Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorData>,
}

impl RpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, error: ErrorData) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// POST /mcp
pub async fn handle_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, Error> {
    let request_id = new_request_id();
    let session = authenticate(&state.sessions, &headers)
        .await
        .inspect_err(|_| warn!(request_id = %request_id, "MCP message without a valid session"))?;

    let message: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return Ok(reply(RpcResponse::error(
                Value::Null,
                ErrorData::parse_error(format!("invalid JSON: {e}"), None),
            )));
        }
    };
    if message.is_array() {
        return Ok(reply(RpcResponse::error(
            Value::Null,
            ErrorData::invalid_request("batch requests are not supported", None),
        )));
    }

    // No id: a notification, nothing to answer
    let Some(id) = message.get("id").cloned() else {
        debug!(
            request_id = %request_id,
            method = message.get("method").and_then(serde_json::Value::as_str).unwrap_or_default(),
            "notification acknowledged"
        );
        return Ok(StatusCode::ACCEPTED.into_response());
    };

    let request: RpcRequest = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            return Ok(reply(RpcResponse::error(
                id,
                ErrorData::invalid_request(format!("invalid JSON-RPC request: {e}"), None),
            )));
        }
    };
    if request.jsonrpc != JSONRPC_VERSION {
        return Ok(reply(RpcResponse::error(
            id,
            ErrorData::invalid_request("jsonrpc must be \"2.0\"", None),
        )));
    }

    let response = match handle_request(&state, request, &session, &request_id).await {
        Ok(result) => RpcResponse::result(id, result),
        Err(error) => RpcResponse::error(id, error),
    };
    Ok(reply(response))
}

fn reply(response: RpcResponse) -> Response {
    Json(response).into_response()
}

async fn handle_request(
    state: &AppState,
    request: RpcRequest,
    session: &SessionProps,
    request_id: &str,
) -> Result<Value, ErrorData> {
    match request.method.as_str() {
        "initialize" => to_result(&server_info()),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tool_list(&state.dispatcher) })),
        "tools/call" => {
            let call: ToolCall = serde_json::from_value(request.params).map_err(|e| {
                ErrorData::invalid_params(format!("invalid tools/call params: {e}"), None)
            })?;
            let result = run_call(state, call, session, request_id)
                .await
                .map_err(dispatch_error)?;
            to_result(&call_tool_result(result))
        }
        other => Err(ErrorData::new(
            ErrorCode::METHOD_NOT_FOUND,
            format!("method not found: {other}"),
            None,
        )),
    }
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, ErrorData> {
    serde_json::to_value(value).map_err(|e| ErrorData::internal_error(e.to_string(), None))
}

fn server_info() -> ServerInfo {
    ServerInfo {
        capabilities: ServerCapabilities::builder().enable_tools().build(),
        server_info: Implementation {
            name: SERVER_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            ..Implementation::from_build_env()
        },
        instructions: Some(INSTRUCTIONS.into()),
        ..Default::default()
    }
}

fn tool_list(dispatcher: &Dispatcher) -> Vec<Tool> {
    dispatcher
        .specs()
        .into_iter()
        .map(|spec| {
            let schema = match spec.input_schema {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            Tool::new(spec.name, spec.description, Arc::new(schema))
        })
        .collect()
}

fn call_tool_result(result: ToolResult) -> CallToolResult {
    let failed = result.is_error();
    let content = result
        .content
        .into_iter()
        .map(|ToolContent::Text { text }| Content::text(text))
        .collect();
    if failed {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

/// Unknown tools and schema violations are protocol errors; everything
/// past validation is a tool result.
fn dispatch_error(err: DispatchError) -> ErrorData {
    match err {
        DispatchError::UnknownTool(name) => {
            ErrorData::invalid_params(format!("unknown tool: {name}"), None)
        }
        DispatchError::InvalidArguments { tool, violations } => ErrorData::invalid_params(
            format!("invalid arguments for {tool}"),
            Some(json!({ "violations": violations })),
        ),
    }
}
