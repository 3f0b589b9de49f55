//! Inbound OAuth authorization requests
//!
//! The external client's request is parsed from the standard RFC 6749 query
//! parameters. Missing parameters become empty values; deciding whether a
//! request is acceptable is the bridge's job, not the parser's.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An external client's authorization request.
///
/// Serialized as camelCase JSON when carried through the upstream redirect
/// inside `state`; see [`crate::state`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    #[serde(default)]
    pub response_type: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default)]
    pub scope: Vec<String>,
    /// The client's own `state`, echoed back on its redirect
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
}

impl AuthRequest {
    pub fn has_client_id(&self) -> bool {
        !self.client_id.trim().is_empty()
    }
}

/// Build an `AuthRequest` from `/authorize` query parameters.
///
/// `scope` is split on whitespace; empty optional parameters are dropped.
pub fn parse_auth_request(query: &HashMap<String, String>) -> AuthRequest {
    let field = |name: &str| query.get(name).cloned().unwrap_or_default();
    let optional = |name: &str| query.get(name).filter(|v| !v.is_empty()).cloned();

    AuthRequest {
        response_type: field("response_type"),
        client_id: field("client_id"),
        redirect_uri: field("redirect_uri"),
        scope: query
            .get("scope")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
        state: field("state"),
        code_challenge: optional("code_challenge"),
        code_challenge_method: optional("code_challenge_method"),
    }
}
