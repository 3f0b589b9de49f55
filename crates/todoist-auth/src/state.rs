//! `state` encoding for the upstream redirect round trip
//!
//! The whole `AuthRequest` is carried through Todoist's redirect as the OAuth
//! `state` value: JSON, then base64url without padding. Decoding restores
//! the exact request, so nothing has to be kept server-side between
//! `/authorize` and `/callback`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{Error, Result};
use crate::request::AuthRequest;

/// Encode a request into a URL-safe `state` token.
pub fn encode_state(request: &AuthRequest) -> Result<String> {
    let json = serde_json::to_vec(request)
        .map_err(|e| Error::InvalidRequest(format!("serializing request: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a `state` token back into the original request.
///
/// Fails with `InvalidState` when the token is not base64url, not JSON, or
/// does not name a client.
pub fn decode_state(state: &str) -> Result<AuthRequest> {
    let bytes = URL_SAFE_NO_PAD
        .decode(state.trim())
        .map_err(|e| Error::InvalidState(format!("not base64url: {e}")))?;
    let request: AuthRequest = serde_json::from_slice(&bytes)
        .map_err(|e| Error::InvalidState(format!("not an authorization request: {e}")))?;
    if !request.has_client_id() {
        return Err(Error::InvalidState("missing clientId".into()));
    }
    Ok(request)
}
