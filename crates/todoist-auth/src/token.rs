//! Authorization-code exchange against the Todoist token endpoint
//!
//! A single form POST carrying the gateway's client id and secret, the
//! one-time code, and the same `redirect_uri` sent on the authorize
//! redirect. Codes are single-use, so a failed exchange is never retried.

use common::Secret;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Access token obtained at callback time. Never mutated, never persisted.
#[derive(Debug, Clone)]
pub struct UpstreamToken {
    pub access_token: Secret<String>,
}

/// Body of a successful token endpoint reply.
///
/// Todoist returns `{"access_token": "...", "token_type": "Bearer"}`.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Exchange an authorization code for an access token.
///
/// A non-2xx reply is returned as `Error::TokenExchange` with the upstream
/// status and body untouched, so the caller can relay it as-is.
pub async fn exchange_code(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &Secret<String>,
    code: &str,
    redirect_uri: &str,
) -> Result<UpstreamToken> {
    let response = client
        .post(token_url)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret.expose().as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {}", e.without_url())))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenExchange {
            status: status.as_u16(),
            body,
        });
    }

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::InvalidTokenResponse(e.without_url().to_string()))?;

    match token.access_token {
        Some(access_token) if !access_token.is_empty() => {
            debug!("token exchange succeeded");
            Ok(UpstreamToken {
                access_token: Secret::new(access_token),
            })
        }
        _ => Err(Error::MissingAccessToken),
    }
}
