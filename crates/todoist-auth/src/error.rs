//! Error types for the credential bridge

use crate::flow::FlowStep;

/// Errors from the authorize and callback steps.
///
/// None of the variants carry the client secret or an access token.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid authorization request: {0}")]
    InvalidRequest(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("missing authorization code")]
    MissingCode,

    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-2xx from the token endpoint. Surfaced to the caller verbatim.
    #[error("token exchange failed ({status}): {body}")]
    TokenExchange { status: u16, body: String },

    #[error("token response missing access_token")]
    MissingAccessToken,

    #[error("invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("failed to fetch user info: {0}")]
    IdentityFetch(String),

    #[error("authorization finalization failed: {0}")]
    Finalize(String),
}

impl Error {
    /// The login step this error terminates.
    pub fn step(&self) -> FlowStep {
        match self {
            Error::InvalidRequest(_) => FlowStep::ValidateRequest,
            Error::InvalidState(_) | Error::MissingCode => FlowStep::DecodeState,
            Error::Http(_)
            | Error::TokenExchange { .. }
            | Error::MissingAccessToken
            | Error::InvalidTokenResponse(_) => FlowStep::ExchangeCode,
            Error::IdentityFetch(_) => FlowStep::FetchIdentity,
            Error::Finalize(_) => FlowStep::Finalize,
        }
    }
}

/// Result alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_their_flow_step() {
        assert_eq!(
            Error::InvalidRequest("x".into()).step(),
            FlowStep::ValidateRequest
        );
        assert_eq!(Error::InvalidState("x".into()).step(), FlowStep::DecodeState);
        assert_eq!(Error::MissingCode.step(), FlowStep::DecodeState);
        assert_eq!(
            Error::TokenExchange {
                status: 400,
                body: "bad code".into()
            }
            .step(),
            FlowStep::ExchangeCode
        );
        assert_eq!(Error::IdentityFetch("x".into()).step(), FlowStep::FetchIdentity);
        assert_eq!(Error::Finalize("x".into()).step(), FlowStep::Finalize);
    }

    #[test]
    fn token_exchange_display_keeps_upstream_body() {
        let err = Error::TokenExchange {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.into(),
        };
        assert_eq!(
            err.to_string(),
            r#"token exchange failed (400): {"error":"invalid_grant"}"#
        );
    }
}
