//! HTTP error responses
//!
//! Bridge and dispatcher errors are turned into responses here and nowhere
//! else. Bodies never contain the client secret or an access token.

use axum::http::{HeaderValue, StatusCode};
use axum::http::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use axum::response::{IntoResponse, Response};
use todoist_auth::Error as AuthError;
use todoist_tools::DispatchError;

/// Errors surfaced by the gateway's own handlers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("missing or unknown session token")]
    Unauthorized,

    #[error("invalid request body: {0}")]
    BadBody(String),
}

impl Error {
    /// Status and body text for a bridge failure.
    ///
    /// A rejected token exchange is relayed as Todoist sent it.
    fn auth_response(err: &AuthError) -> (StatusCode, String) {
        match err {
            AuthError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "Invalid request".into()),
            AuthError::InvalidState(_) => (StatusCode::BAD_REQUEST, "Invalid state".into()),
            AuthError::MissingCode => (StatusCode::BAD_REQUEST, "Missing code".into()),
            AuthError::MissingAccessToken => {
                (StatusCode::BAD_REQUEST, "Missing access token".into())
            }
            AuthError::TokenExchange { status, body } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                body.clone(),
            ),
            AuthError::Http(_) | AuthError::InvalidTokenResponse(_) => {
                (StatusCode::BAD_GATEWAY, "Token exchange failed".into())
            }
            AuthError::IdentityFetch(_) | AuthError::Finalize(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch user info".into(),
            ),
        }
    }
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    (status, [(CONTENT_TYPE, "application/json")], body.to_string()).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Auth(err) => Error::auth_response(&err).into_response(),
            Error::Dispatch(DispatchError::UnknownTool(name)) => json_response(
                StatusCode::NOT_FOUND,
                serde_json::json!({
                    "error": "unknown_tool",
                    "message": format!("unknown tool: {name}"),
                }),
            ),
            Error::Dispatch(DispatchError::InvalidArguments { tool, violations }) => {
                json_response(
                    StatusCode::BAD_REQUEST,
                    serde_json::json!({
                        "error": "invalid_arguments",
                        "message": format!("invalid arguments for {tool}"),
                        "violations": violations,
                    }),
                )
            }
            Error::Unauthorized => {
                let mut response = json_response(
                    StatusCode::UNAUTHORIZED,
                    serde_json::json!({
                        "error": "unauthorized",
                        "message": "missing or unknown session token",
                    }),
                );
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            Error::BadBody(message) => json_response(
                StatusCode::BAD_REQUEST,
                serde_json::json!({"error": "invalid_request", "message": message}),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn bridge_errors_map_to_fixed_texts() {
        let cases = [
            (AuthError::InvalidRequest("x".into()), 400, "Invalid request"),
            (AuthError::InvalidState("x".into()), 400, "Invalid state"),
            (AuthError::MissingCode, 400, "Missing code"),
            (AuthError::MissingAccessToken, 400, "Missing access token"),
            (AuthError::IdentityFetch("x".into()), 500, "Failed to fetch user info"),
            (AuthError::Finalize("x".into()), 500, "Failed to fetch user info"),
            (AuthError::Http("refused".into()), 502, "Token exchange failed"),
        ];

        for (err, status, text) in cases {
            let response = Error::from(err).into_response();
            assert_eq!(response.status().as_u16(), status);
            assert_eq!(body_text(response).await, text);
        }
    }

    #[tokio::test]
    async fn token_exchange_failure_is_relayed_verbatim() {
        let response = Error::from(AuthError::TokenExchange {
            status: 401,
            body: r#"{"error":"invalid_grant"}"#.into(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(response).await, r#"{"error":"invalid_grant"}"#);
    }

    #[tokio::test]
    async fn invalid_arguments_list_violations() {
        let response = Error::from(DispatchError::InvalidArguments {
            tool: "create_project".into(),
            violations: vec!["color: not allowed".into()],
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"], "invalid_arguments");
        assert_eq!(json["violations"], serde_json::json!(["color: not allowed"]));
    }

    #[test]
    fn unauthorized_challenges_for_bearer() {
        let response = Error::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn unknown_tool_is_not_found() {
        let response =
            Error::from(DispatchError::UnknownTool("nope".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
