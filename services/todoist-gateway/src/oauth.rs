//! `/authorize` and `/callback` handlers
//!
//! Thin HTTP shells around `CredentialBridge`: parse the query, run the
//! bridge step, answer with a 302 or the mapped error.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::{IntoResponse, Response};
use todoist_auth::{CallbackParams, parse_auth_request};

use crate::AppState;
use crate::error::Error;
use crate::metrics;

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

/// GET /authorize: redirect the browser to Todoist's consent page.
pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, Error> {
    let request = parse_auth_request(&query);
    match state.bridge.authorize(&request) {
        Ok(url) => {
            metrics::record_authorization("redirected");
            Ok(found(url.into()))
        }
        Err(err) => {
            metrics::record_authorization("invalid_request");
            Err(err.into())
        }
    }
}

/// GET /callback: finish the Todoist login and send the browser back to the
/// client with a gateway session.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, Error> {
    match state.bridge.callback(&params, &state.issuer).await {
        Ok(redirect_to) => {
            metrics::record_callback("completed");
            Ok(found(redirect_to))
        }
        Err(err) => {
            metrics::record_callback(err.step().as_str());
            Err(err.into())
        }
    }
}
