//! Identity and Session Props
//!
//! `SessionProps` is the unit of trust handed to every tool invocation. It
//! can only be built from a completed token exchange plus identity fetch, so
//! a half-populated session cannot exist.

use common::Secret;
use serde::Deserialize;
use serde_json::Map;
use todoist_client::TodoistApi;

use crate::constants::USER_PATH;
use crate::error::{Error, Result};
use crate::token::UpstreamToken;

/// Subset of Todoist's `GET /user` reply the gateway keys sessions on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub full_name: String,
    pub email: String,
}

/// Per-session identity and credential bundle.
///
/// Immutable. `Debug` redacts the access token.
#[derive(Debug, Clone)]
pub struct SessionProps {
    display_name: String,
    email: String,
    access_token: Secret<String>,
}

impl SessionProps {
    pub(crate) fn from_exchange(identity: Identity, token: UpstreamToken) -> Self {
        Self {
            display_name: identity.full_name,
            email: identity.email,
            access_token: token.access_token,
        }
    }

    /// Build props directly, for downstream test suites only.
    #[cfg(any(test, feature = "test-util"))]
    pub fn for_tests(display_name: &str, email: &str, access_token: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            email: email.to_string(),
            access_token: Secret::from(access_token),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Stable user key.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn access_token(&self) -> &Secret<String> {
        &self.access_token
    }
}

/// Fetch the current user's identity with a freshly issued token.
///
/// Both `full_name` and `email` must be present; anything else fails with
/// `IdentityFetch`.
pub async fn fetch_identity(api: &dyn TodoistApi) -> Result<Identity> {
    let body = api
        .get(USER_PATH, &Map::new())
        .await
        .map_err(|e| Error::IdentityFetch(e.to_string()))?;
    serde_json::from_value(body)
        .map_err(|e| Error::IdentityFetch(format!("unexpected user payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use todoist_client::ApiFuture;

    /// Canned `/user` responder.
    struct FixedUser(std::result::Result<Value, u16>);

    impl TodoistApi for FixedUser {
        fn get<'a>(&'a self, path: &'a str, _params: &'a Map<String, Value>) -> ApiFuture<'a> {
            assert_eq!(path, USER_PATH);
            let reply = match &self.0 {
                Ok(value) => Ok(value.clone()),
                Err(status) => Err(todoist_client::Error::Api {
                    status: *status,
                    body: "nope".into(),
                }),
            };
            Box::pin(async move { reply })
        }

        fn post<'a>(&'a self, _path: &'a str, _body: &'a Value) -> ApiFuture<'a> {
            unreachable!("identity fetch never posts")
        }

        fn delete<'a>(&'a self, _path: &'a str) -> ApiFuture<'a> {
            unreachable!("identity fetch never deletes")
        }
    }

    #[tokio::test]
    async fn fetches_name_and_email() {
        let api = FixedUser(Ok(json!({
            "id": "2671355",
            "email": "a@b.com",
            "full_name": "A B",
            "tz_info": {"timezone": "Europe/Lisbon"},
        })));
        let identity = fetch_identity(&api).await.unwrap();
        assert_eq!(identity.email, "a@b.com");
        assert_eq!(identity.full_name, "A B");
    }

    #[tokio::test]
    async fn partial_identity_is_rejected() {
        let api = FixedUser(Ok(json!({"email": "a@b.com"})));
        let err = fetch_identity(&api).await.unwrap_err();
        assert!(matches!(err, Error::IdentityFetch(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn upstream_failure_is_identity_fetch_error() {
        let api = FixedUser(Err(401));
        let err = fetch_identity(&api).await.unwrap_err();
        assert!(matches!(err, Error::IdentityFetch(_)), "got {err:?}");
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn props_combine_identity_and_token() {
        let props = SessionProps::from_exchange(
            Identity {
                full_name: "A B".into(),
                email: "a@b.com".into(),
            },
            UpstreamToken {
                access_token: Secret::from("tok123"),
            },
        );
        assert_eq!(props.display_name(), "A B");
        assert_eq!(props.email(), "a@b.com");
        assert_eq!(props.access_token().expose(), "tok123");
        assert!(!format!("{props:?}").contains("tok123"));
    }
}
