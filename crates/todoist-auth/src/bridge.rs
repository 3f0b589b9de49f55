//! Authorize and Callback, the two halves of the credential bridge
//!
//! `authorize` turns an inbound client request into a Todoist authorize URL
//! with the request itself packed into `state`. `callback` unpacks it,
//! exchanges the code, fetches the identity and hands the resulting
//! `SessionProps` to an `AuthorizationFinalizer`, which decides where the
//! client is redirected next.
//!
//! Each callback step depends on the previous one; the first failure ends
//! the attempt and nothing is retried.

use std::future::Future;
use std::pin::Pin;

use common::Secret;
use serde::Deserialize;
use todoist_client::TodoistClient;
use tracing::{info, instrument, warn};
use url::Url;

use crate::constants::CALLBACK_PATH;
use crate::error::{Error, Result};
use crate::flow::{FlowEvent, FlowState, advance};
use crate::request::AuthRequest;
use crate::session::{SessionProps, fetch_identity};
use crate::state::{decode_state, encode_state};
use crate::token::exchange_code;

/// Everything the surrounding OAuth provider needs to issue its own grant.
#[derive(Debug, Clone)]
pub struct CompleteAuthorization {
    /// The original inbound request, exactly as received on `/authorize`
    pub request: AuthRequest,
    /// Stable user key (the Todoist email)
    pub user_id: String,
    /// Display label for the grant (the Todoist full name)
    pub label: String,
    pub scope: Vec<String>,
    pub props: SessionProps,
}

/// Boxed future returned by `AuthorizationFinalizer`.
pub type FinalizeFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// The OAuth-provider collaborator that completes the external client's own
/// authorization.
///
/// Resolves to the URI the browser should be redirected to. Failures should
/// be reported as `Error::Finalize`.
pub trait AuthorizationFinalizer: Send + Sync {
    fn complete_authorization(&self, grant: CompleteAuthorization) -> FinalizeFuture<'_>;
}

/// Static bridge settings, resolved from gateway configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base_url: String,
    pub scope: String,
    /// Externally reachable origin of this gateway, without trailing slash
    pub public_url: String,
    /// Client redirect URIs a grant may be delivered to, compared exactly
    pub allowed_redirect_uris: Vec<String>,
}

impl BridgeConfig {
    /// Redirect URI registered with Todoist.
    ///
    /// Used for both the authorize redirect and the token exchange; OAuth
    /// requires the two to match byte for byte.
    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.public_url.trim_end_matches('/'), CALLBACK_PATH)
    }

    /// Whether `redirect_uri` is a registered http(s) client redirect.
    pub fn allows_redirect(&self, redirect_uri: &str) -> bool {
        let is_http = Url::parse(redirect_uri)
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https"));
        is_http
            && self
                .allowed_redirect_uris
                .iter()
                .any(|allowed| allowed == redirect_uri)
    }
}

/// Query string Todoist sends back to `/callback`.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Stateless credential bridge. Cheap to clone, safe to share.
#[derive(Clone)]
pub struct CredentialBridge {
    http: reqwest::Client,
    config: BridgeConfig,
}

impl CredentialBridge {
    pub fn new(http: reqwest::Client, config: BridgeConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Build the Todoist authorize URL for an inbound request.
    ///
    /// Fails with `InvalidRequest` when the request names no client or its
    /// `redirect_uri` is not registered. Nothing is stored: the request
    /// rides along in `state`.
    #[instrument(skip_all, fields(client_id = %request.client_id))]
    pub fn authorize(&self, request: &AuthRequest) -> Result<Url> {
        let flow = FlowState::Start;
        let rejection = if !request.has_client_id() {
            Some("missing client_id")
        } else if !self.config.allows_redirect(&request.redirect_uri) {
            Some("redirect_uri is not registered")
        } else {
            None
        };
        if let Some(reason) = rejection {
            let err = Error::InvalidRequest(reason.into());
            let (flow, _) = advance(flow, FlowEvent::StepFailed(err.step()));
            warn!(?flow, redirect_uri = %request.redirect_uri, reason, "authorization request rejected");
            return Err(err);
        }
        let (flow, _) = advance(flow, FlowEvent::RequestAccepted);

        let state = encode_state(request)?;
        let redirect_uri = self.config.redirect_uri();
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
                ("state", state.as_str()),
                ("response_type", "code"),
            ],
        )
        .map_err(|e| Error::InvalidRequest(format!("authorize_url: {e}")))?;

        let (flow, _) = advance(flow, FlowEvent::RedirectIssued);
        info!(?flow, "redirecting to Todoist for authorization");
        Ok(url)
    }

    /// Complete a login from Todoist's redirect.
    ///
    /// Steps, in order: decode `state`, exchange `code`, fetch the identity,
    /// finalize. Returns the URI to redirect the browser to.
    #[instrument(skip_all)]
    pub async fn callback(
        &self,
        params: &CallbackParams,
        finalizer: &dyn AuthorizationFinalizer,
    ) -> Result<String> {
        match self.run_callback(params, finalizer).await {
            Ok(redirect_to) => {
                let (flow, _) = advance(FlowState::AwaitingCallback, FlowEvent::Finalized);
                info!(?flow, "authorization completed");
                Ok(redirect_to)
            }
            Err(err) => {
                let (flow, _) = advance(
                    FlowState::AwaitingCallback,
                    FlowEvent::StepFailed(err.step()),
                );
                warn!(?flow, error = %err, "authorization callback failed");
                Err(err)
            }
        }
    }

    async fn run_callback(
        &self,
        params: &CallbackParams,
        finalizer: &dyn AuthorizationFinalizer,
    ) -> Result<String> {
        // 1. Recover the original request; no network call happens before this passes
        let request = decode_state(params.state.as_deref().unwrap_or_default())?;
        // state is not signed, so the redirect is checked again
        if !self.config.allows_redirect(&request.redirect_uri) {
            return Err(Error::InvalidState("redirect_uri is not registered".into()));
        }
        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(Error::MissingCode)?;

        // 2. Exchange the single-use code
        let token = exchange_code(
            &self.http,
            &self.config.token_url,
            &self.config.client_id,
            &self.config.client_secret,
            code,
            &self.config.redirect_uri(),
        )
        .await?;

        // 3. Identity becomes the durable user key; no identity, no session
        let api = TodoistClient::new(
            self.http.clone(),
            self.config.api_base_url.clone(),
            token.access_token.clone(),
        );
        let identity = fetch_identity(&api).await?;
        info!(client_id = %request.client_id, user = %identity.email, "identity fetched");

        // 4. Let the OAuth provider issue the client's grant
        let scope = request.scope.clone();
        let grant = CompleteAuthorization {
            user_id: identity.email.clone(),
            label: identity.full_name.clone(),
            scope,
            props: SessionProps::from_exchange(identity, token),
            request,
        };
        finalizer.complete_authorization(grant).await
    }
}
