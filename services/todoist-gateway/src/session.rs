//! Session issuance
//!
//! After a successful callback the gateway mints an opaque session token,
//! keeps the `SessionProps` under the token's SHA-256, and sends the browser
//! back to the client with the token as `code`. Agents then present the
//! token as a bearer on `/tools/call`.
//!
//! Sessions live in memory only and are lost on restart. Each one expires a
//! fixed time after issuance, and the store refuses new sessions once full.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};
use todoist_auth::{AuthorizationFinalizer, CompleteAuthorization, FinalizeFuture, SessionProps};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Entropy of a session token, before encoding.
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Generate a random URL-safe session token.
pub fn mint_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Store key for a token. Raw tokens are never kept.
fn token_key(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

/// Default session lifetime: 24 hours
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default maximum number of live sessions
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// How often expired sessions are swept.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub ttl: Duration,
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SESSION_TTL,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

/// The store is at `max_sessions` even after dropping expired entries.
#[derive(Debug, thiserror::Error)]
#[error("session store full ({max} sessions)")]
pub struct StoreFull {
    pub max: usize,
}

struct StoredSession {
    props: SessionProps,
    expires_at: Instant,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
    limits: SessionLimits,
}

impl SessionStore {
    pub fn with_limits(limits: SessionLimits) -> Self {
        Self {
            sessions: Arc::default(),
            limits,
        }
    }

    pub async fn insert(&self, token: &str, props: SessionProps) -> Result<(), StoreFull> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.limits.max_sessions {
            sessions.retain(|_, session| session.expires_at > now);
        }
        if sessions.len() >= self.limits.max_sessions {
            warn!(
                max = self.limits.max_sessions,
                "session limit reached, rejecting new session"
            );
            return Err(StoreFull {
                max: self.limits.max_sessions,
            });
        }
        sessions.insert(
            token_key(token),
            StoredSession {
                props,
                expires_at: now + self.limits.ttl,
            },
        );
        Ok(())
    }

    /// Props for a live session. Expired sessions are treated as unknown.
    pub async fn get(&self, token: &str) -> Option<SessionProps> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&token_key(token))?;
        if session.expires_at <= Instant::now() {
            debug!("session expired on access");
            return None;
        }
        Some(session.props.clone())
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "expired sessions removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Sweep expired sessions every `SWEEP_INTERVAL` until the task is dropped.
pub async fn sweep_expired(store: SessionStore) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        store.remove_expired().await;
    }
}

/// `AuthorizationFinalizer` that issues gateway sessions.
#[derive(Clone)]
pub struct SessionIssuer {
    store: SessionStore,
}

impl SessionIssuer {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }
}

impl AuthorizationFinalizer for SessionIssuer {
    fn complete_authorization(&self, grant: CompleteAuthorization) -> FinalizeFuture<'_> {
        Box::pin(async move {
            let mut redirect = Url::parse(&grant.request.redirect_uri).map_err(|e| {
                todoist_auth::Error::Finalize(format!("invalid client redirect_uri: {e}"))
            })?;

            let token = mint_token();
            self.store
                .insert(&token, grant.props)
                .await
                .map_err(|e| todoist_auth::Error::Finalize(e.to_string()))?;

            {
                let mut query = redirect.query_pairs_mut();
                query.append_pair("code", &token);
                if !grant.request.state.is_empty() {
                    query.append_pair("state", &grant.request.state);
                }
            }

            info!(
                user = %grant.user_id,
                client_id = %grant.request.client_id,
                scope = %grant.scope.join(" "),
                "session issued"
            );
            Ok(redirect.into())
        })
    }
}
