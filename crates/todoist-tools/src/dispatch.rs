//! Tool invocation
//!
//! `Dispatcher::dispatch()` looks the tool up, validates the arguments,
//! binds a Todoist client to the caller's session and runs the handler.
//! Handler failures are folded into an error `ToolResult`; only lookup and
//! validation failures surface as `DispatchError`.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};
use todoist_auth::SessionProps;
use todoist_client::{TodoistApi, TodoistClient};
use tracing::{debug, instrument, warn};

use crate::error::DispatchError;
use crate::registry::{ToolContext, ToolRegistry, ToolSpec};
use crate::result::ToolResult;

/// Builds the `TodoistApi` a single invocation runs against.
pub trait ClientFactory: Send + Sync {
    fn client_for(&self, session: &SessionProps) -> Box<dyn TodoistApi>;
}

/// Production factory: one `TodoistClient` per invocation, sharing the
/// connection pool of a single `reqwest::Client`.
#[derive(Clone)]
pub struct HttpClientFactory {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClientFactory {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

impl ClientFactory for HttpClientFactory {
    fn client_for(&self, session: &SessionProps) -> Box<dyn TodoistApi> {
        Box::new(TodoistClient::new(
            self.http.clone(),
            self.base_url.clone(),
            session.access_token().clone(),
        ))
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    clients: Arc<dyn ClientFactory>,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, clients: Arc<dyn ClientFactory>) -> Self {
        Self {
            registry: Arc::new(registry),
            clients,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Every registered tool, in catalogue order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.registry.specs().cloned().collect()
    }

    /// Run one tool call under `session`.
    ///
    /// Missing arguments (`null`) are treated as an empty object.
    #[instrument(skip_all, fields(tool = %name))]
    pub async fn dispatch(
        &self,
        name: &str,
        args: Value,
        session: &SessionProps,
    ) -> Result<ToolResult, DispatchError> {
        let args = match args {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        let handler = self.registry.resolve(name, &args).inspect_err(|err| {
            debug!(error = %err, "tool call rejected");
        })?;

        let api = self.clients.client_for(session);
        let ctx = ToolContext {
            session,
            api: api.as_ref(),
        };

        let started = Instant::now();
        match handler(args, ctx).await {
            Ok(output) => {
                debug!(elapsed_ms = started.elapsed().as_millis() as u64, "tool call succeeded");
                Ok(output.into())
            }
            Err(err) => {
                warn!(
                    error = %err,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "tool call failed"
                );
                Ok(ToolResult::error(format!("Error: {err}")))
            }
        }
    }
}
