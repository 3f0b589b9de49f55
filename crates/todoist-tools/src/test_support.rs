//! In-memory `TodoistApi` for handler and dispatcher tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value, json};
use todoist_auth::SessionProps;
use todoist_client::{ApiFuture, TodoistApi};

use crate::dispatch::{ClientFactory, Dispatcher};
use crate::registry::ToolRegistry;
use crate::result::ToolResult;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub params: Map<String, Value>,
    pub body: Option<Value>,
}

#[derive(Clone)]
enum Reply {
    Json(Value),
    Status(u16, String),
}

/// Records every call and answers from a per-path reply table.
/// Unconfigured paths answer `{}`.
#[derive(Default)]
pub(crate) struct MockApi {
    calls: Mutex<Vec<RecordedCall>>,
    replies: Mutex<HashMap<String, Reply>>,
    tokens: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn reply(&self, path: &str, value: Value) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Json(value));
    }

    pub fn fail(&self, path: &str, status: u16, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Status(status, body.to_string()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn only_call(&self) -> RecordedCall {
        let calls = self.calls();
        assert_eq!(calls.len(), 1, "expected exactly one call, got {calls:?}");
        calls.into_iter().next().unwrap()
    }

    pub fn factory_hits(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn last_token(&self) -> Option<String> {
        self.tokens.lock().unwrap().last().cloned()
    }

    fn answer(&self, call: RecordedCall) -> todoist_client::Result<Value> {
        let reply = self.replies.lock().unwrap().get(&call.path).cloned();
        self.calls.lock().unwrap().push(call);
        match reply {
            Some(Reply::Json(value)) => Ok(value),
            Some(Reply::Status(status, body)) => Err(todoist_client::Error::Api { status, body }),
            None => Ok(json!({})),
        }
    }
}

struct SharedMock(Arc<MockApi>);

impl TodoistApi for SharedMock {
    fn get<'a>(&'a self, path: &'a str, params: &'a Map<String, Value>) -> ApiFuture<'a> {
        let result = self.0.answer(RecordedCall {
            method: "GET",
            path: path.to_string(),
            params: params.clone(),
            body: None,
        });
        Box::pin(async move { result })
    }

    fn post<'a>(&'a self, path: &'a str, body: &'a Value) -> ApiFuture<'a> {
        let result = self.0.answer(RecordedCall {
            method: "POST",
            path: path.to_string(),
            params: Map::new(),
            body: Some(body.clone()),
        });
        Box::pin(async move { result })
    }

    fn delete<'a>(&'a self, path: &'a str) -> ApiFuture<'a> {
        let result = self.0.answer(RecordedCall {
            method: "DELETE",
            path: path.to_string(),
            params: Map::new(),
            body: None,
        });
        Box::pin(async move { result })
    }
}

pub(crate) struct MockFactory {
    api: Arc<MockApi>,
}

impl MockFactory {
    pub fn new(api: Arc<MockApi>) -> Self {
        Self { api }
    }
}

impl ClientFactory for MockFactory {
    fn client_for(&self, session: &SessionProps) -> Box<dyn TodoistApi> {
        self.api
            .tokens
            .lock()
            .unwrap()
            .push(session.access_token().expose().clone());
        Box::new(SharedMock(self.api.clone()))
    }
}

pub(crate) fn session() -> SessionProps {
    SessionProps::for_tests("Ada Lovelace", "ada@example.com", "tok-session")
}

/// Dispatch one call against the full catalogue, expecting it to pass
/// validation.
pub(crate) async fn run(api: &Arc<MockApi>, tool: &str, args: Value) -> ToolResult {
    let dispatcher = Dispatcher::new(
        ToolRegistry::with_default_tools().unwrap(),
        Arc::new(MockFactory::new(api.clone())),
    );
    dispatcher.dispatch(tool, args, &session()).await.unwrap()
}
