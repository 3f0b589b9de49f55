//! Authenticated client for the Todoist REST API
//!
//! A thin wrapper that binds a bearer token at construction and exposes the
//! three primitives the gateway needs: `get`, `post` and `delete`. Responses
//! are normalized into `serde_json::Value`; non-2xx replies become
//! `Error::Api` carrying the status and the raw body text.
//!
//! There is no retry, timeout override or pooling beyond what the shared
//! `reqwest::Client` provides. Callers decide what to do with failures.

pub mod client;
pub mod error;
pub mod query;

pub use client::{ApiFuture, DEFAULT_API_BASE_URL, TodoistApi, TodoistClient};
pub use error::{Error, Result};
pub use query::truthy_pairs;
