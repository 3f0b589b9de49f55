//! Todoist tool catalogue and dispatcher
//!
//! Each tool is a named, schema-described operation that maps onto one
//! Todoist API call. Callers list the catalogue with `Dispatcher::specs()`
//! and invoke tools with `Dispatcher::dispatch()`, which validates the
//! arguments before any network traffic and always answers with a
//! `ToolResult` once the handler has run.

pub mod dispatch;
pub mod error;
pub mod registry;
pub mod result;
pub mod schema;
mod tools;

#[cfg(test)]
mod test_support;

pub use dispatch::{ClientFactory, Dispatcher, HttpClientFactory};
pub use error::{DispatchError, RegistryError, ToolError};
pub use registry::{ToolContext, ToolDefinition, ToolFuture, ToolHandler, ToolRegistry, ToolSpec};
pub use result::{Content, ToolOutput, ToolResult};
pub use tools::catalogue;
