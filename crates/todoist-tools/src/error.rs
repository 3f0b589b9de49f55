//! Error types for tool dispatch

/// Failures that stop an invocation before its handler runs.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {}", .violations.join("; "))]
    InvalidArguments {
        tool: String,
        violations: Vec<String>,
    },
}

/// Failures inside a handler. Converted to `ToolResult { isError: true }`
/// by the dispatcher, never propagated further.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Api(#[from] todoist_client::Error),

    #[error("invalid arguments: {0}")]
    Arguments(String),

    #[error("unexpected Todoist response: {0}")]
    UnexpectedResponse(String),
}

/// Failures building the registry at startup.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid input schema for {tool}: {message}")]
    Schema { tool: String, message: String },

    #[error("duplicate tool name: {0}")]
    Duplicate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_arguments_lists_every_violation() {
        let err = DispatchError::InvalidArguments {
            tool: "create_project".into(),
            violations: vec!["name: required".into(), "color: not allowed".into()],
        };
        assert_eq!(
            err.to_string(),
            "invalid arguments for create_project: name: required; color: not allowed"
        );
    }

    #[test]
    fn api_errors_keep_status_and_body() {
        let err: ToolError = todoist_client::Error::Api {
            status: 404,
            body: "Project not found".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Todoist API error (404): Project not found");
    }
}
