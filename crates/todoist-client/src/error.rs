//! Error types for Todoist API calls

/// Errors from a single Todoist API call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-2xx response. `body` is the raw response text, never parsed.
    #[error("Todoist API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("invalid JSON response: {0}")]
    Decode(String),

    #[error("invalid request URL: {0}")]
    Url(String),
}

impl Error {
    /// HTTP status for `Api` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias for Todoist API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_carries_status_and_raw_body() {
        let err = Error::Api {
            status: 403,
            body: "<html>Forbidden</html>".into(),
        };
        assert_eq!(
            err.to_string(),
            "Todoist API error (403): <html>Forbidden</html>"
        );
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn non_api_errors_have_no_status() {
        assert_eq!(Error::Decode("eof".into()).status(), None);
        assert_eq!(Error::Http("refused".into()).status(), None);
    }
}
