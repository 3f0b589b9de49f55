//! Todoist OAuth constants
//!
//! Public endpoints and the fixed scope this gateway requests. The client id
//! and secret are deployment configuration, not constants.

/// Todoist authorization page
pub const AUTHORIZE_ENDPOINT: &str = "https://todoist.com/oauth/authorize";

/// Token endpoint for authorization-code exchange
pub const TOKEN_ENDPOINT: &str = "https://todoist.com/oauth/access_token";

/// Scope requested from Todoist: full read/write access to tasks and projects.
pub const DEFAULT_SCOPE: &str = "data:read_write";

/// Path of the bridge's callback endpoint, appended to the public URL.
pub const CALLBACK_PATH: &str = "/callback";

/// Todoist "current user" endpoint, relative to the API base URL.
pub const USER_PATH: &str = "/user";
