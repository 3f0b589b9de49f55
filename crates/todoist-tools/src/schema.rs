//! Input schema builders for the tool catalogue
//!
//! Every tool takes a flat JSON object. Schemas are declared once here with
//! `serde_json::json!` and compiled by the registry at startup.

use serde_json::{Value, json};

/// The closed set of Todoist project colors.
pub const PROJECT_COLORS: [&str; 20] = [
    "berry_red",
    "red",
    "orange",
    "yellow",
    "olive_green",
    "lime_green",
    "green",
    "mint_green",
    "teal",
    "sky_blue",
    "light_blue",
    "blue",
    "grape",
    "violet",
    "lavender",
    "magenta",
    "salmon",
    "charcoal",
    "grey",
    "taupe",
];

/// Project view styles accepted by Todoist.
pub const VIEW_STYLES: [&str; 3] = ["list", "board", "calendar"];

/// Page size bounds for list endpoints.
pub const MIN_PAGE_LIMIT: u64 = 1;
pub const MAX_PAGE_LIMIT: u64 = 200;

/// Wrap property schemas into a closed object schema.
pub fn tool_input_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

pub fn string_field(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

pub fn non_empty_string_field(description: &str) -> Value {
    json!({
        "type": "string",
        "minLength": 1,
        "description": description
    })
}

/// Todoist identifiers are opaque alphanumeric strings and are spliced into
/// URL paths, so nothing outside `[A-Za-z0-9_-]` is accepted.
pub fn id_field(description: &str) -> Value {
    json!({
        "type": "string",
        "pattern": "^[A-Za-z0-9_-]+$",
        "description": description
    })
}

pub fn boolean_field(description: &str) -> Value {
    json!({
        "type": "boolean",
        "description": description
    })
}

pub fn integer_field(description: &str) -> Value {
    json!({
        "type": "integer",
        "description": description
    })
}

pub fn color_field() -> Value {
    json!({
        "type": "string",
        "enum": PROJECT_COLORS,
        "description": "Project color name"
    })
}

pub fn view_style_field() -> Value {
    json!({
        "type": "string",
        "enum": VIEW_STYLES,
        "description": "How the project is displayed"
    })
}

pub fn cursor_field() -> Value {
    string_field("Pagination cursor returned as next_cursor by a previous call")
}

pub fn limit_field() -> Value {
    json!({
        "type": "integer",
        "minimum": MIN_PAGE_LIMIT,
        "maximum": MAX_PAGE_LIMIT,
        "description": "Number of results per page (1-200)"
    })
}
