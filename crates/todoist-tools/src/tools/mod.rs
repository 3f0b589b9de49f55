//! The Todoist tool catalogue

mod projects;
mod sections;
mod tasks;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::ToolError;
use crate::registry::ToolDefinition;

/// Every tool, in listing order.
pub fn catalogue() -> Vec<ToolDefinition> {
    let mut tools = tasks::definitions();
    tools.extend(projects::definitions());
    tools.extend(sections::definitions());
    tools
}

/// Decode schema-validated arguments into a handler's parameter struct.
fn parse<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::Arguments(e.to_string()))
}

/// Optional integer argument.
///
/// JSON Schema counts `50.0` as an integer, so whole floats that passed
/// validation are accepted here and normalized.
fn whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(n) = number.as_i64() {
        return Ok(Some(n));
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(Some(f as i64))
        }
        _ => Err(D::Error::custom(format!(
            "expected a whole number, got {number}"
        ))),
    }
}

/// Serialize a parameter struct into a JSON body or query map.
fn to_object<T: Serialize>(params: &T) -> Result<Map<String, Value>, ToolError> {
    match serde_json::to_value(params) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ToolError::Arguments(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(ToolError::Arguments(e.to_string())),
    }
}
