//! Static tool registry
//!
//! Tools are declared once as `ToolDefinition`s and compiled into a
//! name-keyed table at startup. The table is immutable afterwards.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;
use todoist_auth::SessionProps;
use todoist_client::TodoistApi;

use crate::error::{DispatchError, RegistryError, ToolError};
use crate::result::ToolOutput;

/// Boxed future returned by tool handlers.
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send + 'a>>;

/// A tool handler: validated arguments in, output or error out.
///
/// Handlers are plain functions. Everything they may touch arrives through
/// `ToolContext`, so each one can be exercised against a mock `TodoistApi`.
pub type ToolHandler = for<'a> fn(Value, ToolContext<'a>) -> ToolFuture<'a>;

/// Per-invocation inputs handed to a handler.
#[derive(Clone, Copy)]
pub struct ToolContext<'a> {
    pub session: &'a SessionProps,
    pub api: &'a dyn TodoistApi,
}

/// Declaration of one tool.
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub handler: ToolHandler,
}

/// Public description of a tool, as listed to agents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Field-level validator for a closed, flat object schema.
///
/// Each property is compiled separately so violations can name the field
/// they concern.
struct InputValidator {
    fields: BTreeMap<String, jsonschema::Validator>,
    required: Vec<String>,
    closed: bool,
}

impl InputValidator {
    fn compile(schema: &Value) -> Result<Self, String> {
        if schema.get("type").and_then(Value::as_str) != Some("object") {
            return Err("input schema must describe an object".into());
        }

        let mut fields = BTreeMap::new();
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                let validator = jsonschema::validator_for(property)
                    .map_err(|e| format!("property {name}: {e}"))?;
                fields.insert(name.clone(), validator);
            }
        }

        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

        Ok(Self {
            fields,
            required,
            closed,
        })
    }

    fn violations(&self, args: &Value) -> Vec<String> {
        let Some(object) = args.as_object() else {
            return vec!["arguments must be a JSON object".into()];
        };

        let mut violations = Vec::new();
        for name in &self.required {
            if !object.contains_key(name) {
                violations.push(format!("{name}: required field missing"));
            }
        }
        for (name, value) in object {
            match self.fields.get(name) {
                Some(validator) => violations.extend(
                    validator
                        .iter_errors(value)
                        .map(|err| format!("{name}: {err}")),
                ),
                None if self.closed => violations.push(format!("{name}: unknown field")),
                None => {}
            }
        }
        violations
    }
}

struct RegisteredTool {
    spec: ToolSpec,
    validator: InputValidator,
    handler: ToolHandler,
}

/// Name-keyed table of compiled tools, in declaration order.
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Compile a set of definitions. Fails on a bad schema or a repeated name.
    pub fn new(definitions: Vec<ToolDefinition>) -> Result<Self, RegistryError> {
        let mut tools = Vec::with_capacity(definitions.len());
        let mut index = HashMap::with_capacity(definitions.len());

        for definition in definitions {
            if index.contains_key(definition.name) {
                return Err(RegistryError::Duplicate(definition.name.to_string()));
            }
            let validator =
                InputValidator::compile(&definition.input_schema).map_err(|message| {
                    RegistryError::Schema {
                        tool: definition.name.to_string(),
                        message,
                    }
                })?;
            index.insert(definition.name.to_string(), tools.len());
            tools.push(RegisteredTool {
                spec: ToolSpec {
                    name: definition.name.to_string(),
                    description: definition.description.to_string(),
                    input_schema: definition.input_schema,
                },
                validator,
                handler: definition.handler,
            });
        }

        Ok(Self { tools, index })
    }

    /// Registry holding the full Todoist catalogue.
    pub fn with_default_tools() -> Result<Self, RegistryError> {
        Self::new(crate::tools::catalogue())
    }

    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter().map(|tool| &tool.spec)
    }

    pub fn spec(&self, name: &str) -> Option<&ToolSpec> {
        self.lookup(name).map(|tool| &tool.spec)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve `name` and check `args` against its schema.
    ///
    /// Returns the handler only when the arguments are valid.
    pub fn resolve(&self, name: &str, args: &Value) -> Result<ToolHandler, DispatchError> {
        let tool = self
            .lookup(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;

        let violations = tool.validator.violations(args);
        if !violations.is_empty() {
            return Err(DispatchError::InvalidArguments {
                tool: name.to_string(),
                violations,
            });
        }
        Ok(tool.handler)
    }

    fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{limit_field, string_field, tool_input_schema};
    use serde_json::json;

    fn echo(args: Value, _ctx: ToolContext<'_>) -> ToolFuture<'_> {
        Box::pin(async move { Ok(ToolOutput::Json(args)) })
    }

    fn definition(name: &'static str) -> ToolDefinition {
        ToolDefinition {
            name,
            description: "Echo the arguments",
            input_schema: tool_input_schema(
                json!({
                    "name": string_field("Name"),
                    "limit": limit_field(),
                }),
                &["name"],
            ),
            handler: echo,
        }
    }

    #[test]
    fn lists_specs_in_declaration_order() {
        let registry = ToolRegistry::new(vec![definition("b_tool"), definition("a_tool")]).unwrap();
        let names: Vec<_> = registry.specs().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b_tool", "a_tool"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn spec_serializes_with_camel_case_schema_key() {
        let registry = ToolRegistry::new(vec![definition("echo")]).unwrap();
        let wire = serde_json::to_value(registry.spec("echo").unwrap()).unwrap();
        assert_eq!(wire["name"], "echo");
        assert_eq!(wire["inputSchema"]["type"], "object");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = ToolRegistry::new(vec![definition("echo"), definition("echo")])
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "echo"));
    }

    #[test]
    fn non_object_schema_is_rejected() {
        let err = ToolRegistry::new(vec![ToolDefinition {
            input_schema: json!({"type": "string"}),
            ..definition("bad")
        }])
        .err()
        .unwrap();
        assert!(matches!(err, RegistryError::Schema { .. }), "got {err:?}");
    }

    #[test]
    fn unknown_tool_is_reported() {
        let registry = ToolRegistry::new(vec![definition("echo")]).unwrap();
        let err = registry.resolve("nope", &json!({})).err().unwrap();
        assert!(matches!(err, DispatchError::UnknownTool(name) if name == "nope"));
    }

    #[test]
    fn violations_name_each_field() {
        let registry = ToolRegistry::new(vec![definition("echo")]).unwrap();
        let err = registry
            .resolve("echo", &json!({"limit": 500, "extra": true}))
            .err()
            .unwrap();
        let DispatchError::InvalidArguments { tool, violations } = err else {
            panic!("expected InvalidArguments");
        };
        assert_eq!(tool, "echo");
        assert_eq!(violations.len(), 3, "got {violations:?}");
        assert!(violations.iter().any(|v| v.starts_with("name: required")));
        assert!(violations.iter().any(|v| v.starts_with("limit: ")));
        assert!(violations.iter().any(|v| v == "extra: unknown field"));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let registry = ToolRegistry::new(vec![definition("echo")]).unwrap();
        let err = registry.resolve("echo", &json!(["name"])).err().unwrap();
        assert!(matches!(err, DispatchError::InvalidArguments { .. }));
    }

    #[test]
    fn valid_arguments_resolve_handler() {
        let registry = ToolRegistry::new(vec![definition("echo")]).unwrap();
        assert!(
            registry
                .resolve("echo", &json!({"name": "x", "limit": 200}))
                .is_ok()
        );
    }
}
