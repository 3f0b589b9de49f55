use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{parse, to_object, whole_number};
use crate::registry::{ToolContext, ToolDefinition, ToolFuture};
use crate::result::ToolOutput;
use crate::schema::{
    cursor_field, id_field, integer_field, limit_field, non_empty_string_field, tool_input_schema,
};

pub(super) fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_sections",
            description: "List sections, optionally restricted to one project.",
            input_schema: tool_input_schema(
                json!({
                    "project_id": id_field("Only return sections of this project"),
                    "cursor": cursor_field(),
                    "limit": limit_field(),
                }),
                &[],
            ),
            handler: get_sections,
        },
        ToolDefinition {
            name: "get_section",
            description: "Get a single section by ID.",
            input_schema: section_ref_schema(),
            handler: get_section,
        },
        ToolDefinition {
            name: "create_section",
            description: "Create a section inside a project.",
            input_schema: tool_input_schema(
                json!({
                    "name": non_empty_string_field("Section name"),
                    "project_id": id_field("ID of the project the section belongs to"),
                    "order": integer_field("Position among the project's sections"),
                }),
                &["name", "project_id"],
            ),
            handler: create_section,
        },
        ToolDefinition {
            name: "update_section",
            description: "Rename a section.",
            input_schema: tool_input_schema(
                json!({
                    "section_id": id_field("ID of the section to rename"),
                    "name": non_empty_string_field("New section name"),
                }),
                &["section_id", "name"],
            ),
            handler: update_section,
        },
        ToolDefinition {
            name: "delete_section",
            description: "Delete a section and all tasks in it.",
            input_schema: section_ref_schema(),
            handler: delete_section,
        },
    ]
}

fn section_ref_schema() -> Value {
    tool_input_schema(
        json!({"section_id": id_field("Section ID")}),
        &["section_id"],
    )
}

#[derive(Debug, Serialize, Deserialize)]
struct ListSections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cursor: Option<String>,
    #[serde(
        default,
        deserialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SectionRef {
    section_id: String,
}

impl SectionRef {
    fn path(&self) -> String {
        format!("/sections/{}", self.section_id)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CreateSection {
    name: String,
    project_id: String,
    #[serde(
        default,
        deserialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    order: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UpdateSection {
    #[serde(skip_serializing)]
    section_id: String,
    name: String,
}

fn get_sections(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: ListSections = parse(args)?;
        let params = to_object(&args)?;
        let reply = ctx.api.get("/sections", &params).await?;
        Ok(ToolOutput::Json(reply))
    })
}

fn get_section(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let section: SectionRef = parse(args)?;
        let reply = ctx.api.get(&section.path(), &Map::new()).await?;
        Ok(ToolOutput::Json(reply))
    })
}

fn create_section(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: CreateSection = parse(args)?;
        let body = Value::Object(to_object(&args)?);
        let reply = ctx.api.post("/sections", &body).await?;
        Ok(ToolOutput::Json(reply))
    })
}

fn update_section(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: UpdateSection = parse(args)?;
        let path = format!("/sections/{}", args.section_id);
        let body = Value::Object(to_object(&args)?);
        let reply = ctx.api.post(&path, &body).await?;
        Ok(ToolOutput::Json(reply))
    })
}

fn delete_section(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let section: SectionRef = parse(args)?;
        ctx.api.delete(&section.path()).await?;
        Ok(ToolOutput::Text("Section deleted successfully".into()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockApi, run};
    use std::sync::Arc;

    #[tokio::test]
    async fn get_sections_filters_by_project() {
        let api = Arc::new(MockApi::default());
        run(&api, "get_sections", json!({"project_id": "p1", "limit": 10})).await;

        let call = api.only_call();
        assert_eq!(call.path, "/sections");
        assert_eq!(Value::Object(call.params), json!({"project_id": "p1", "limit": 10}));
    }

    #[tokio::test]
    async fn integral_floats_pass_through_as_integers() {
        let api = Arc::new(MockApi::default());
        let result = run(&api, "get_sections", json!({"limit": 10.0})).await;
        assert!(!result.is_error(), "got {result:?}");
        assert_eq!(api.only_call().params["limit"], 10);

        let api = Arc::new(MockApi::default());
        run(
            &api,
            "create_section",
            json!({"name": "Backlog", "project_id": "p1", "order": 3.0}),
        )
        .await;
        assert_eq!(api.only_call().body.unwrap()["order"], 3);
    }

    #[test]
    fn get_sections_rejects_oversized_page() {
        let registry = crate::registry::ToolRegistry::with_default_tools().unwrap();
        let err = registry
            .resolve("get_sections", &json!({"limit": 201}))
            .err()
            .unwrap();
        assert!(err.to_string().contains("limit: "), "got {err}");
    }

    #[tokio::test]
    async fn create_section_sends_order_when_given() {
        let api = Arc::new(MockApi::default());
        run(
            &api,
            "create_section",
            json!({"name": "Backlog", "project_id": "p1", "order": 2}),
        )
        .await;

        let call = api.only_call();
        assert_eq!(call.method, "POST");
        assert_eq!(call.path, "/sections");
        assert_eq!(
            call.body,
            Some(json!({"name": "Backlog", "project_id": "p1", "order": 2}))
        );
    }

    #[tokio::test]
    async fn update_section_posts_name_only() {
        let api = Arc::new(MockApi::default());
        api.reply("/sections/s1", json!({"id": "s1", "name": "Doing"}));

        let result = run(&api, "update_section", json!({"section_id": "s1", "name": "Doing"})).await;

        let call = api.only_call();
        assert_eq!(call.body, Some(json!({"name": "Doing"})));
        let parsed: Value = serde_json::from_str(result.text_content().unwrap()).unwrap();
        assert_eq!(parsed["name"], "Doing");
    }

    #[tokio::test]
    async fn delete_section_confirms() {
        let api = Arc::new(MockApi::default());
        let result = run(&api, "delete_section", json!({"section_id": "s1"})).await;

        assert_eq!(result.text_content(), Some("Section deleted successfully"));
        let call = api.only_call();
        assert_eq!(call.method, "DELETE");
        assert_eq!(call.path, "/sections/s1");
    }

    #[test]
    fn path_ids_must_be_plain_tokens() {
        let registry = crate::registry::ToolRegistry::with_default_tools().unwrap();
        assert!(
            registry
                .resolve("get_section", &json!({"section_id": "../projects"}))
                .is_err()
        );
    }
}
