use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{parse, to_object, whole_number};
use crate::registry::{ToolContext, ToolDefinition, ToolFuture};
use crate::result::ToolOutput;
use crate::schema::{
    boolean_field, color_field, cursor_field, id_field, limit_field, non_empty_string_field,
    string_field, tool_input_schema, view_style_field,
};

pub(super) fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_projects",
            description: "List the user's projects, one page at a time.",
            input_schema: tool_input_schema(
                json!({
                    "cursor": cursor_field(),
                    "limit": limit_field(),
                }),
                &[],
            ),
            handler: get_projects,
        },
        ToolDefinition {
            name: "get_project",
            description: "Get a single project by ID.",
            input_schema: project_ref_schema(),
            handler: get_project,
        },
        ToolDefinition {
            name: "create_project",
            description: "Create a new project.",
            input_schema: tool_input_schema(
                json!({
                    "name": non_empty_string_field("Project name"),
                    "description": string_field("Project description"),
                    "parent_id": id_field("ID of the parent project"),
                    "color": color_field(),
                    "is_favorite": boolean_field("Mark the project as a favorite"),
                    "view_style": view_style_field(),
                }),
                &["name"],
            ),
            handler: create_project,
        },
        ToolDefinition {
            name: "update_project",
            description: "Update a project. Only the supplied fields are changed.",
            input_schema: tool_input_schema(
                json!({
                    "project_id": id_field("ID of the project to update"),
                    "name": non_empty_string_field("New project name"),
                    "description": string_field("New project description"),
                    "color": color_field(),
                    "is_favorite": boolean_field("Mark the project as a favorite"),
                    "view_style": view_style_field(),
                }),
                &["project_id"],
            ),
            handler: update_project,
        },
        ToolDefinition {
            name: "archive_project",
            description: "Archive a project and its descendants.",
            input_schema: project_ref_schema(),
            handler: archive_project,
        },
        ToolDefinition {
            name: "unarchive_project",
            description: "Restore an archived project.",
            input_schema: project_ref_schema(),
            handler: unarchive_project,
        },
        ToolDefinition {
            name: "delete_project",
            description: "Delete a project and everything in it. This cannot be undone.",
            input_schema: project_ref_schema(),
            handler: delete_project,
        },
    ]
}

fn project_ref_schema() -> Value {
    tool_input_schema(
        json!({"project_id": id_field("Project ID")}),
        &["project_id"],
    )
}

#[derive(Debug, Serialize, Deserialize)]
struct PageArgs {
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
struct ProjectRef {
    project_id: String,
}

impl ProjectRef {
    fn path(&self) -> String {
        format!("/projects/{}", self.project_id)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CreateProject {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_favorite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    view_style: Option<String>,
}

/// Partial update. `project_id` addresses the project and is not part of
/// the body.
#[derive(Debug, Serialize, Deserialize)]
struct UpdateProject {
    #[serde(skip_serializing)]
    project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_favorite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    view_style: Option<String>,
}

fn get_projects(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: PageArgs = parse(args)?;
        let params = to_object(&args)?;
        let reply = ctx.api.get("/projects", &params).await?;
        Ok(ToolOutput::Json(reply))
    })
}

fn get_project(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let project: ProjectRef = parse(args)?;
        let reply = ctx.api.get(&project.path(), &Map::new()).await?;
        Ok(ToolOutput::Json(reply))
    })
}

fn create_project(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: CreateProject = parse(args)?;
        let body = Value::Object(to_object(&args)?);
        let reply = ctx.api.post("/projects", &body).await?;
        Ok(ToolOutput::Json(reply))
    })
}

fn update_project(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: UpdateProject = parse(args)?;
        let path = format!("/projects/{}", args.project_id);
        let body = Value::Object(to_object(&args)?);
        let reply = ctx.api.post(&path, &body).await?;
        Ok(ToolOutput::Json(reply))
    })
}

fn archive_project(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let project: ProjectRef = parse(args)?;
        ctx.api
            .post(&format!("{}/archive", project.path()), &json!({}))
            .await?;
        Ok(ToolOutput::Text("Project archived successfully".into()))
    })
}

fn unarchive_project(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let project: ProjectRef = parse(args)?;
        ctx.api
            .post(&format!("{}/unarchive", project.path()), &json!({}))
            .await?;
        Ok(ToolOutput::Text("Project unarchived successfully".into()))
    })
}

fn delete_project(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let project: ProjectRef = parse(args)?;
        ctx.api.delete(&project.path()).await?;
        Ok(ToolOutput::Text("Project deleted successfully".into()))
    })
}
