use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::parse;
use crate::error::ToolError;
use crate::registry::{ToolContext, ToolDefinition, ToolFuture};
use crate::result::ToolOutput;
use crate::schema::{MAX_PAGE_LIMIT, non_empty_string_field, string_field, tool_input_schema};

pub(super) const LIMIT_EXCEEDED: &str = "Tasks limit exceeded";

pub(super) fn definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: "get_tasks_by_filter",
        description: "Get tasks matching a Todoist filter query, e.g. \"today | overdue\". \
                      Returns each task's content, description and due date. Fails with \
                      a limit message if more than 200 tasks match.",
        input_schema: tool_input_schema(
            json!({
                "filter": non_empty_string_field("Todoist filter query"),
                "lang": string_field("Language of the filter query, e.g. \"en\""),
            }),
            &["filter"],
        ),
        handler: get_tasks_by_filter,
    }]
}

#[derive(Debug, Deserialize)]
struct FilterArgs {
    filter: String,
    #[serde(default)]
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskPage {
    #[serde(default)]
    results: Vec<Task>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Task {
    #[serde(default)]
    content: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    due: Option<Due>,
}

#[derive(Debug, Deserialize)]
struct Due {
    date: Option<String>,
}

/// The only task fields handed back to the agent.
#[derive(Debug, Serialize, PartialEq)]
struct TaskSummary {
    content: String,
    description: String,
    due_date: Option<String>,
}

impl From<Task> for TaskSummary {
    fn from(task: Task) -> Self {
        Self {
            content: task.content,
            description: task.description,
            due_date: task.due.and_then(|due| due.date),
        }
    }
}

/// One page only. More than one page is reported, never truncated.
fn get_tasks_by_filter(args: Value, ctx: ToolContext<'_>) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: FilterArgs = parse(args)?;

        let mut params = Map::new();
        params.insert("query".into(), Value::String(args.filter));
        params.insert("limit".into(), json!(MAX_PAGE_LIMIT));
        if let Some(lang) = args.lang {
            params.insert("lang".into(), Value::String(lang));
        }

        let reply = ctx.api.get("/tasks/filter", &params).await?;
        let page: TaskPage = serde_json::from_value(reply)
            .map_err(|e| ToolError::UnexpectedResponse(format!("task page: {e}")))?;

        if page.next_cursor.is_some_and(|cursor| !cursor.is_empty()) {
            return Ok(ToolOutput::Text(LIMIT_EXCEEDED.to_string()));
        }

        let summaries: Vec<TaskSummary> = page.results.into_iter().map(Into::into).collect();
        let value = serde_json::to_value(summaries)
            .map_err(|e| ToolError::UnexpectedResponse(e.to_string()))?;
        Ok(ToolOutput::Json(value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockApi, run};
    use std::sync::Arc;

    #[tokio::test]
    async fn sends_query_with_fixed_limit() {
        let api = Arc::new(MockApi::default());
        run(&api, "get_tasks_by_filter", json!({"filter": "today | overdue"})).await;

        let call = api.only_call();
        assert_eq!(call.method, "GET");
        assert_eq!(call.path, "/tasks/filter");
        assert_eq!(call.params["query"], "today | overdue");
        assert_eq!(call.params["limit"], 200);
        assert!(!call.params.contains_key("lang"));
    }

    #[tokio::test]
    async fn forwards_lang_when_given() {
        let api = Arc::new(MockApi::default());
        run(&api, "get_tasks_by_filter", json!({"filter": "hoy", "lang": "es"})).await;
        assert_eq!(api.only_call().params["lang"], "es");
    }

    #[tokio::test]
    async fn projects_tasks_to_summary() {
        let api = Arc::new(MockApi::default());
        api.reply(
            "/tasks/filter",
            json!({
                "results": [
                    {
                        "id": "1",
                        "content": "Buy milk",
                        "description": "2 litres",
                        "priority": 4,
                        "due": {"date": "2026-10-15", "is_recurring": false}
                    },
                    {"id": "2", "content": "Call Bob", "description": "", "due": null}
                ],
                "next_cursor": null
            }),
        );

        let result = run(&api, "get_tasks_by_filter", json!({"filter": "today"})).await;
        assert!(!result.is_error());
        let tasks: Value = serde_json::from_str(result.text_content().unwrap()).unwrap();
        assert_eq!(
            tasks,
            json!([
                {"content": "Buy milk", "description": "2 litres", "due_date": "2026-10-15"},
                {"content": "Call Bob", "description": "", "due_date": null}
            ])
        );
    }

    #[tokio::test]
    async fn continuation_cursor_means_limit_exceeded() {
        let api = Arc::new(MockApi::default());
        api.reply(
            "/tasks/filter",
            json!({
                "results": [{"content": "partial", "description": ""}],
                "next_cursor": "abc"
            }),
        );

        let result = run(&api, "get_tasks_by_filter", json!({"filter": "all"})).await;
        assert_eq!(result.text_content(), Some(LIMIT_EXCEEDED));
        assert!(!result.is_error());
    }

    #[tokio::test]
    async fn empty_cursor_is_last_page() {
        let api = Arc::new(MockApi::default());
        api.reply("/tasks/filter", json!({"results": [], "next_cursor": ""}));

        let result = run(&api, "get_tasks_by_filter", json!({"filter": "all"})).await;
        assert_eq!(result.text_content(), Some("[]"));
    }

    #[tokio::test]
    async fn malformed_page_is_error_result() {
        let api = Arc::new(MockApi::default());
        api.reply("/tasks/filter", json!({"results": "nope"}));

        let result = run(&api, "get_tasks_by_filter", json!({"filter": "all"})).await;
        assert!(result.is_error());
        assert!(
            result
                .text_content()
                .unwrap()
                .starts_with("Error: unexpected Todoist response")
        );
    }
}
