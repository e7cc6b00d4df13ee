//! LLM fallback agent with tool selection.
//!
//! The model is offered the deterministic field searches as callable
//! tools through a strict JSON contract; its output is used only to pick
//! a key in a static dispatch table, never executed or reflected over.
//! Soft failures (empty reply, no-match tool result, unparseable choice)
//! re-ask a plain conversational completion; a hard provider error on
//! the tool-calling path also falls back to the plain completion and is
//! never propagated past it.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::warn;

use crate::config::Config;
use crate::llm::{self, CompletionClient, OpenAiClient};
use crate::router::{classify, greeting_reply, Intent};
use crate::search::{self, SearchField};

/// The dispatch table: tool name, target field, description shown to the
/// model.
const TOOLS: [(&str, SearchField, &str); 5] = [
    (
        "search_by_keyword",
        SearchField::Keyword,
        "Search projects by a keyword in their name or description.",
    ),
    (
        "search_by_frontend",
        SearchField::Frontend,
        "Search projects by frontend technology.",
    ),
    (
        "search_by_backend",
        SearchField::Backend,
        "Search projects by backend technology.",
    ),
    (
        "search_by_database",
        SearchField::Database,
        "Search projects by database technology.",
    ),
    (
        "search_by_hardware",
        SearchField::Hardware,
        "Search projects by hardware used.",
    ),
];

/// What the model decided to do with the query.
#[derive(Debug, PartialEq)]
enum ToolChoice {
    Call { field: SearchField, query: String },
    Answer(String),
}

fn tool_field(name: &str) -> Option<SearchField> {
    TOOLS
        .iter()
        .find(|(tool_name, _, _)| *tool_name == name)
        .map(|(_, field, _)| *field)
}

fn tool_system_prompt() -> String {
    let mut prompt = String::from(
        "You answer questions about a portfolio of GitHub projects. \
         You may call one of these tools:\n",
    );
    for (name, _, description) in TOOLS {
        prompt.push_str(&format!("- {}: {}\n", name, description));
    }
    prompt.push_str(
        "Reply with JSON only. To call a tool: \
         {\"tool\": \"<name>\", \"query\": \"<search terms>\"}. \
         To answer directly: {\"answer\": \"<your reply>\"}.",
    );
    prompt
}

/// Parse the model's JSON reply into a dispatch decision.
///
/// Tolerates a fenced code block around the JSON. Unknown tool names and
/// malformed output return `None`, which the caller treats as a soft
/// failure.
fn parse_tool_choice(reply: &str) -> Option<ToolChoice> {
    let trimmed = reply.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let value: serde_json::Value = serde_json::from_str(json).ok()?;

    if let Some(answer) = value.get("answer").and_then(|a| a.as_str()) {
        return Some(ToolChoice::Answer(answer.to_string()));
    }

    let tool = value.get("tool").and_then(|t| t.as_str())?;
    let query = value.get("query").and_then(|q| q.as_str())?.to_string();
    let field = tool_field(tool)?;

    Some(ToolChoice::Call { field, query })
}

/// Plain conversational completion, the last fallback layer.
///
/// Errors from here (key missing, retries exhausted) do propagate; the
/// HTTP boundary turns them into a 500 detail string.
pub async fn plain_completion(client: &dyn CompletionClient, query: &str) -> Result<String> {
    client
        .complete(
            "You are a friendly assistant for a developer's project portfolio. \
             Answer the user's message conversationally.",
            query,
        )
        .await
}

/// Tool-calling path: let the model pick a search tool or answer
/// directly.
async fn tool_calling_agent(
    client: &dyn CompletionClient,
    pool: &SqlitePool,
    query: &str,
) -> Result<String> {
    let reply = client.complete(&tool_system_prompt(), query).await?;

    match parse_tool_choice(&reply) {
        Some(ToolChoice::Call { field, query }) => search::search_store(pool, field, &query).await,
        Some(ToolChoice::Answer(answer)) => Ok(answer),
        None => {
            warn!(reply = %reply, "agent reply did not match the tool contract");
            Ok(String::new())
        }
    }
}

/// Delegate a query the router could not resolve.
///
/// Empty or no-match agent output re-asks the plain completion; an agent
/// error falls back to the plain completion unconditionally.
pub async fn answer_with_agent(
    client: &dyn CompletionClient,
    pool: &SqlitePool,
    query: &str,
) -> Result<String> {
    match tool_calling_agent(client, pool, query).await {
        Ok(reply) if !reply.trim().is_empty() && !search::is_no_match(&reply) => Ok(reply),
        Ok(_) => plain_completion(client, query).await,
        Err(e) => {
            warn!(error = %e, "tool-calling agent failed, using plain completion");
            plain_completion(client, query).await
        }
    }
}

/// Answer a chat query: deterministic routing first, LLM fallback after.
///
/// With the LLM disabled or its API key absent the fallback degrades to
/// a keyword search, so the endpoint still answers.
pub async fn answer_query(config: &Config, pool: &SqlitePool, query: &str) -> Result<String> {
    if llm::is_available(&config.llm) {
        let client = OpenAiClient::new(&config.llm);
        route_query(Some(&client), pool, query).await
    } else {
        route_query(None, pool, query).await
    }
}

async fn route_query(
    client: Option<&dyn CompletionClient>,
    pool: &SqlitePool,
    query: &str,
) -> Result<String> {
    match classify(query) {
        Intent::Greeting => Ok(greeting_reply()),
        Intent::Search(field) => {
            let reply = search::search_store(pool, field, query).await?;
            match client {
                Some(client) if search::is_no_match(&reply) => {
                    answer_with_agent(client, pool, query).await
                }
                _ => Ok(reply),
            }
        }
        Intent::None => match client {
            Some(client) => answer_with_agent(client, pool, query).await,
            None => search::search_store(pool, SearchField::Keyword, query).await,
        },
    }
}
