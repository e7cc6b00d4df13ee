//! Deterministic field searches over the project store.
//!
//! Filtering and rendering are pure functions over in-memory records;
//! [`search_store`] is the thin store-backed wrapper. Every search
//! returns human-readable text (rendered matches or a per-category
//! no-match sentinel) and never an error to the chat caller.
//!
//! Multi-word queries use OR semantics: a record matches when any
//! whitespace token appears in the relevant field, not only on an exact
//! phrase.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::ProjectRecord;
use crate::store;

/// The record field a search filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    /// Name + project name + description.
    Keyword,
    Frontend,
    Backend,
    Database,
    Hardware,
}

impl SearchField {
    /// Lowercase label used in no-match sentinels and tool names.
    pub fn label(&self) -> &'static str {
        match self {
            SearchField::Keyword => "keyword",
            SearchField::Frontend => "frontend",
            SearchField::Backend => "backend",
            SearchField::Database => "database",
            SearchField::Hardware => "hardware",
        }
    }

    /// The haystack this field matches against, lowercased by the caller.
    fn haystack(&self, record: &ProjectRecord) -> String {
        match self {
            SearchField::Keyword => format!(
                "{} {} {}",
                record.name, record.project_name, record.description
            ),
            SearchField::Frontend => record.tech_stack.frontend.clone(),
            SearchField::Backend => record.tech_stack.backend.clone(),
            SearchField::Database => record.tech_stack.database.clone(),
            SearchField::Hardware => record.tech_stack.hardware.clone(),
        }
    }
}

/// Case-insensitive OR filter: keep records where any query token
/// appears in the field. Each record appears at most once regardless of
/// how many tokens matched.
pub fn filter_projects<'a>(
    records: &'a [ProjectRecord],
    field: SearchField,
    query: &str,
) -> Vec<&'a ProjectRecord> {
    let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for record in records {
        if seen.contains(&record.name.as_str()) {
            continue;
        }
        let haystack = field.haystack(record).to_lowercase();
        if tokens.iter().any(|t| haystack.contains(t.as_str())) {
            seen.push(&record.name);
            matches.push(record);
        }
    }

    matches
}

/// The fixed multi-section block for one matched project.
///
/// All five tech-stack categories are always shown, even when
/// `Not specified`; absent links render as their "No ... available"
/// sentinels.
pub fn render_project(record: &ProjectRecord) -> String {
    let features = if record.features.is_empty() {
        "No features listed.".to_string()
    } else {
        record
            .features
            .iter()
            .map(|f| format!("- {}", f))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "**{name}**\n\
         Description: {description}\n\
         Tech Stack:\n\
         - Frontend: {frontend}\n\
         - Backend: {backend}\n\
         - Database: {database}\n\
         - Hardware: {hardware}\n\
         - Other Tools: {other_tools}\n\
         Features:\n{features}\n\
         GitHub: {html_url}\n\
         Demo: {demo}\n\
         Devpost: {devpost}",
        name = record.project_name,
        description = record.description,
        frontend = record.tech_stack.frontend,
        backend = record.tech_stack.backend,
        database = record.tech_stack.database,
        hardware = record.tech_stack.hardware,
        other_tools = record.tech_stack.other_tools,
        features = features,
        html_url = record.html_url,
        demo = record.demo_link.as_deref().unwrap_or("No demo available"),
        devpost = record
            .devpost_link
            .as_deref()
            .unwrap_or("No Devpost available"),
    )
}

/// Per-category sentinel for an empty result set. The router and the
/// fallback agent key off this wording to decide to retry elsewhere.
pub fn no_match_message(field: SearchField, query: &str) -> String {
    match field {
        SearchField::Keyword => format!("No matching projects found for: {}.", query),
        _ => format!(
            "No matching {} projects found for: {}.",
            field.label(),
            query
        ),
    }
}

/// True when `reply` is a no-match sentinel from any search category.
pub fn is_no_match(reply: &str) -> bool {
    reply.starts_with("No matching")
}

/// Run a field search over in-memory records. Always returns a
/// non-empty string.
pub fn run_field_search(records: &[ProjectRecord], field: SearchField, query: &str) -> String {
    let matches = filter_projects(records, field, query);
    if matches.is_empty() {
        return no_match_message(field, query);
    }

    matches
        .into_iter()
        .map(render_project)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Store-backed wrapper: load all records, then filter in memory.
pub async fn search_store(pool: &SqlitePool, field: SearchField, query: &str) -> Result<String> {
    let records = store::list_projects(pool).await?;
    Ok(run_field_search(&records, field, query))
}
