//! Core data models.
//!
//! These types represent the repository summaries arriving from the GitHub
//! listing API, the metadata fragments extracted from READMEs, and the
//! project records persisted in SQLite.

use serde::{Deserialize, Serialize};

/// Sentinel stored for a tech-stack category the README does not mention.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Sentinel stored when neither the README nor GitHub carries a description.
pub const NO_DESCRIPTION: &str = "No description available";

/// The five fixed tech-stack categories.
///
/// Every parsed record carries all five, defaulting to [`NOT_SPECIFIED`],
/// never a partial mapping. Serialized field names match the README bullet
/// labels (`Frontend`, `Backend`, ...) so stored JSON reads the same as the
/// source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStack {
    #[serde(rename = "Frontend")]
    pub frontend: String,
    #[serde(rename = "Backend")]
    pub backend: String,
    #[serde(rename = "Database")]
    pub database: String,
    #[serde(rename = "Hardware")]
    pub hardware: String,
    #[serde(rename = "Other Tools")]
    pub other_tools: String,
}

impl Default for TechStack {
    fn default() -> Self {
        Self {
            frontend: NOT_SPECIFIED.to_string(),
            backend: NOT_SPECIFIED.to_string(),
            database: NOT_SPECIFIED.to_string(),
            hardware: NOT_SPECIFIED.to_string(),
            other_tools: NOT_SPECIFIED.to_string(),
        }
    }
}

impl TechStack {
    /// True when no category was extracted from the README.
    pub fn is_default(&self) -> bool {
        self == &TechStack::default()
    }
}

/// One repository as returned by `GET /users/{username}/repos`.
///
/// Only the fields the sync pass mirrors into project records are
/// deserialized; everything else in the GitHub payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Metadata fragment extracted from a single README.
///
/// Only the fields derivable from the text are set.
/// The synchronizer merges in repository metadata before persisting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadmeFragment {
    pub project_name: Option<String>,
    pub description: Option<String>,
    pub tech_stack: TechStack,
    pub features: Vec<String>,
    pub demo_link: Option<String>,
    pub devpost_link: Option<String>,
}

impl ReadmeFragment {
    /// A fragment with nothing extracted must not be persisted.
    pub fn is_empty(&self) -> bool {
        self.project_name.is_none()
            && self.description.is_none()
            && self.features.is_empty()
            && self.demo_link.is_none()
            && self.devpost_link.is_none()
            && self.tech_stack.is_default()
    }
}

/// One persisted project, keyed uniquely by repository `name`.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRecord {
    /// Canonical repository identifier from the GitHub API.
    pub name: String,
    /// Human title from the README's first `#` heading; may differ from `name`.
    pub project_name: String,
    pub description: String,
    pub tech_stack: TechStack,
    pub features: Vec<String>,
    pub demo_link: Option<String>,
    pub devpost_link: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Plain f32 vector over `description`; absent when the description is
    /// empty or the sentinel, or when embeddings are disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}
