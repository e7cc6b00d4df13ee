//! Sync pass orchestration: listing → fetch → parse → persist.
//!
//! Each repository commits independently; a listing failure aborts the
//! pass but records already written stay written. The skip-if-unchanged
//! check avoids README fetches for repositories whose `updated_at` has
//! not moved since the last pass.

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{Config, EmbeddingConfig};
use crate::embedding;
use crate::github::{GithubClient, ReadmeSource};
use crate::models::{ProjectRecord, RepoSummary, NO_DESCRIPTION};
use crate::readme::parse_readme;
use crate::store;

/// Counters for one sync pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub updated: usize,
    pub skipped: usize,
    pub unparsed: usize,
}

/// Run one full sync pass against GitHub.
///
/// `full` bypasses the skip-if-unchanged check and clears previously
/// stored descriptive fields before re-setting them.
pub async fn run_sync_pass(config: &Config, pool: &SqlitePool, full: bool) -> Result<SyncReport> {
    let client = GithubClient::new(&config.github)?;
    let repos = client.list_repos().await?;
    info!(count = repos.len(), "retrieved repositories from GitHub");

    sync_repos(pool, &client, &config.embedding, &repos, full).await
}

/// Reconcile the given repository summaries against the store.
///
/// Split out from [`run_sync_pass`] so tests can substitute a stub
/// [`ReadmeSource`] and a fixed summary list.
pub async fn sync_repos(
    pool: &SqlitePool,
    source: &dyn ReadmeSource,
    embedding_config: &EmbeddingConfig,
    repos: &[RepoSummary],
    full: bool,
) -> Result<SyncReport> {
    let mut report = SyncReport {
        fetched: repos.len(),
        ..Default::default()
    };

    for repo in repos {
        // Skip-if-unchanged: no README fetch, no write.
        if !full {
            if let Some(stored) = store::updated_at_of(pool, &repo.name).await? {
                if stored == repo.updated_at {
                    info!(repo = %repo.name, "skipping (already up to date)");
                    report.skipped += 1;
                    continue;
                }
            }
        }

        let readme = source.fetch_readme(&repo.name).await;
        let fragment = parse_readme(readme.as_deref().unwrap_or(""));

        if fragment.is_empty() {
            // Prior record, if any, stays untouched.
            warn!(repo = %repo.name, "no structured README found");
            report.unparsed += 1;
            continue;
        }

        let description = fragment
            .description
            .or_else(|| repo.description.clone().filter(|d| !d.trim().is_empty()))
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        let embedding = embed_description(embedding_config, &repo.name, &description).await;

        let record = ProjectRecord {
            name: repo.name.clone(),
            project_name: fragment.project_name.unwrap_or_else(|| repo.name.clone()),
            description,
            tech_stack: fragment.tech_stack,
            features: fragment.features,
            demo_link: fragment.demo_link,
            devpost_link: fragment.devpost_link,
            html_url: repo.html_url.clone(),
            language: repo.language.clone(),
            created_at: repo.created_at.clone(),
            updated_at: repo.updated_at.clone(),
            embedding,
        };

        if full {
            store::clear_descriptive_fields(pool, &repo.name).await?;
        }
        store::upsert_project(pool, &record).await?;
        info!(repo = %repo.name, "updated project");
        report.updated += 1;
    }

    Ok(report)
}

/// Embedding is opportunistic: skipped for sentinel descriptions, and an
/// API failure stores the record without a vector rather than failing
/// the repository.
async fn embed_description(
    config: &EmbeddingConfig,
    repo: &str,
    description: &str,
) -> Option<Vec<f32>> {
    if !config.is_enabled() || description.is_empty() || description == NO_DESCRIPTION {
        return None;
    }

    match embedding::embed_text(config, description).await {
        Ok(vector) => Some(vector),
        Err(e) => {
            warn!(repo, error = %e, "embedding failed, storing without vector");
            None
        }
    }
}

/// Spawn the daily background refresh used by `serve`.
///
/// The task never aborts the server: a failed pass is logged and retried
/// at the next tick.
pub fn spawn_periodic_refresh(config: Arc<Config>, pool: SqlitePool) {
    let hours = config.server.refresh_interval_hours;
    if hours == 0 {
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(hours * 3600));
        // First tick fires immediately; skip it so startup stays fast.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match run_sync_pass(&config, &pool, false).await {
                Ok(report) => info!(?report, "scheduled sync pass finished"),
                Err(e) => error!(error = %e, "scheduled sync pass failed"),
            }
        }
    });
}
