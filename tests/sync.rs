use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sqlx::SqlitePool;
use tempfile::TempDir;

use gitfolio::config::{Config, EmbeddingConfig};
use gitfolio::github::ReadmeSource;
use gitfolio::models::{RepoSummary, NOT_SPECIFIED, NO_DESCRIPTION};
use gitfolio::search::{self, SearchField};
use gitfolio::{db, migrate, store, sync};

/// README source backed by a fixed map, counting fetches so tests can
/// assert the skip-if-unchanged rule avoids network calls.
struct StubSource {
    readmes: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl StubSource {
    fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            readmes: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fetches: AtomicUsize::new(0),
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReadmeSource for StubSource {
    async fn fetch_readme(&self, repo: &str) -> Option<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.readmes.get(repo).cloned()
    }
}

fn summary(name: &str, updated_at: &str) -> RepoSummary {
    RepoSummary {
        name: name.to_string(),
        html_url: format!("https://github.com/user/{}", name),
        description: None,
        language: Some("Python".to_string()),
        created_at: Some("2024-01-01T00:00:00Z".to_string()),
        updated_at: Some(updated_at.to_string()),
    }
}

async fn test_pool(tmp: &TempDir) -> SqlitePool {
    let config_path = tmp.path().join("gitfolio.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"[db]
path = "{}/gitfolio.sqlite"

[github]
username = "user"

[server]
bind = "127.0.0.1:8104"
"#,
            tmp.path().display()
        ),
    )
    .unwrap();

    let cfg: Config = gitfolio::config::load_config(&config_path).unwrap();
    let pool = db::connect(&cfg).await.unwrap();
    migrate::run_migrations(&pool).await.unwrap();
    pool
}

fn disabled_embeddings() -> EmbeddingConfig {
    EmbeddingConfig::default()
}

const MEDICS_README: &str = "\
# Digital Medics
## Description
A system for healthcare alerts.
## Tech Stack
- **Frontend:** React
- **Backend:** Flask, Python
## Features
- Real-time alerts
- SMS notifications
";

#[tokio::test]
async fn sync_creates_records_from_readmes() {
    let tmp = TempDir::new().unwrap();
    let pool = test_pool(&tmp).await;
    let source = StubSource::new(&[("medics", MEDICS_README)]);

    let report = sync::sync_repos(
        &pool,
        &source,
        &disabled_embeddings(),
        &[summary("medics", "T1")],
        false,
    )
    .await
    .unwrap();

    assert_eq!(report.updated, 1);

    let record = store::get_project(&pool, "medics").await.unwrap().unwrap();
    assert_eq!(record.project_name, "Digital Medics");
    assert_eq!(record.description, "A system for healthcare alerts.");
    assert_eq!(record.tech_stack.frontend, "React");
    assert_eq!(record.tech_stack.backend, "Flask, Python");
    assert_eq!(record.tech_stack.database, NOT_SPECIFIED);
    assert_eq!(
        record.features,
        vec!["Real-time alerts", "SMS notifications"]
    );
    assert_eq!(record.html_url, "https://github.com/user/medics");
    assert_eq!(record.updated_at.as_deref(), Some("T1"));
    assert!(record.embedding.is_none());
}

#[tokio::test]
async fn unchanged_updated_at_skips_fetch_and_write() {
    let tmp = TempDir::new().unwrap();
    let pool = test_pool(&tmp).await;
    let source = StubSource::new(&[("medics", MEDICS_README)]);
    let repos = [summary("medics", "T1")];

    let first = sync::sync_repos(&pool, &source, &disabled_embeddings(), &repos, false)
        .await
        .unwrap();
    assert_eq!(first.updated, 1);
    assert_eq!(source.fetch_count(), 1);

    // Same updated_at: no README fetch, no write.
    let second = sync::sync_repos(&pool, &source, &disabled_embeddings(), &repos, false)
        .await
        .unwrap();
    assert_eq!(second.skipped, 1);
    assert_eq!(second.updated, 0);
    assert_eq!(source.fetch_count(), 1);

    let record = store::get_project(&pool, "medics").await.unwrap().unwrap();
    assert_eq!(record.tech_stack.frontend, "React");
}

#[tokio::test]
async fn full_refresh_clears_fields_removed_from_readme() {
    let tmp = TempDir::new().unwrap();
    let pool = test_pool(&tmp).await;

    let source = StubSource::new(&[("medics", MEDICS_README)]);
    sync::sync_repos(
        &pool,
        &source,
        &disabled_embeddings(),
        &[summary("medics", "T1")],
        false,
    )
    .await
    .unwrap();

    // Refreshed README dropped the Frontend line.
    let refreshed = "\
# Digital Medics
## Description
A system for healthcare alerts.
## Tech Stack
- **Backend:** Flask, Python
";
    let source = StubSource::new(&[("medics", refreshed)]);
    sync::sync_repos(
        &pool,
        &source,
        &disabled_embeddings(),
        &[summary("medics", "T2")],
        true,
    )
    .await
    .unwrap();

    let record = store::get_project(&pool, "medics").await.unwrap().unwrap();
    assert_eq!(record.tech_stack.frontend, NOT_SPECIFIED);
    assert_eq!(record.tech_stack.backend, "Flask, Python");
    assert!(record.features.is_empty());
}

#[tokio::test]
async fn unparseable_readme_leaves_prior_record_untouched() {
    let tmp = TempDir::new().unwrap();
    let pool = test_pool(&tmp).await;

    let source = StubSource::new(&[("medics", MEDICS_README)]);
    sync::sync_repos(
        &pool,
        &source,
        &disabled_embeddings(),
        &[summary("medics", "T1")],
        false,
    )
    .await
    .unwrap();

    // README replaced by unstructured prose: warn and skip persistence.
    let source = StubSource::new(&[("medics", "nothing recognizable here")]);
    let report = sync::sync_repos(
        &pool,
        &source,
        &disabled_embeddings(),
        &[summary("medics", "T2")],
        false,
    )
    .await
    .unwrap();
    assert_eq!(report.unparsed, 1);
    assert_eq!(report.updated, 0);

    let record = store::get_project(&pool, "medics").await.unwrap().unwrap();
    assert_eq!(record.project_name, "Digital Medics");
    assert_eq!(record.updated_at.as_deref(), Some("T1"));
}

#[tokio::test]
async fn missing_readme_creates_no_record() {
    let tmp = TempDir::new().unwrap();
    let pool = test_pool(&tmp).await;
    let source = StubSource::new(&[]);

    let report = sync::sync_repos(
        &pool,
        &source,
        &disabled_embeddings(),
        &[summary("ghost", "T1")],
        false,
    )
    .await
    .unwrap();

    assert_eq!(report.unparsed, 1);
    assert!(store::get_project(&pool, "ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn description_falls_back_to_github_summary_then_sentinel() {
    let tmp = TempDir::new().unwrap();
    let pool = test_pool(&tmp).await;

    // README has a title but no Description section.
    let source = StubSource::new(&[("alpha", "# Alpha\n"), ("beta", "# Beta\n")]);
    let mut with_summary = summary("alpha", "T1");
    with_summary.description = Some("Summary from GitHub".to_string());
    let without_summary = summary("beta", "T1");

    sync::sync_repos(
        &pool,
        &source,
        &disabled_embeddings(),
        &[with_summary, without_summary],
        false,
    )
    .await
    .unwrap();

    let alpha = store::get_project(&pool, "alpha").await.unwrap().unwrap();
    assert_eq!(alpha.description, "Summary from GitHub");

    let beta = store::get_project(&pool, "beta").await.unwrap().unwrap();
    assert_eq!(beta.description, NO_DESCRIPTION);
}

#[tokio::test]
async fn store_roundtrips_structured_fields_and_embedding() {
    let tmp = TempDir::new().unwrap();
    let pool = test_pool(&tmp).await;

    let source = StubSource::new(&[("medics", MEDICS_README)]);
    sync::sync_repos(
        &pool,
        &source,
        &disabled_embeddings(),
        &[summary("medics", "T1")],
        false,
    )
    .await
    .unwrap();

    let mut record = store::get_project(&pool, "medics").await.unwrap().unwrap();
    record.embedding = Some(vec![0.5, -1.25, 3.0]);
    store::upsert_project(&pool, &record).await.unwrap();

    let restored = store::get_project(&pool, "medics").await.unwrap().unwrap();
    assert_eq!(restored.embedding, Some(vec![0.5, -1.25, 3.0]));
    assert_eq!(restored.tech_stack, record.tech_stack);
    assert_eq!(restored.features, record.features);
}

#[tokio::test]
async fn backend_search_finds_synced_project() {
    let tmp = TempDir::new().unwrap();
    let pool = test_pool(&tmp).await;

    let source = StubSource::new(&[("medics", MEDICS_README)]);
    sync::sync_repos(
        &pool,
        &source,
        &disabled_embeddings(),
        &[summary("medics", "T1")],
        false,
    )
    .await
    .unwrap();

    let reply = search::search_store(&pool, SearchField::Backend, "flask")
        .await
        .unwrap();
    assert!(reply.contains("Digital Medics"));

    let miss = search::search_store(&pool, SearchField::Backend, "rails")
        .await
        .unwrap();
    assert_eq!(miss, "No matching backend projects found for: rails.");
}
