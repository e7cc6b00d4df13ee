//! Persistence for project records.
//!
//! All writes are single-row upserts keyed by repository `name`, so no
//! locking beyond SQLite's own guarantees is needed. Structured fields
//! round-trip through JSON columns; embeddings through f32 BLOBs.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

use crate::embedding::{blob_to_vec, vec_to_blob};
use crate::models::{ProjectRecord, TechStack};

/// Insert or replace the record with the same `name`.
pub async fn upsert_project(pool: &SqlitePool, record: &ProjectRecord) -> Result<()> {
    let tech_stack = serde_json::to_string(&record.tech_stack)?;
    let features = serde_json::to_string(&record.features)?;
    let embedding = record.embedding.as_ref().map(|v| vec_to_blob(v));

    sqlx::query(
        r#"
        INSERT INTO projects (name, project_name, description, tech_stack, features,
                              demo_link, devpost_link, html_url, language,
                              created_at, updated_at, embedding)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            project_name = excluded.project_name,
            description = excluded.description,
            tech_stack = excluded.tech_stack,
            features = excluded.features,
            demo_link = excluded.demo_link,
            devpost_link = excluded.devpost_link,
            html_url = excluded.html_url,
            language = excluded.language,
            created_at = excluded.created_at,
            updated_at = excluded.updated_at,
            embedding = excluded.embedding
        "#,
    )
    .bind(&record.name)
    .bind(&record.project_name)
    .bind(&record.description)
    .bind(&tech_stack)
    .bind(&features)
    .bind(&record.demo_link)
    .bind(&record.devpost_link)
    .bind(&record.html_url)
    .bind(&record.language)
    .bind(&record.created_at)
    .bind(&record.updated_at)
    .bind(embedding)
    .execute(pool)
    .await?;

    Ok(())
}

/// The stored `updated_at` for a repository, used for the
/// skip-if-unchanged check. `None` when no record exists.
pub async fn updated_at_of(pool: &SqlitePool, name: &str) -> Result<Option<Option<String>>> {
    let row = sqlx::query("SELECT updated_at FROM projects WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.get("updated_at")))
}

/// Reset descriptive fields to their parse defaults ahead of a full
/// refresh, so values removed from a README do not linger as stale data.
pub async fn clear_descriptive_fields(pool: &SqlitePool, name: &str) -> Result<()> {
    let defaults = serde_json::to_string(&TechStack::default())?;

    sqlx::query(
        r#"
        UPDATE projects
        SET description = '', tech_stack = ?, features = '[]',
            demo_link = NULL, devpost_link = NULL
        WHERE name = ?
        "#,
    )
    .bind(&defaults)
    .bind(name)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_project(pool: &SqlitePool, name: &str) -> Result<Option<ProjectRecord>> {
    let row = sqlx::query("SELECT * FROM projects WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    row.map(|r| record_from_row(&r)).transpose()
}

/// Every stored record, ordered by name for deterministic output.
pub async fn list_projects(pool: &SqlitePool) -> Result<Vec<ProjectRecord>> {
    let rows = sqlx::query("SELECT * FROM projects ORDER BY name")
        .fetch_all(pool)
        .await?;

    rows.iter().map(record_from_row).collect()
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProjectRecord> {
    let tech_stack: String = row.get("tech_stack");
    let features: String = row.get("features");
    let embedding: Option<Vec<u8>> = row.get("embedding");

    Ok(ProjectRecord {
        name: row.get("name"),
        project_name: row.get("project_name"),
        description: row.get("description"),
        tech_stack: serde_json::from_str(&tech_stack).context("corrupt tech_stack column")?,
        features: serde_json::from_str(&features).context("corrupt features column")?,
        demo_link: row.get("demo_link"),
        devpost_link: row.get("devpost_link"),
        html_url: row.get("html_url"),
        language: row.get("language"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        embedding: embedding.map(|b| blob_to_vec(&b)),
    })
}
