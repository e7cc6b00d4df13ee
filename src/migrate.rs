use anyhow::Result;
use sqlx::SqlitePool;

/// One row per repository, keyed by `name`. Structured fields
/// (tech_stack, features) are stored as JSON text; the embedding as a
/// little-endian f32 BLOB.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            name TEXT PRIMARY KEY,
            project_name TEXT NOT NULL,
            description TEXT NOT NULL,
            tech_stack TEXT NOT NULL,
            features TEXT NOT NULL,
            demo_link TEXT,
            devpost_link TEXT,
            html_url TEXT NOT NULL,
            language TEXT,
            created_at TEXT,
            updated_at TEXT,
            embedding BLOB
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_projects_updated_at ON projects(updated_at)")
        .execute(pool)
        .await?;

    Ok(())
}
