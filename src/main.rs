//! # Gitfolio CLI
//!
//! ```bash
//! gitfolio --config ./config/gitfolio.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gitfolio init` | Create the SQLite database and schema |
//! | `gitfolio sync` | Run one sync pass against GitHub |
//! | `gitfolio search "<query>"` | Run a field search from the terminal |
//! | `gitfolio chat "<message>"` | One-shot routed chat query |
//! | `gitfolio serve` | Start the HTTP server with periodic refresh |

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use gitfolio::search::SearchField;
use gitfolio::{agent, config, db, migrate, search, server, sync};

/// Gitfolio: a chat backend over a GitHub project portfolio.
#[derive(Parser)]
#[command(
    name = "gitfolio",
    about = "Chat backend over a GitHub portfolio: README metadata extraction, field search, and an LLM fallback agent",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/gitfolio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Run one sync pass: list repositories, fetch and parse READMEs,
    /// upsert project records.
    Sync {
        /// Ignore the skip-if-unchanged check and clear stored
        /// descriptive fields before re-setting them.
        #[arg(long)]
        full: bool,
    },

    /// Run a deterministic field search against stored projects.
    Search {
        /// The search query.
        query: String,

        /// Field to search: keyword, frontend, backend, database, hardware.
        #[arg(long, default_value = "keyword")]
        field: String,
    },

    /// Route a single chat message and print the reply.
    Chat {
        /// The chat message.
        message: String,
    },

    /// Start the HTTP server (chat + vector search endpoints).
    Serve,
}

fn parse_field(name: &str) -> anyhow::Result<SearchField> {
    Ok(match name {
        "keyword" => SearchField::Keyword,
        "frontend" => SearchField::Frontend,
        "backend" => SearchField::Backend,
        "database" => SearchField::Database,
        "hardware" => SearchField::Hardware,
        other => bail!(
            "Unknown search field: '{}'. Use keyword, frontend, backend, database, or hardware.",
            other
        ),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let pool = db::connect(&cfg).await?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&pool).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sync { full } => {
            let report = sync::run_sync_pass(&cfg, &pool, full).await?;
            println!("sync");
            println!("  repositories: {}", report.fetched);
            println!("  updated: {}", report.updated);
            println!("  skipped (up to date): {}", report.skipped);
            println!("  no structured README: {}", report.unparsed);
            println!("ok");
        }
        Commands::Search { query, field } => {
            let field = parse_field(&field)?;
            let reply = search::search_store(&pool, field, &query).await?;
            println!("{}", reply);
        }
        Commands::Chat { message } => {
            let reply = agent::answer_query(&cfg, &pool, &message).await?;
            println!("{}", reply);
        }
        Commands::Serve => {
            migrate::run_migrations(&pool).await?;
            server::run_server(&cfg, pool.clone()).await?;
        }
    }

    pool.close().await;
    Ok(())
}
