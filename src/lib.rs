//! # Gitfolio
//!
//! A chat backend over a portfolio of GitHub projects.
//!
//! Gitfolio periodically lists a user's repositories, extracts structured
//! metadata (tech stack, features, links) from each README, persists the
//! results in SQLite, and answers natural-language questions by routing
//! them to deterministic field searches or an LLM tool-calling agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌─────────────┐   ┌──────────┐
//! │ GitHub  │──▶│ Fetch+Parse │──▶│  SQLite  │
//! │ API/raw │   │   READMEs   │   │ projects │
//! └─────────┘   └─────────────┘   └────┬─────┘
//!                                      │
//!                  ┌───────────────────┤
//!                  ▼                   ▼
//!            ┌──────────┐       ┌───────────┐
//!            │  Router  │──────▶│  Field    │
//!            │ (intents)│       │ searches  │
//!            └────┬─────┘       └───────────┘
//!                 ▼
//!            ┌──────────┐
//!            │   LLM    │
//!            │  agent   │
//!            └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`github`] | Repository listing and README fetch with backoff |
//! | [`readme`] | README section extraction |
//! | [`sync`] | Sync pass orchestration |
//! | [`store`] | Project record persistence |
//! | [`router`] | Rule-based intent classification |
//! | [`search`] | Deterministic field searches |
//! | [`agent`] | LLM fallback agent with tool dispatch |
//! | [`llm`] | Chat-completion provider |
//! | [`embedding`] | Description embeddings and vector helpers |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migration |

pub mod agent;
pub mod config;
pub mod db;
pub mod embedding;
pub mod github;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod readme;
pub mod router;
pub mod search;
pub mod server;
pub mod store;
pub mod sync;
