//! HTTP server for the chat and vector-search endpoints.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/chat` | Route a chat message to search or the agent |
//! | `POST` | `/api/vector_search` | Rank stored projects by embedding similarity |
//! | `GET`  | `/` | Liveness message |
//!
//! # Error Contract
//!
//! Internal failures return HTTP 500 with `{ "detail": "<summary>" }`,
//! a summarized error string, never a backtrace. The process does not
//! crash on a failed request.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser-hosted
//! chat UI can call the API directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::agent;
use crate::config::Config;
use crate::embedding;
use crate::store;
use crate::sync;

/// Shared application state: config plus the process-wide store pool,
/// both opened once at startup.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
}

/// Start the HTTP server and the periodic background refresh.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config, pool: SqlitePool) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let config = Arc::new(config.clone());

    sync::spawn_periodic_refresh(config.clone(), pool.clone());

    let state = AppState { config, pool };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/api/chat", post(handle_chat))
        .route("/api/vector_search", post(handle_vector_search))
        .layer(cors)
        .with_state(state);

    info!("server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// 500 response body. `detail` is the error's display text, summarized.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.0.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError(err)
    }
}

// ============ GET / ============

#[derive(Serialize)]
struct RootResponse {
    message: String,
}

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: format!(
            "gitfolio {} is running. POST /api/chat to talk to it.",
            env!("CARGO_PKG_VERSION")
        ),
    })
}

// ============ POST /api/chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatReply {
    reply: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = agent::answer_query(&state.config, &state.pool, &request.message).await?;
    Ok(Json(ChatReply { reply }))
}

// ============ POST /api/vector_search ============

#[derive(Deserialize)]
struct VectorSearchRequest {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
}

fn default_top_k() -> usize {
    3
}

#[derive(Serialize)]
struct VectorSearchResponse {
    results: Vec<VectorHit>,
}

#[derive(Serialize)]
struct VectorHit {
    name: String,
    description: String,
    html_url: String,
}

/// Rank stored projects by cosine similarity between the query embedding
/// and each record's stored description embedding. Records without an
/// embedding are skipped.
async fn handle_vector_search(
    State(state): State<AppState>,
    Json(request): Json<VectorSearchRequest>,
) -> Result<Json<VectorSearchResponse>, AppError> {
    let query_vec = embedding::embed_text(&state.config.embedding, &request.query).await?;
    let records = store::list_projects(&state.pool).await?;

    let mut scored: Vec<(f32, VectorHit)> = records
        .into_iter()
        .filter_map(|record| {
            let vector = record.embedding.as_ref()?;
            let score = embedding::cosine_similarity(&query_vec, vector);
            Some((
                score,
                VectorHit {
                    name: record.name,
                    description: record.description,
                    html_url: record.html_url,
                },
            ))
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(request.top_k);

    Ok(Json(VectorSearchResponse {
        results: scored.into_iter().map(|(_, hit)| hit).collect(),
    }))
}
