//! Chat-completion provider.
//!
//! The language model is an opaque text-completion capability behind an
//! OpenAI-compatible API. Rate limits and server errors are retried with
//! the same doubling backoff as the GitHub fetcher; other client errors
//! fail fast and surface to the agent layer, which decides how to
//! degrade.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;

/// Source of chat completions.
///
/// Seam for the agent: production uses [`OpenAiClient`], tests
/// substitute a scripted stub.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// The OpenAI-compatible provider configured under `[llm]`.
pub struct OpenAiClient {
    config: LlmConfig,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        complete(&self.config, system, user).await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// True when the provider is enabled and its API key is present. Callers
/// use this to degrade to deterministic paths instead of erroring on a
/// missing key.
pub fn is_available(config: &LlmConfig) -> bool {
    config.is_enabled()
        && std::env::var("OPENAI_API_KEY")
            .map(|k| !k.is_empty())
            .unwrap_or(false)
}

/// Ask the configured model for a completion.
///
/// # Errors
///
/// Fails when the provider is disabled, the API key is missing, the API
/// rejects the request, or retries are exhausted; callers above decide
/// whether that degrades to another path.
pub async fn complete(config: &LlmConfig, system: &str, user: &str) -> Result<String> {
    if !config.is_enabled() {
        bail!("LLM provider is disabled");
    }

    let api_key =
        std::env::var("OPENAI_API_KEY").map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("failed to build LLM HTTP client")?;

    let body = ChatRequest {
        model: &config.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ],
    };

    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&api_key)
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let parsed: ChatResponse = response
                        .json()
                        .await
                        .context("failed to parse chat completion response")?;
                    return Ok(parsed
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.message.content)
                        .unwrap_or_default());
                }

                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!(
                        "Chat completion error {}: {}",
                        status,
                        body_text
                    ));
                    continue;
                }

                let body_text = response.text().await.unwrap_or_default();
                bail!("Chat completion error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Chat completion failed after retries")))
}
