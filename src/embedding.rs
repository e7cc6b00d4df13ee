//! Embedding support for project descriptions.
//!
//! The provider is treated as an opaque vector-producing capability:
//! `"openai"` calls the embeddings API with retry/backoff, `"disabled"`
//! (the default) fails fast. Vectors are plain `Vec<f32>` end to end and
//! are stored as little-endian BLOBs.
//!
//! Retry policy for the remote provider:
//! - HTTP 429 and 5xx → retry with exponential backoff (1s, 2s, 4s, ...)
//! - other 4xx → fail immediately
//! - network errors → retry

use anyhow::{bail, Result};
use std::time::Duration;

use crate::config::EmbeddingConfig;

/// Embed a single text using the configured provider.
pub async fn embed_text(config: &EmbeddingConfig, text: &str) -> Result<Vec<f32>> {
    let vector = match config.provider.as_str() {
        "openai" => embed_openai(config, text).await?,
        "disabled" => bail!("Embedding provider is disabled"),
        other => bail!("Unknown embedding provider: {}", other),
    };
    check_dims(&vector, config.dims)?;
    Ok(vector)
}

/// Reject vectors whose length disagrees with the configured `dims`.
/// A mismatch means the model was swapped without reindexing, so stored
/// and query vectors would no longer be comparable.
fn check_dims(vector: &[f32], dims: Option<usize>) -> Result<()> {
    match dims {
        Some(expected) if vector.len() != expected => bail!(
            "Embedding length {} does not match configured embedding.dims {}",
            vector.len(),
            expected
        ),
        _ => Ok(()),
    }
}

async fn embed_openai(config: &EmbeddingConfig, text: &str) -> Result<Vec<f32>> {
    let api_key =
        std::env::var("OPENAI_API_KEY").map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;
    let model = config
        .model
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("embedding.model required"))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({ "model": model, "input": [text] });
    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post("https://api.openai.com/v1/embeddings")
            .bearer_auth(&api_key)
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let json: serde_json::Value = response.json().await?;
                    return parse_embedding_response(&json);
                }

                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err =
                        Some(anyhow::anyhow!("Embeddings API error {}: {}", status, body_text));
                    continue;
                }

                let body_text = response.text().await.unwrap_or_default();
                bail!("Embeddings API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Embedding failed after retries")))
}

fn parse_embedding_response(json: &serde_json::Value) -> Result<Vec<f32>> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid embeddings response: missing data[0].embedding"))?;

    embedding
        .iter()
        .map(|v| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                anyhow::anyhow!("Invalid embeddings response: non-numeric vector entry")
            })
        })
        .collect()
}

/// Encode a float vector as little-endian f32 bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity in `[-1.0, 1.0]`; `0.0` for empty or
/// mismatched-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        let blob = vec_to_blob(&vec);
        assert_eq!(blob.len(), 20);
        assert_eq!(blob_to_vec(&blob), vec);
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_empty_or_mismatched() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_parse_embedding_response() {
        let json = serde_json::json!({
            "data": [{ "embedding": [0.25, -0.5, 1.0] }]
        });
        let vec = parse_embedding_response(&json).unwrap();
        assert_eq!(vec, vec![0.25f32, -0.5, 1.0]);
    }

    #[test]
    fn test_parse_embedding_response_missing_data() {
        let json = serde_json::json!({ "object": "list" });
        assert!(parse_embedding_response(&json).is_err());
    }

    #[test]
    fn test_parse_embedding_response_rejects_non_numeric_entries() {
        let json = serde_json::json!({
            "data": [{ "embedding": [0.25, "oops", 1.0] }]
        });
        assert!(parse_embedding_response(&json).is_err());
    }

    #[test]
    fn test_dims_mismatch_is_rejected() {
        assert!(check_dims(&[0.0; 3], Some(3)).is_ok());
        assert!(check_dims(&[0.0; 3], Some(1536)).is_err());
        // No configured dims means no constraint
        assert!(check_dims(&[0.0; 3], None).is_ok());
    }
}
