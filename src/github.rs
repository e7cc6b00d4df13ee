//! GitHub collaborators: repository listing and raw README retrieval.
//!
//! README fetches never raise to the caller: a missing README (no root
//! `README.md`, different default branch, deleted repo) is an expected
//! `None`, not an error. Rate-limit responses are retried with a doubling
//! backoff up to a fixed ceiling, then degrade to `None` with a warning.
//!
//! The listing call is different: a failure there aborts the whole sync
//! pass, so it surfaces as an error.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::warn;

use crate::config::GithubConfig;
use crate::models::RepoSummary;

const API_HOST: &str = "https://api.github.com";
const RAW_HOST: &str = "https://raw.githubusercontent.com";

/// Source of raw README text, keyed by repository name.
///
/// Seam for the synchronizer: production uses [`GithubClient`], tests
/// substitute a stub.
#[async_trait]
pub trait ReadmeSource: Send + Sync {
    /// Raw README text, or `None` when the repository has none reachable.
    async fn fetch_readme(&self, repo: &str) -> Option<String>;
}

pub struct GithubClient {
    client: reqwest::Client,
    username: String,
    branch: String,
    token: Option<String>,
    max_retries: u32,
    base_delay: Duration,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gitfolio/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build GitHub HTTP client")?;

        // Token is optional: without it, calls hit the lower rate limit.
        let token = std::env::var(&config.token_env).ok().filter(|t| !t.is_empty());

        Ok(Self {
            client,
            username: config.username.clone(),
            branch: config.branch.clone(),
            token,
            max_retries: config.max_retries,
            base_delay: Duration::from_secs(config.base_delay_secs),
        })
    }

    /// List the user's repositories.
    ///
    /// Errors (including rate limiting after the request, which is not
    /// retried here) abort the calling sync pass.
    pub async fn list_repos(&self) -> Result<Vec<RepoSummary>> {
        let url = format!("{}/users/{}/repos?per_page=100", API_HOST, self.username);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("GitHub listing call failed")?;
        let status = response.status();

        if is_rate_limited(status) {
            bail!("GitHub API rate limit exceeded. Try again later.");
        }
        if !status.is_success() {
            bail!("Failed to list GitHub repositories: status {}", status);
        }

        let repos: Vec<RepoSummary> = response
            .json()
            .await
            .context("failed to decode GitHub repository listing")?;

        Ok(repos)
    }
}

#[async_trait]
impl ReadmeSource for GithubClient {
    async fn fetch_readme(&self, repo: &str) -> Option<String> {
        let url = format!(
            "{}/{}/{}/{}/README.md",
            RAW_HOST, self.username, repo, self.branch
        );

        let attempts = attempt_budget(self.max_retries);
        for attempt in 0..attempts {
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    return response.text().await.ok();
                }
                Ok(response) if is_rate_limited(response.status()) => {
                    // No point sleeping after the last attempt.
                    if attempt + 1 == attempts {
                        break;
                    }
                    let delay = backoff_delay(self.base_delay, attempt);
                    warn!(repo, ?delay, "rate limited fetching README, retrying");
                    tokio::time::sleep(delay).await;
                }
                // Any other status means no README at this path
                Ok(_) => return None,
                Err(e) => {
                    warn!(repo, error = %e, "README fetch failed");
                    return None;
                }
            }
        }

        warn!(repo, "giving up on README after retries");
        None
    }
}

/// GitHub signals rate limiting as 403 on the raw host and 429 on the API.
pub fn is_rate_limited(status: StatusCode) -> bool {
    status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS
}

/// Doubling backoff: base, base*2, base*4, ...
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.pow(attempt.min(5))
}

/// At least one request is always issued, whatever `max_retries` says.
pub fn attempt_budget(max_retries: u32) -> u32 {
    max_retries.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_statuses() {
        assert!(is_rate_limited(StatusCode::FORBIDDEN));
        assert!(is_rate_limited(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_rate_limited(StatusCode::NOT_FOUND));
        assert!(!is_rate_limited(StatusCode::OK));
    }

    #[test]
    fn zero_retries_still_means_one_attempt() {
        assert_eq!(attempt_budget(0), 1);
        assert_eq!(attempt_budget(1), 1);
        assert_eq!(attempt_budget(3), 3);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 0), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(4));
        // Capped so cumulative wait stays bounded
        assert_eq!(backoff_delay(base, 9), Duration::from_secs(32));
    }
}
