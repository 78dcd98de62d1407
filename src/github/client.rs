use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

pub const API_BASE: &str = "https://api.github.com";

/// Thin GitHub REST client that sleeps through rate limits.
///
/// On a 403 the client reads `X-RateLimit-Reset`, waits until the window
/// reopens (plus a small margin) and retries; every other non-success
/// status is an error.
pub struct GithubClient {
    client: reqwest::Client,
    token: String,
}

impl GithubClient {
    pub fn new(client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// GET an API path (e.g. `/users/octocat/repos`) and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{API_BASE}{path}");

        loop {
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", "oss-recommender")
                .query(params)
                .send()
                .await
                .with_context(|| format!("Failed to call GitHub API: {path}"))?;

            if resp.status() == StatusCode::FORBIDDEN {
                let wait_secs = rate_limit_wait_secs(&resp);
                tracing::warn!("GitHub rate limit hit for {path}, sleeping {wait_secs}s");
                tokio::time::sleep(std::time::Duration::from_secs(wait_secs)).await;
                continue;
            }

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("GitHub API returned {status} for {path}: {body}");
            }

            return resp
                .json()
                .await
                .with_context(|| format!("Failed to parse GitHub response for {path}"));
        }
    }
}

/// Seconds until the rate-limit window resets, with a 5s margin. Falls
/// back to 60s when the header is missing or unparseable.
fn rate_limit_wait_secs(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get("X-RateLimit-Reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .map(|reset| (reset - Utc::now().timestamp() + 5).max(1) as u64)
        .unwrap_or(60)
}
