//! Fetches a remote form document as text.
//!
//! Not a browser, only plain HTTP requests. Handles redirects, timeouts,
//! retry on 5xx, and backoff on 429. Scripts on the fetched page are never
//! run; only the static markup is returned.

use crate::error::AnalysisError;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for `status`, if known.
    pub reason: String,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client used to fetch form documents.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with a standard Chrome user-agent.
    pub fn new(timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            max_retries: 2,
        }
    }

    /// Perform a GET request with retry on 5xx and backoff on 429.
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        let mut retries = 0u32;

        loop {
            match self.client.get(url).send().await {
                Ok(r) => {
                    let status = r.status().as_u16();

                    // Retry on 5xx
                    if status >= 500 && retries < self.max_retries {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        debug!(url, status, retries, "retrying after server error");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    // Backoff on 429
                    if status == 429 && retries < self.max_retries {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(2);
                        let delay = Duration::from_secs(retry_after.min(10));
                        debug!(url, retries, "rate limited; backing off");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    let final_url = r.url().to_string();
                    let reason = r
                        .status()
                        .canonical_reason()
                        .unwrap_or("Unknown status")
                        .to_string();
                    let body = r.text().await.unwrap_or_default();

                    return Ok(HttpResponse {
                        final_url,
                        status,
                        reason,
                        body,
                    });
                }
                Err(e) => {
                    if retries < self.max_retries {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }
}

/// Parse and check a user-supplied document address. Only `http` and
/// `https` are accepted.
pub fn validate_url(raw: &str) -> Result<Url, AnalysisError> {
    let parsed = Url::parse(raw.trim()).map_err(|_| AnalysisError::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(AnalysisError::InvalidUrl(raw.to_string())),
    }
}

/// Fetch the markup behind `url`.
///
/// Any failure here is surfaced to the caller; nothing downstream runs on
/// content that was not fetched.
pub async fn fetch_document(client: &HttpClient, url: &str) -> Result<String, AnalysisError> {
    let parsed = validate_url(url)?;

    let resp = client.get(parsed.as_str()).await.map_err(|e| {
        warn!(url, error = %e, "document fetch failed");
        AnalysisError::Fetch {
            status: None,
            reason: e.to_string(),
        }
    })?;

    if !resp.is_success() {
        warn!(url, status = resp.status, "document fetch returned non-success status");
        return Err(AnalysisError::Fetch {
            status: Some(resp.status),
            reason: resp.reason,
        });
    }

    debug!(url, final_url = %resp.final_url, bytes = resp.body.len(), "fetched document");
    Ok(resp.body)
}
