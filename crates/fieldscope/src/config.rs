//! Analyzer configuration and its resolution from the environment.
//!
//! Resolution order is explicit value (set by the caller after loading) →
//! environment → built-in default. Without service endpoints the analyzer
//! runs heuristics only.

use crate::reconcile::DEFAULT_MAX_REFINE_FIELDS;
use serde::{Deserialize, Serialize};

pub const ENV_INFERENCE_URL: &str = "FIELDSCOPE_INFERENCE_URL";
pub const ENV_REFINE_URL: &str = "FIELDSCOPE_REFINE_URL";
pub const ENV_API_KEY: &str = "FIELDSCOPE_API_KEY";
pub const ENV_INFERENCE_TIMEOUT_MS: &str = "FIELDSCOPE_INFERENCE_TIMEOUT_MS";
pub const ENV_REFINE_TIMEOUT_MS: &str = "FIELDSCOPE_REFINE_TIMEOUT_MS";
pub const ENV_FETCH_TIMEOUT_MS: &str = "FIELDSCOPE_FETCH_TIMEOUT_MS";

/// Settings for one [`Analyzer`](crate::analyzer::Analyzer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Endpoint of the inference service. `None` disables inference.
    pub inference_url: Option<String>,
    /// Endpoint of the name refinement service. `None` disables refinement.
    pub refine_url: Option<String>,
    /// Bearer token sent to both services.
    pub api_key: Option<String>,
    pub inference_timeout_ms: u64,
    pub refine_timeout_ms: u64,
    pub fetch_timeout_ms: u64,
    pub max_refine_fields: usize,
    /// Extra tag names the sanitizer drops besides scripts, styles and metadata.
    pub extra_strip_tags: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            inference_url: None,
            refine_url: None,
            api_key: None,
            inference_timeout_ms: 60_000,
            refine_timeout_ms: 20_000,
            fetch_timeout_ms: 15_000,
            max_refine_fields: DEFAULT_MAX_REFINE_FIELDS,
            extra_strip_tags: Vec::new(),
        }
    }
}

impl AnalyzerConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Overlay values produced by `lookup` (an environment accessor).
    ///
    /// Blank values are ignored; unparsable timeouts keep the current value.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_INFERENCE_URL) {
            self.inference_url = Some(url);
        }
        if let Some(url) = get(ENV_REFINE_URL) {
            self.refine_url = Some(url);
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(ms) = get(ENV_INFERENCE_TIMEOUT_MS).and_then(|v| v.parse().ok()) {
            self.inference_timeout_ms = ms;
        }
        if let Some(ms) = get(ENV_REFINE_TIMEOUT_MS).and_then(|v| v.parse().ok()) {
            self.refine_timeout_ms = ms;
        }
        if let Some(ms) = get(ENV_FETCH_TIMEOUT_MS).and_then(|v| v.parse().ok()) {
            self.fetch_timeout_ms = ms;
        }
        self
    }
}
