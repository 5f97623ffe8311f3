//! The analysis pipeline for one request.
//!
//! fetch (optional) → sanitize → { inference ∥ heuristic parse } → reconcile.
//!
//! Inference and parsing run concurrently; reconciliation waits for both.
//! Nothing is shared between requests except the immutable collaborators,
//! so one [`Analyzer`] can serve any number of concurrent calls.

use crate::config::AnalyzerConfig;
use crate::error::{is_size_limit_error, AnalysisError};
use crate::fetch::{fetch_document, HttpClient};
use crate::parser::parse_fields;
use crate::reconcile::{reconcile, ReconcileOptions};
use crate::sanitizer::Sanitizer;
use crate::services::{
    HttpInferenceService, HttpNameRefiner, InferenceService, NameRefiner, NoopInference,
    NoopRefiner,
};
use crate::types::Field;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisInput {
    /// Markup supplied directly.
    Markup(String),
    /// Address of a document to fetch first.
    Url(String),
}

impl AnalysisInput {
    /// Pick the input from optional markup and URL. The URL wins when both
    /// are present.
    pub fn from_parts(markup: Option<String>, url: Option<String>) -> Result<Self, AnalysisError> {
        let url = url.filter(|u| !u.trim().is_empty());
        let markup = markup.filter(|m| !m.trim().is_empty());
        match (markup, url) {
            (_, Some(url)) => Ok(AnalysisInput::Url(url)),
            (Some(markup), None) => Ok(AnalysisInput::Markup(markup)),
            (None, None) => Err(AnalysisError::EmptyInput),
        }
    }
}

/// Runs the detection and reconciliation pipeline.
#[derive(Clone)]
pub struct Analyzer {
    inference: Arc<dyn InferenceService>,
    refiner: Arc<dyn NameRefiner>,
    http: HttpClient,
    sanitizer: Sanitizer,
    inference_timeout: Duration,
    reconcile: ReconcileOptions,
}

impl Analyzer {
    /// Build an analyzer around explicit collaborators.
    pub fn new(
        inference: Arc<dyn InferenceService>,
        refiner: Arc<dyn NameRefiner>,
        config: &AnalyzerConfig,
    ) -> Self {
        Self {
            inference,
            refiner,
            http: HttpClient::new(config.fetch_timeout_ms),
            sanitizer: Sanitizer::with_extra_tags(&config.extra_strip_tags),
            inference_timeout: Duration::from_millis(config.inference_timeout_ms),
            reconcile: ReconcileOptions {
                source_url: None,
                refine_timeout: Duration::from_millis(config.refine_timeout_ms),
                max_refine_fields: config.max_refine_fields,
            },
        }
    }

    /// Build an analyzer whose collaborators follow the configured endpoints.
    ///
    /// Missing endpoints fall back to no-op collaborators (heuristics only).
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let inference: Arc<dyn InferenceService> = match &config.inference_url {
            Some(url) => Arc::new(HttpInferenceService::new(
                url.clone(),
                config.api_key.clone(),
                config.inference_timeout_ms,
            )),
            None => Arc::new(NoopInference),
        };
        let refiner: Arc<dyn NameRefiner> = match &config.refine_url {
            Some(url) => Arc::new(HttpNameRefiner::new(
                url.clone(),
                config.api_key.clone(),
                config.refine_timeout_ms,
            )),
            None => Arc::new(NoopRefiner),
        };
        Self::new(inference, refiner, config)
    }

    /// Analyze markup or a remote document.
    pub async fn analyze(&self, input: AnalysisInput) -> Result<Vec<Field>, AnalysisError> {
        match input {
            AnalysisInput::Markup(markup) => self.analyze_markup(&markup, None).await,
            AnalysisInput::Url(url) => {
                let markup = fetch_document(&self.http, &url).await?;
                self.analyze_markup(&markup, Some(&url)).await
            }
        }
    }

    /// Analyze markup; `source_url` is only a hint for name refinement.
    pub async fn analyze_markup(
        &self,
        markup: &str,
        source_url: Option<&str>,
    ) -> Result<Vec<Field>, AnalysisError> {
        if markup.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let sanitized = self.sanitizer.sanitize(markup);
        debug!(raw = markup.len(), sanitized = sanitized.len(), "sanitized markup");

        let raw = markup.to_string();
        let parse = tokio::task::spawn_blocking(move || parse_fields(&raw));
        let infer = tokio::time::timeout(self.inference_timeout, self.inference.infer_fields(&sanitized));
        let (parsed, inferred) = tokio::join!(parse, infer);

        let inferred = match inferred {
            Ok(Ok(fields)) => fields,
            Ok(Err(e)) => {
                let message = format!("{e:#}");
                if is_size_limit_error(&message) {
                    warn!(error = %message, "inference rejected input as too large");
                    return Err(AnalysisError::ContentTooLarge);
                }
                warn!(error = %message, "inference failed; continuing with heuristics");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.inference_timeout.as_millis() as u64,
                    "inference timed out; continuing with heuristics"
                );
                Vec::new()
            }
        };

        let heuristic = match parsed {
            Ok(fields) => fields,
            Err(e) if inferred.is_empty() => {
                return Err(AnalysisError::Analysis(e.to_string()));
            }
            Err(e) => {
                warn!(error = %e, "heuristic parse aborted; using inferred fields only");
                Vec::new()
            }
        };

        debug!(inferred = inferred.len(), heuristic = heuristic.len(), "candidates ready");

        let options = ReconcileOptions {
            source_url: source_url.map(String::from),
            ..self.reconcile.clone()
        };
        let fields = reconcile(inferred, heuristic, self.refiner.as_ref(), &options).await;

        if fields.is_empty() {
            return Err(AnalysisError::NoFieldsDetected);
        }
        info!(count = fields.len(), "form analysis complete");
        Ok(fields)
    }
}
