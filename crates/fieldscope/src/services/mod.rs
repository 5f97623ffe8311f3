//! External collaborator seams.
//!
//! Defines the [`InferenceService`] and [`NameRefiner`] traits that abstract
//! over the text-to-structure service used to cross-check the heuristic
//! parser and the service that improves generic field names. HTTP-backed
//! implementations live in [`http`]; the no-op implementations keep the
//! pipeline usable in heuristic-only mode.

pub mod http;

use crate::types::Field;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::{HttpInferenceService, HttpNameRefiner};

/// Produces candidate fields from sanitized markup.
///
/// The output is a guess: it may be empty and is never authoritative.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Infer an ordered list of fields from sanitized markup.
    async fn infer_fields(&self, markup: &str) -> Result<Vec<Field>>;
}

/// One still-ambiguous name handed to the refiner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementCandidate {
    /// Raw name as detected heuristically.
    pub original: String,
    /// Visible label text for the field, if available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Input of a single refinement call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementRequest {
    pub fields: Vec<RefinementCandidate>,
    /// Address the markup was fetched from; hints at the form's purpose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Replaces generic names with meaningful ones.
///
/// Returns names in input order. Shorter output is tolerated by callers.
#[async_trait]
pub trait NameRefiner: Send + Sync {
    async fn refine_names(&self, request: &RefinementRequest) -> Result<Vec<String>>;
}

/// Inference stand-in for heuristic-only mode: never guesses anything.
pub struct NoopInference;

#[async_trait]
impl InferenceService for NoopInference {
    async fn infer_fields(&self, _markup: &str) -> Result<Vec<Field>> {
        Ok(Vec::new())
    }
}

/// Refiner stand-in: returns no names, so generic names are kept.
pub struct NoopRefiner;

#[async_trait]
impl NameRefiner for NoopRefiner {
    async fn refine_names(&self, _request: &RefinementRequest) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
