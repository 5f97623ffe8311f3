// Copyright 2026 Fieldscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fieldscope: discover the shape of a web form for synthetic test data.
//!
//! Raw markup is sanitized, parsed by ordered heuristics and reconciled with
//! the guesses of an external inference service into one deduplicated,
//! normalized field list.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod fetch;
pub mod heuristics;
pub mod parser;
pub mod reconcile;
pub mod sanitizer;
pub mod services;
pub mod types;

pub use analyzer::{AnalysisInput, Analyzer};
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, AnalysisResponse};
pub use parser::parse_fields;
pub use reconcile::reconcile;
pub use sanitizer::{sanitize, Sanitizer};
pub use services::{InferenceService, NameRefiner, RefinementCandidate, RefinementRequest};
pub use types::{DataType, DataTypeGroup, Field};
