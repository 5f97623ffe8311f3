//! JSON-over-HTTP clients for the inference and refinement services.
//!
//! Both services speak the same minimal protocol: one `POST` with a JSON
//! body, one JSON object back. A non-success status becomes an error whose
//! message carries only the status and the response body, so upstream
//! callers can recognise size-limit rejections from the text. The endpoint
//! stays out of the message; its query string may hold anything.

use super::{InferenceService, NameRefiner, RefinementRequest};
use crate::types::{DataType, Field};
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    #[serde(rename = "htmlContent")]
    html_content: &'a str,
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    fields: Vec<FieldGuess>,
}

/// One guessed field as sent by the service. The data type stays a string
/// so a single unknown value does not reject the whole response.
#[derive(Debug, Deserialize)]
struct FieldGuess {
    #[serde(rename = "fieldName", default)]
    field_name: String,
    #[serde(rename = "dataType", default)]
    data_type: String,
}

#[derive(Debug, Deserialize)]
struct RefinementResponse {
    #[serde(default)]
    refined: Vec<String>,
}

fn build_client(timeout_ms: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .unwrap_or_default()
}

async fn post_json<B, R>(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: Option<&str>,
    body: &B,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut builder = client.post(endpoint).json(body);
    if let Some(key) = api_key {
        builder = builder.bearer_auth(key);
    }

    let resp = builder.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        bail!("service returned {status}: {text}");
    }
    Ok(resp.json::<R>().await?)
}

/// Inference service reached over HTTP.
#[derive(Clone)]
pub struct HttpInferenceService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpInferenceService {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout_ms: u64) -> Self {
        Self {
            client: build_client(timeout_ms),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl InferenceService for HttpInferenceService {
    async fn infer_fields(&self, markup: &str) -> Result<Vec<Field>> {
        let request = InferenceRequest {
            html_content: markup,
        };
        let response: InferenceResponse =
            post_json(&self.client, &self.endpoint, self.api_key.as_deref(), &request).await?;

        let mut fields = Vec::with_capacity(response.fields.len());
        for guess in response.fields {
            match guess.data_type.parse::<DataType>() {
                Ok(data_type) if !guess.field_name.trim().is_empty() => {
                    fields.push(Field::new(guess.field_name, data_type));
                }
                Ok(_) => warn!("inference returned a field without a name; dropped"),
                Err(e) => warn!(field = %guess.field_name, error = %e, "dropped inferred field"),
            }
        }
        debug!(count = fields.len(), "inference service answered");
        Ok(fields)
    }
}

/// Name refinement service reached over HTTP.
#[derive(Clone)]
pub struct HttpNameRefiner {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpNameRefiner {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout_ms: u64) -> Self {
        Self {
            client: build_client(timeout_ms),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl NameRefiner for HttpNameRefiner {
    async fn refine_names(&self, request: &RefinementRequest) -> Result<Vec<String>> {
        let response: RefinementResponse =
            post_json(&self.client, &self.endpoint, self.api_key.as_deref(), request).await?;
        debug!(count = response.refined.len(), "refinement service answered");
        Ok(response.refined)
    }
}
