//! Inference backend client.
//!
//! Wraps the local generation endpoint (an Ollama-compatible HTTP API) and
//! routes a job's logical model identifier onto a concrete backend model.

use crate::consts::http::BACKEND_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Substring routes from logical model ids to backend model names. First
/// match wins; matching is case-insensitive.
const MODEL_ROUTES: &[(&str, &str)] = &[
    ("deepseek", "deepseek-r1:8b"),
    ("qwen", "qwen2.5:7b"),
];

/// Backend model used when no route matches.
const DEFAULT_MODEL: &str = "llama3.2";

/// Map a job's logical model identifier to the backend model name.
pub fn resolve_model(model_id: &str) -> &'static str {
    let id = model_id.to_ascii_lowercase();
    MODEL_ROUTES
        .iter()
        .find(|(keyword, _)| id.contains(keyword))
        .map(|(_, model)| *model)
        .unwrap_or(DEFAULT_MODEL)
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure reaching the backend.
    #[error("request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP error with status {status}: {message}")]
    Http { status: u16, message: String },
}

#[async_trait::async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Generate text for `prompt` on the named backend model. Synchronous
    /// from the caller's perspective; streaming is not used.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, BackendError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::ClientBuilder::new()
                .timeout(Duration::from_secs(BACKEND_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl InferenceBackend for BackendClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, BackendError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        let response = self.client.post(url).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response text".to_string());
            return Err(BackendError::Http { status, message });
        }
        let body: GenerateResponse = response.json().await?;
        Ok(body.response)
    }
}
