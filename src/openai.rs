use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::profile::OutputFormat;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")] Http(String),
    #[error("{status} {message}")] Api { status: u16, message: String },
    #[error("malformed provider response: {0}")] Malformed(String),
}

/// Body of a single `images/generations` call. Unset optional fields are left
/// off the wire so the provider applies its own defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub n: u8,
    pub size: String,
    pub output_format: OutputFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_compression: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

/// The external image generator. Returns base64 payloads in provider order.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<String>, ProviderError>;
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl ImageProvider for OpenAiClient {
    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/images/generations", self.base_url);
        info!("🔗 Making request to: {} (model={}, n={}, size={})", url, request.model, request.n, request.size);
        debug!("📤 Prompt: {}", request.prompt);

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        let body = response.text().await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !status.is_success() {
            error!("❌ API Error response: {}", truncate(&body, 1000));
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let images = parse_images(&body)?;
        for (i, img) in images.iter().enumerate() {
            debug!("🖼️ Image {}: {}", i, preview(img));
        }
        Ok(images)
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope { error: ErrorDetail }

#[derive(Debug, Deserialize)]
struct ErrorDetail { message: String }

fn parse_images(body: &str) -> Result<Vec<String>, ProviderError> {
    let parsed: ImagesResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("parse error: {}", e)))?;

    parsed.data
        .into_iter()
        .enumerate()
        .map(|(i, d)| match d {
            ImageDatum { b64_json: Some(b64), .. } => Ok(b64),
            ImageDatum { url: Some(_), .. } => Err(ProviderError::Malformed(format!("image {} returned as url, not b64_json", i))),
            _ => Err(ProviderError::Malformed(format!("image {} has no b64_json", i))),
        })
        .collect()
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => env.error.message,
        Err(_) if body.trim().is_empty() => "(no body)".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn preview(data: &str) -> String {
    if data.len() > 50 {
        format!("{}...[{} chars total]", truncate(data, 50), data.len())
    } else {
        data.to_string()
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
