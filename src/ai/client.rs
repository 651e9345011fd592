//! Gemini API client module
//!
//! Encapsulates the `generateContent` call used to summarize a transcript.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::core::config::{
    AppConfig, DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL, DEFAULT_HTTP_TIMEOUT_SECS,
};
use crate::errors::DigestError;
use crate::prompt::{MAX_TRANSCRIPT_CHARS, build_prompt};

/// Anything that can turn a transcript into a summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Returns the summary text, or a failure describing what went wrong.
    /// Implementations must not panic on transport or payload problems.
    async fn summarize(&self, transcript: &str) -> Result<String, DigestError>;
}

/// Builds the JSON body for `generateContent`.
#[must_use]
pub fn build_request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            { "parts": [ { "text": prompt } ] }
        ]
    })
}

/// Pulls `candidates[0].content.parts[0].text` out of a success response.
pub fn extract_summary_text(response: &Value) -> Result<String, DigestError> {
    let text = response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| DigestError::ApiError {
            status: None,
            message: "No text in response".to_string(),
        })?;

    if text.trim().is_empty() {
        return Err(DigestError::ApiError {
            status: None,
            message: "Response contained an empty summary".to_string(),
        });
    }

    Ok(text.to_string())
}

/// Turns a non-success response into an error carrying the upstream status and
/// message. Falls back to the raw body when it is not the usual error envelope.
#[must_use]
pub fn upstream_error(status: u16, body: &str) -> DigestError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "Unknown error".to_string()
            } else {
                trimmed.to_string()
            }
        });

    DigestError::ApiError {
        status: Some(status),
        message,
    }
}

/// Client for the hosted Gemini text-generation endpoint
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model_name: String,
    api_base: String,
}

impl GeminiClient {
    #[must_use]
    pub fn new(api_key: String, model_name: String) -> Self {
        Self {
            http: build_http_client(DEFAULT_HTTP_TIMEOUT_SECS),
            api_key,
            model_name,
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            http: build_http_client(config.http_timeout_secs),
            api_key: config.gemini_api_key.clone(),
            model_name: config.gemini_model.clone(),
            api_base: config.gemini_api_base.clone(),
        }
    }

    /// Points the client at another deployment of the same API.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http = build_http_client(timeout_secs);
        self
    }

    /// `<base>/models/<model>:generateContent?key=<api key>`
    pub fn endpoint(&self) -> Result<Url, DigestError> {
        let model = if self.model_name.trim().is_empty() {
            DEFAULT_GEMINI_MODEL
        } else {
            self.model_name.trim()
        };
        let raw = format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            model
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| DigestError::ConfigError(format!("invalid Gemini API base: {e}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Summarizes `transcript`, keeping only its most recent
    /// [`MAX_TRANSCRIPT_CHARS`] characters.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::HttpError`] when the request cannot be sent and
    /// [`DigestError::ApiError`] for non-success statuses or unusable payloads.
    pub async fn generate_summary(&self, transcript: &str) -> Result<String, DigestError> {
        let prompt = build_prompt(transcript);

        #[cfg(feature = "debug-logs")]
        info!(
            "Using Gemini prompt (transcript limit {}):\n{}",
            MAX_TRANSCRIPT_CHARS, prompt
        );

        #[cfg(not(feature = "debug-logs"))]
        info!(
            "Requesting summary from {} for {} transcript chars (limit {})",
            self.model_name,
            transcript.chars().count(),
            MAX_TRANSCRIPT_CHARS
        );

        let url = self.endpoint()?;
        let response = self
            .http
            .post(url)
            .json(&build_request_body(&prompt))
            .send()
            .await
            // The request URL embeds the API key; keep it out of the message.
            .map_err(|e| {
                DigestError::HttpError(format!("Gemini API request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let err = upstream_error(status.as_u16(), &body);
            warn!("Gemini API returned {}: {}", status, err);
            return Err(err);
        }

        let response_json: Value = response.json().await.map_err(|e| DigestError::ApiError {
            status: Some(status.as_u16()),
            message: format!("Failed to parse Gemini response: {}", e.without_url()),
        })?;

        extract_summary_text(&response_json)
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, transcript: &str) -> Result<String, DigestError> {
        self.generate_summary(transcript).await
    }
}

fn build_http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}
