// src/services/gemini_client.rs
// DOCUMENTATION: Google Gemini text generation client
// PURPOSE: Send classification prompts and return the raw completion text

use crate::errors::DiscoveryError;
use crate::services::providers::TextGenerator;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

/// Gemini generateContent client
/// DOCUMENTATION: Calls are throttled client-side to the configured requests per minute,
/// so concurrent classification workers cannot exceed the account quota. The quota is
/// taken in `acquire`; `generate_content` alone does not wait.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response from generateContent
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        Some(text)
    }
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        requests_per_minute: u32,
        timeout: Duration,
    ) -> Result<Self, DiscoveryError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            DiscoveryError::NotConfigured(format!("Failed to create HTTP client: {}", e))
        })?;

        let quota = Quota::per_minute(
            NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            client,
            api_key,
            model,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            limiter: RateLimiter::direct(quota),
        })
    }

    /// Point the client at a different host (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Wait until the per-minute quota admits another call
    pub async fn wait_for_quota(&self) {
        if self.limiter.check().is_err() {
            log::debug!("Gemini quota exhausted, waiting");
            self.limiter.until_ready().await;
        }
    }

    /// Generate a completion for a single-turn prompt
    pub async fn generate_content(&self, prompt: &str) -> Result<String, DiscoveryError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        log::debug!("Gemini request: model={}, prompt_len={}", self.model, prompt.len());

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log::error!("Gemini request failed: {}", e);
                DiscoveryError::ExternalApiError(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            log::warn!("Gemini quota exceeded");
            return Err(DiscoveryError::RateLimitExceeded);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Gemini API error {}: {}", status, body);
            return Err(DiscoveryError::ExternalApiError(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            log::error!("Failed to parse Gemini response: {}", e);
            DiscoveryError::ExternalApiError(format!("Parse error: {}", e))
        })?;

        let block_reason = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone());

        parsed.into_text().ok_or_else(|| {
            let reason = block_reason.unwrap_or_else(|| "no candidates".to_string());
            log::warn!("Gemini returned no completion: {}", reason);
            DiscoveryError::ExternalApiError(format!("No completion: {}", reason))
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn acquire(&self) {
        self.wait_for_quota().await;
    }

    async fn generate(&self, prompt: &str) -> Result<String, DiscoveryError> {
        self.generate_content(prompt).await
    }
}
