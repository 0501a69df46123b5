// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for the discovery pipeline and its HTTP surface

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Covers both fatal pipeline failures (Resolution, Search) and the
/// adapter-level failures they are built from. Recoverable conditions are not errors;
/// they travel as `PipelineWarning` values next to a best-effort result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    /// The location name could not be turned into coordinates
    #[error("Could not resolve location '{0}'")]
    Resolution(String),

    /// The first page of the nearby search produced nothing usable
    #[error("Nearby search failed: {0}")]
    Search(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The continuation cursor was issued but is not yet accepted by the service
    #[error("Page token not ready")]
    CursorNotReady,

    /// A network call exceeded its time budget
    #[error("{0} timed out after {1:?}")]
    Timeout(String, Duration),

    #[error("Service not configured: {0}")]
    NotConfigured(String),
}

impl DiscoveryError {
    /// Whether the failed request is worth repeating after a pause
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DiscoveryError::RateLimitExceeded | DiscoveryError::CursorNotReady
        )
    }

    fn error_code(&self) -> &'static str {
        match self {
            DiscoveryError::Resolution(_) => "RESOLUTION_ERROR",
            DiscoveryError::Search(_) => "SEARCH_ERROR",
            DiscoveryError::InvalidInput(_) => "INVALID_INPUT",
            DiscoveryError::ValidationError(_) => "VALIDATION_ERROR",
            DiscoveryError::ExternalApiError(_) => "EXTERNAL_API_ERROR",
            DiscoveryError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            DiscoveryError::CursorNotReady => "CURSOR_NOT_READY",
            DiscoveryError::Timeout(_, _) => "TIMEOUT",
            DiscoveryError::NotConfigured(_) => "NOT_CONFIGURED",
        }
    }
}

/// Convert DiscoveryError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for DiscoveryError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            DiscoveryError::Resolution(_) => StatusCode::NOT_FOUND,
            DiscoveryError::Search(_) => StatusCode::BAD_GATEWAY,
            DiscoveryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DiscoveryError::ValidationError(_) => StatusCode::BAD_REQUEST,
            DiscoveryError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            DiscoveryError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            DiscoveryError::CursorNotReady => StatusCode::BAD_GATEWAY,
            DiscoveryError::Timeout(_, _) => StatusCode::GATEWAY_TIMEOUT,
            DiscoveryError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
