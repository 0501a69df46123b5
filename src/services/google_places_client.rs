// src/services/google_places_client.rs
// DOCUMENTATION: Google Places API client
// PURPOSE: Fetch single pages of nearby search results for the paginator

use crate::errors::DiscoveryError;
use crate::models::PlaceRecord;
use crate::services::providers::{NearbyPage, PageRequest, PlaceSearch};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Google Places API client
/// DOCUMENTATION: Handles authentication and API calls to Google Places
pub struct GooglePlacesClient {
    /// HTTP client for making requests
    client: Client,
    /// Google Places API key
    api_key: String,
    /// Base URL for Google Places API
    base_url: String,
    /// Per-request timeout
    timeout: Duration,
}

/// Response from Google Places Nearby Search
/// DOCUMENTATION: Parsed response from Google Places API
#[derive(Debug, Deserialize, Serialize)]
pub struct GooglePlacesResponse {
    /// Results array from API
    #[serde(default)]
    pub results: Vec<GooglePlace>,
    /// Status of the API call
    pub status: String,
    /// Next page token (if more results available)
    pub next_page_token: Option<String>,
    /// Error message (if status is not OK)
    pub error_message: Option<String>,
}

/// Individual place from Google Places API
/// DOCUMENTATION: Only the fields the pipeline reads; the rest of the payload is ignored
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GooglePlace {
    /// Google's unique place identifier
    pub place_id: String,
    /// Place name
    pub name: String,
    /// Place types array (e.g., ["museum", "tourist_attraction", "point_of_interest"])
    #[serde(default)]
    pub types: Vec<String>,
    /// Vicinity (short address)
    pub vicinity: Option<String>,
    /// Rating (0-5)
    pub rating: Option<f32>,
    /// Number of user ratings
    pub user_ratings_total: Option<i32>,
}

impl GooglePlacesClient {
    /// Create new Google Places API client
    /// DOCUMENTATION: Initializes client with API key and a per-request timeout
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, DiscoveryError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            DiscoveryError::NotConfigured(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            timeout,
        })
    }

    /// Point the client at a different host (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Perform one nearby search request
    /// DOCUMENTATION: First pages carry location and filters; follow-up pages carry
    /// only the page token, because Google keeps the original filters server-side.
    ///
    /// # Arguments
    /// * `request` - First page (location + filters) or continuation cursor
    ///
    /// # Returns
    /// The page's places and the next page token, if any
    pub async fn nearby_search(&self, request: &PageRequest) -> Result<NearbyPage, DiscoveryError> {
        let url = format!("{}/nearbysearch/json", self.base_url);

        let mut params = HashMap::new();
        params.insert("key", self.api_key.clone());

        match request {
            PageRequest::First { location, filters } => {
                params.insert("location", location.as_query_param());
                params.insert("radius", filters.radius_m.to_string());
                params.insert("language", filters.language.clone());

                if let Some(pt) = &filters.place_type {
                    params.insert("type", pt.clone());
                }

                if let Some(kw) = &filters.keyword {
                    params.insert("keyword", kw.clone());
                }

                log::debug!(
                    "Google Places nearby search: lat={}, lng={}, radius={}",
                    location.latitude,
                    location.longitude,
                    filters.radius_m
                );
            }
            PageRequest::Next { cursor } => {
                params.insert("pagetoken", cursor.clone());
                log::debug!("Google Places nearby search: next page");
            }
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                log::error!("Google Places API request failed: {}", e);
                if e.is_timeout() {
                    DiscoveryError::Timeout("nearby search".to_string(), self.timeout)
                } else {
                    DiscoveryError::ExternalApiError(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Google Places API error {}: {}", status, body);
            return Err(DiscoveryError::ExternalApiError(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let api_response: GooglePlacesResponse = response.json().await.map_err(|e| {
            log::error!("Failed to parse Google Places response: {}", e);
            DiscoveryError::ExternalApiError(format!("Parse error: {}", e))
        })?;

        Self::interpret(api_response, matches!(request, PageRequest::Next { .. }))
    }

    /// Map an API status to a page or an error
    /// DOCUMENTATION: INVALID_REQUEST on a page token request means the token has not
    /// propagated yet, which the paginator retries after a pause
    fn interpret(
        api_response: GooglePlacesResponse,
        is_continuation: bool,
    ) -> Result<NearbyPage, DiscoveryError> {
        match api_response.status.as_str() {
            "OK" | "ZERO_RESULTS" => {
                log::info!(
                    "Google Places search returned {} results",
                    api_response.results.len()
                );
                Ok(NearbyPage {
                    places: api_response
                        .results
                        .iter()
                        .map(Self::to_place_record)
                        .collect(),
                    next_page_token: api_response
                        .next_page_token
                        .filter(|token| !token.is_empty()),
                })
            }
            "OVER_QUERY_LIMIT" => {
                log::warn!("Google Places API quota exceeded");
                Err(DiscoveryError::RateLimitExceeded)
            }
            "INVALID_REQUEST" if is_continuation => {
                log::debug!("Google Places page token not ready yet");
                Err(DiscoveryError::CursorNotReady)
            }
            "REQUEST_DENIED" | "INVALID_REQUEST" => {
                let msg = api_response
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_string());
                log::error!("Google Places API request denied: {}", msg);
                Err(DiscoveryError::ExternalApiError(msg))
            }
            other => {
                let msg = api_response
                    .error_message
                    .unwrap_or_else(|| format!("Unknown status: {}", other));
                log::error!("Google Places API unexpected status: {}", msg);
                Err(DiscoveryError::ExternalApiError(msg))
            }
        }
    }

    /// Convert GooglePlace to the canonical PlaceRecord
    /// DOCUMENTATION: Generic Google tags carry no category signal and are dropped
    pub fn to_place_record(google_place: &GooglePlace) -> PlaceRecord {
        let types = google_place
            .types
            .iter()
            .filter(|t| *t != "point_of_interest" && *t != "establishment")
            .cloned()
            .collect();

        PlaceRecord::new(google_place.place_id.clone(), google_place.name.clone())
            .with_types(types)
    }
}

#[async_trait]
impl PlaceSearch for GooglePlacesClient {
    async fn nearby_page(&self, request: &PageRequest) -> Result<NearbyPage, DiscoveryError> {
        self.nearby_search(request).await
    }
}
