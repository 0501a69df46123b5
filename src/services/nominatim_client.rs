// src/services/nominatim_client.rs
// DOCUMENTATION: OpenStreetMap Nominatim geocoding client
// PURPOSE: Resolve a free-text place name to coordinates

use crate::errors::DiscoveryError;
use crate::models::Location;
use crate::services::providers::Geocoder;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Nominatim search client
/// DOCUMENTATION: Nominatim's usage policy requires an identifying User-Agent,
/// which is set once on the underlying HTTP client
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

/// One match from /search?format=json
/// DOCUMENTATION: Nominatim returns coordinates as strings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NominatimPlace {
    pub place_id: Option<u64>,
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

impl NominatimClient {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, DiscoveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                DiscoveryError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Look up the best match for a place name
    /// DOCUMENTATION: Any failure (transport, HTTP status, parse, no match) is reported
    /// as a resolution error because nothing downstream can run without coordinates
    pub async fn geocode(&self, name: &str) -> Result<Location, DiscoveryError> {
        let query = name.trim();
        if query.is_empty() {
            return Err(DiscoveryError::InvalidInput(
                "Location name must not be empty".to_string(),
            ));
        }

        let url = format!("{}/search", self.base_url);

        log::debug!("Nominatim lookup: q={}", query);

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                log::error!("Nominatim request failed: {}", e);
                DiscoveryError::Resolution(format!("{}: request failed: {}", query, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            log::error!("Nominatim error {} for '{}'", status, query);
            return Err(DiscoveryError::Resolution(format!(
                "{}: geocoder returned {}",
                query, status
            )));
        }

        let matches: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            log::error!("Failed to parse Nominatim response: {}", e);
            DiscoveryError::Resolution(format!("{}: parse error: {}", query, e))
        })?;

        let best = matches.into_iter().next().ok_or_else(|| {
            log::warn!("Nominatim returned no match for '{}'", query);
            DiscoveryError::Resolution(query.to_string())
        })?;

        let location = Self::to_location(query, &best)?;

        log::info!(
            "Resolved '{}' to ({}, {}) [{}]",
            query,
            location.latitude,
            location.longitude,
            best.display_name
        );

        Ok(location)
    }

    fn to_location(query: &str, place: &NominatimPlace) -> Result<Location, DiscoveryError> {
        let latitude: f64 = place.lat.trim().parse().map_err(|_| {
            DiscoveryError::Resolution(format!("{}: invalid latitude '{}'", query, place.lat))
        })?;
        let longitude: f64 = place.lon.trim().parse().map_err(|_| {
            DiscoveryError::Resolution(format!("{}: invalid longitude '{}'", query, place.lon))
        })?;

        Ok(Location::new(query, latitude, longitude))
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn resolve(&self, name: &str) -> Result<Location, DiscoveryError> {
        self.geocode(name).await
    }
}
