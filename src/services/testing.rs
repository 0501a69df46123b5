// src/services/testing.rs
// DOCUMENTATION: Scripted collaborators for tests
// PURPOSE: Deterministic stand-ins for the geocoder, places search and text generator

use crate::errors::DiscoveryError;
use crate::models::{Location, PlaceRecord};
use crate::services::providers::{Geocoder, NearbyPage, PageRequest, PlaceSearch, TextGenerator};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Build a page of `count` places with ids `{prefix}-{n}` starting at `start`
pub fn page(prefix: &str, start: usize, count: usize, next: Option<&str>) -> NearbyPage {
    NearbyPage {
        places: (start..start + count)
            .map(|n| PlaceRecord::new(format!("{}-{}", prefix, n), format!("Place {} {}", prefix, n)))
            .collect(),
        next_page_token: next.map(|s| s.to_string()),
    }
}

/// Geocoder returning a fixed outcome
pub struct StaticGeocoder {
    outcome: Result<Location, DiscoveryError>,
    delay: Duration,
}

impl StaticGeocoder {
    pub fn resolving(location: Location) -> Self {
        Self {
            outcome: Ok(location),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(err: DiscoveryError) -> Self {
        Self {
            outcome: Err(err),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn resolve(&self, _name: &str) -> Result<Location, DiscoveryError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}

/// Places search replaying a fixed sequence of page outcomes
/// DOCUMENTATION: Every request is recorded; once the script runs out each further
/// request fails, which surfaces pagination loops in tests
pub struct ScriptedPlaceSearch {
    pages: Mutex<VecDeque<Result<NearbyPage, DiscoveryError>>>,
    requests: Mutex<Vec<PageRequest>>,
    /// (1-based request number, delay) applied to that request and every later one
    slow_from: Option<(usize, Duration)>,
}

impl ScriptedPlaceSearch {
    pub fn new(pages: Vec<Result<NearbyPage, DiscoveryError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            requests: Mutex::new(Vec::new()),
            slow_from: None,
        }
    }

    /// Delay every request from the `request`-th one on
    pub fn with_delay_from(mut self, request: usize, delay: Duration) -> Self {
        self.slow_from = Some((request, delay));
        self
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaceSearch for ScriptedPlaceSearch {
    async fn nearby_page(&self, request: &PageRequest) -> Result<NearbyPage, DiscoveryError> {
        let number = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        if let Some((from, delay)) = self.slow_from {
            if number >= from {
                tokio::time::sleep(delay).await;
            }
        }

        self.pages.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(DiscoveryError::ExternalApiError(
                "script exhausted".to_string(),
            ))
        })
    }
}

/// Text generator keyed by preference label
/// DOCUMENTATION: Picks the response whose key appears quoted in the prompt,
/// falling back to the default response
pub struct ScriptedGenerator {
    responses: HashMap<String, Result<String, DiscoveryError>>,
    default_response: Result<String, DiscoveryError>,
    delay: Duration,
    quota_delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            responses: HashMap::new(),
            default_response: Ok(default_response.into()),
            delay: Duration::ZERO,
            quota_delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, preference: &str, response: impl Into<String>) -> Self {
        self.responses
            .insert(preference.to_string(), Ok(response.into()));
        self
    }

    pub fn with_failure(mut self, preference: &str, err: DiscoveryError) -> Self {
        self.responses.insert(preference.to_string(), Err(err));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Time spent in `acquire` before each call
    pub fn with_quota_delay(mut self, delay: Duration) -> Self {
        self.quota_delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn acquire(&self) {
        if !self.quota_delay.is_zero() {
            tokio::time::sleep(self.quota_delay).await;
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, DiscoveryError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.responses
            .iter()
            .find(|(preference, _)| prompt.contains(&format!("\"{}\"", preference)))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.default_response.clone())
    }
}
