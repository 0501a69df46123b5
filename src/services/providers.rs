// src/services/providers.rs
// DOCUMENTATION: Traits for the external collaborators of the pipeline
// PURPOSE: Let the paginator, classifier and orchestrator run against any backend

use crate::errors::DiscoveryError;
use crate::models::{Location, PlaceRecord, SearchFilters};
use async_trait::async_trait;

/// Resolves a free-text place name to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// One outbound call, no retry. No match is a `Resolution` error.
    async fn resolve(&self, name: &str) -> Result<Location, DiscoveryError>;
}

/// One request against a paginated nearby search
#[derive(Debug, Clone, PartialEq)]
pub enum PageRequest {
    /// Opening request carrying the location and every filter
    First {
        location: Location,
        filters: SearchFilters,
    },
    /// Follow-up request carrying only the opaque cursor, passed verbatim
    Next { cursor: String },
}

/// One page of nearby search results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NearbyPage {
    pub places: Vec<PlaceRecord>,
    /// Continuation cursor, present when the service has more results
    pub next_page_token: Option<String>,
}

/// Paginated nearby-places search
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn nearby_page(&self, request: &PageRequest) -> Result<NearbyPage, DiscoveryError>;
}

/// Free-text completion service, treated as `string -> string`
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Wait for client-side quota before a call. Not part of the call's time budget.
    async fn acquire(&self) {}

    async fn generate(&self, prompt: &str) -> Result<String, DiscoveryError>;
}
