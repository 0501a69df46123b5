// src/models/discovery.rs
// DOCUMENTATION: Classification results, warnings and discover API DTOs
// PURPOSE: Shapes flowing out of the pipeline and across the HTTP boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use super::{Location, PlaceSummary};

/// Places judged relevant to one preference category
/// DOCUMENTATION: `places` holds unique candidate ids in the order the model ranked
/// them. Every id is guaranteed to exist in the candidate set it was reconciled against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceResult {
    pub preference: String,
    pub places: Vec<String>,
}

impl PreferenceResult {
    pub fn empty(preference: impl Into<String>) -> Self {
        Self {
            preference: preference.into(),
            places: Vec::new(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.places.iter().any(|p| p == id)
    }
}

/// Recoverable condition collected alongside a best-effort result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// Pagination stopped early; candidates cover only the pages fetched
    PartialResults { pages_fetched: u32, reason: String },
    /// One preference degraded to an empty result
    Classification { preference: String, reason: String },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::PartialResults {
                pages_fetched,
                reason,
            } => write!(
                f,
                "partial results after {} page(s): {}",
                pages_fetched, reason
            ),
            PipelineWarning::Classification { preference, reason } => {
                write!(f, "classification of '{}' degraded: {}", preference, reason)
            }
        }
    }
}

/// Whether a run's output can be treated as authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Complete,
    Partial,
}

/// Request body for POST /attractions/discover
/// DOCUMENTATION: Omitted fields fall back to configured defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DiscoverRequest {
    /// Place name to search around (e.g., "Toronto")
    #[validate(length(min = 1, max = 200))]
    pub location: String,

    /// Search radius in meters
    #[validate(range(min = 1, max = 50000))]
    pub radius_m: Option<u32>,

    /// Place type filter
    #[validate(length(min = 1, max = 64))]
    pub place_type: Option<String>,

    /// Keyword filter
    #[validate(length(min = 1, max = 128))]
    pub keyword: Option<String>,

    /// Result language code
    #[validate(length(min = 2, max = 10))]
    pub language: Option<String>,

    /// Preference categories to classify
    #[validate(length(min = 1, max = 12))]
    pub preferences: Option<Vec<String>>,
}

/// Response body for POST /attractions/discover
/// DOCUMENTATION: Ids are resolved back to display names; `status` and `warnings`
/// tell consumers whether the data is complete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub run_id: Uuid,
    pub location: Location,
    pub status: ResultStatus,
    pub pages_fetched: u32,
    pub candidate_count: usize,
    /// preference -> ranked places
    pub preferences: BTreeMap<String, Vec<PlaceSummary>>,
    pub candidates: Vec<PlaceSummary>,
    pub warnings: Vec<PipelineWarning>,
    pub generated_at: DateTime<Utc>,
}
