// src/models/location.rs
// DOCUMENTATION: Resolved location and search filter types
// PURPOSE: Inputs shared by the geocoder, paginator and classifier

use serde::{Deserialize, Serialize};

/// A named place resolved to coordinates
/// DOCUMENTATION: Created once per pipeline run from geocoder output, never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Name as the caller supplied it
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// "lat,lng" as expected by the nearby search `location` parameter
    pub fn as_query_param(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Nearby search filters
/// DOCUMENTATION: Parameter bag for the first page of a nearby search.
/// Type and keyword are independent and both forwarded when set; the
/// places service combines them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Search radius in meters (max 50000)
    pub radius_m: u32,
    /// Place type filter (e.g., "tourist_attraction")
    pub place_type: Option<String>,
    /// Free-text keyword filter
    pub keyword: Option<String>,
    /// Result language code
    pub language: String,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            radius_m: 40000,
            place_type: Some("tourist_attraction".to_string()),
            keyword: None,
            language: "en".to_string(),
        }
    }
}
