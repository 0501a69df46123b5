// src/models/place.rs
// DOCUMENTATION: Core data structure for discovered places
// PURPOSE: Canonical record every classification result is reconciled against

use serde::{Deserialize, Serialize};

/// One place returned by the nearby search
/// DOCUMENTATION: Identity is `id` (service-assigned, opaque). `name` is for
/// display only and may repeat across distinct ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    /// Google Place ID
    pub id: String,

    /// Display name
    pub name: String,

    /// Service category tags (e.g., ["museum", "tourist_attraction"])
    #[serde(default)]
    pub types: Vec<String>,
}

impl PlaceRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            types: Vec::new(),
        }
    }

    pub fn with_types(mut self, types: Vec<String>) -> Self {
        self.types = types;
        self
    }
}

/// Compact place reference for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub id: String,
    pub name: String,
}

impl From<&PlaceRecord> for PlaceSummary {
    fn from(record: &PlaceRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
        }
    }
}
