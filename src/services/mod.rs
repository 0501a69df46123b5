// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod candidate_store;
pub mod classifier;
pub mod gemini_client;
pub mod google_places_client;
pub mod nominatim_client;
pub mod paginator;
pub mod pipeline;
pub mod providers;

#[cfg(test)]
pub mod testing;

pub use candidate_store::*;
pub use classifier::*;
pub use gemini_client::*;
pub use google_places_client::*;
pub use nominatim_client::*;
pub use paginator::*;
pub use pipeline::*;
pub use providers::*;
