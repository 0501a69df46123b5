// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod discovery;
pub mod location;
pub mod place;

pub use discovery::*;
pub use location::*;
pub use place::*;
