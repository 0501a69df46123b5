// src/lib.rs
// DOCUMENTATION: Library root
// PURPOSE: Expose the discovery pipeline to the server binary and integration callers

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
