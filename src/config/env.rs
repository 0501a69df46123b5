// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use dotenv::dotenv;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup and hand it to the pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1")
    pub server_address: String,

    /// Server listen port (default 8003)
    pub server_port: u16,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Google Places API Key
    pub google_places_api_key: String,

    /// Gemini API key for preference classification
    pub gemini_api_key: String,

    /// Gemini model name (e.g., "gemini-1.5-flash")
    pub gemini_model: String,

    /// Gemini call quota, requests per minute
    pub gemini_requests_per_minute: u32,

    /// Base URL of the Nominatim geocoder
    pub nominatim_url: String,

    /// User-Agent sent to Nominatim (required by its usage policy)
    pub nominatim_user_agent: String,

    /// Default nearby search radius in meters (max 50000)
    pub search_radius_m: u32,

    /// Default place type filter, empty for none
    pub search_place_type: Option<String>,

    /// Default keyword filter, empty for none
    pub search_keyword: Option<String>,

    /// Result language code
    pub search_language: String,

    /// Hard cap on nearby search pages (Google serves at most 3)
    pub max_search_pages: u32,

    /// Delay before a continuation token becomes usable, in milliseconds
    pub page_delay_ms: u64,

    /// Retries for a page rejected with a rate-limit or not-ready cursor
    pub max_page_retries: u32,

    /// Per-call timeout in seconds
    pub request_timeout_secs: u64,

    /// Concurrent classification calls
    pub classification_workers: usize,

    /// Places requested per preference
    pub top_n: usize,

    /// Preferences classified when a request names none
    pub default_preferences: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenv().ok();

        Config {
            server_address: env::var("SERVER_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()),

            server_port: parse_var("SERVER_PORT", 8003),

            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            google_places_api_key: env::var("GOOGLE_PLACES_API_KEY")
                .unwrap_or_else(|_| String::new()),

            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_else(|_| String::new()),

            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),

            gemini_requests_per_minute: parse_var("GEMINI_REQUESTS_PER_MINUTE", 15),

            nominatim_url: env::var("NOMINATIM_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),

            nominatim_user_agent: env::var("NOMINATIM_USER_AGENT")
                .unwrap_or_else(|_| format!("tripquick/{}", env!("CARGO_PKG_VERSION"))),

            search_radius_m: parse_var("SEARCH_RADIUS_M", 40000),

            search_place_type: optional_var("SEARCH_PLACE_TYPE")
                .or_else(|| Some("tourist_attraction".to_string())),

            search_keyword: optional_var("SEARCH_KEYWORD"),

            search_language: env::var("SEARCH_LANGUAGE").unwrap_or_else(|_| "en".to_string()),

            max_search_pages: parse_var("MAX_SEARCH_PAGES", 3),

            page_delay_ms: parse_var("PAGE_DELAY_MS", 2000),

            max_page_retries: parse_var("MAX_PAGE_RETRIES", 2),

            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 30),

            classification_workers: parse_var("CLASSIFICATION_WORKERS", 4),

            top_n: parse_var("TOP_N", 10),

            default_preferences: env::var("DEFAULT_PREFERENCES")
                .map(|raw| split_list(&raw))
                .unwrap_or_else(|_| {
                    ["food", "must sees", "nature", "entertainment"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect()
                }),
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures the pipeline can run safely
    pub fn validate(&self) -> Result<(), String> {
        if self.google_places_api_key.is_empty() {
            return Err("GOOGLE_PLACES_API_KEY is required".to_string());
        }

        if self.gemini_api_key.is_empty() {
            return Err("GEMINI_API_KEY is required".to_string());
        }

        if self.search_radius_m == 0 || self.search_radius_m > 50000 {
            return Err("SEARCH_RADIUS_M must be between 1 and 50000".to_string());
        }

        if self.max_search_pages == 0 {
            return Err("MAX_SEARCH_PAGES must be at least 1".to_string());
        }

        if self.classification_workers == 0 {
            return Err("CLASSIFICATION_WORKERS must be at least 1".to_string());
        }

        if self.top_n == 0 {
            return Err("TOP_N must be at least 1".to_string());
        }

        if self.default_preferences.is_empty() {
            log::warn!("DEFAULT_PREFERENCES is empty - requests must name preferences");
        }

        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a comma-separated setting, dropping blanks
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1".to_string(),
        server_port: 8003,
        environment: "test".to_string(),
        log_level: "debug".to_string(),
        google_places_api_key: "places-key".to_string(),
        gemini_api_key: "gemini-key".to_string(),
        gemini_model: "gemini-1.5-flash".to_string(),
        gemini_requests_per_minute: 60,
        nominatim_url: "http://localhost".to_string(),
        nominatim_user_agent: "tripquick-tests".to_string(),
        search_radius_m: 40000,
        search_place_type: Some("tourist_attraction".to_string()),
        search_keyword: None,
        search_language: "en".to_string(),
        max_search_pages: 3,
        page_delay_ms: 0,
        max_page_retries: 2,
        request_timeout_secs: 5,
        classification_workers: 2,
        top_n: 10,
        default_preferences: vec!["food".to_string(), "nature".to_string()],
    }
}
