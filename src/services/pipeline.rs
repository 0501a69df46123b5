// src/services/pipeline.rs
// DOCUMENTATION: Attraction discovery pipeline
// PURPOSE: Orchestrate geocoding, paginated search and per-preference classification

use crate::config::Config;
use crate::errors::DiscoveryError;
use crate::models::{
    DiscoverRequest, DiscoveryResponse, Location, PipelineWarning, PlaceSummary,
    PreferenceResult, ResultStatus, SearchFilters,
};
use crate::services::candidate_store::CandidateSet;
use crate::services::classifier::{Classification, PreferenceClassifier};
use crate::services::gemini_client::GeminiClient;
use crate::services::google_places_client::GooglePlacesClient;
use crate::services::nominatim_client::NominatimClient;
use crate::services::paginator::{PaginationSettings, PlaceSearchPaginator};
use crate::services::providers::{Geocoder, PlaceSearch, TextGenerator};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Pipeline settings
/// DOCUMENTATION: Derived from Config once at startup; see PipelineSettings::from_config
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub pagination: PaginationSettings,
    /// Time budget for the geocoding call and each classification call
    pub request_timeout: Duration,
    /// Concurrent classification calls
    pub classification_workers: usize,
    /// Places requested per preference
    pub top_n: usize,
    /// Filters applied when a request leaves them out
    pub default_filters: SearchFilters,
    /// Preferences classified when a request names none
    pub default_preferences: Vec<String>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);

        Self {
            pagination: PaginationSettings {
                max_pages: config.max_search_pages,
                page_delay: Duration::from_millis(config.page_delay_ms),
                max_retries: config.max_page_retries,
                request_timeout,
            },
            request_timeout,
            classification_workers: config.classification_workers,
            top_n: config.top_n,
            default_filters: SearchFilters {
                radius_m: config.search_radius_m,
                place_type: config.search_place_type.clone(),
                keyword: config.search_keyword.clone(),
                language: config.search_language.clone(),
            },
            default_preferences: config.default_preferences.clone(),
        }
    }
}

/// One discovery run's input
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryQuery {
    pub location: String,
    pub filters: SearchFilters,
    pub preferences: Vec<String>,
}

/// Discovery run output
/// DOCUMENTATION: Carries the frozen candidate set so callers can resolve ids back to
/// names, plus every recoverable warning raised during the run
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    pub run_id: Uuid,
    pub location: Location,
    pub candidates: Arc<CandidateSet>,
    /// preference -> result
    pub preferences: BTreeMap<String, PreferenceResult>,
    pub pages_fetched: u32,
    pub warnings: Vec<PipelineWarning>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl DiscoveryReport {
    /// Complete only when no warning was raised
    pub fn status(&self) -> ResultStatus {
        if self.warnings.is_empty() {
            ResultStatus::Complete
        } else {
            ResultStatus::Partial
        }
    }

    /// Ids per preference
    pub fn mapping(&self) -> BTreeMap<&str, &[String]> {
        self.preferences
            .iter()
            .map(|(preference, result)| (preference.as_str(), result.places.as_slice()))
            .collect()
    }

    /// Convert into the API response, resolving ids to names
    pub fn to_response(&self) -> DiscoveryResponse {
        let preferences = self
            .preferences
            .iter()
            .map(|(preference, result)| {
                let places = result
                    .places
                    .iter()
                    .filter_map(|id| self.candidates.get(id))
                    .map(PlaceSummary::from)
                    .collect();
                (preference.clone(), places)
            })
            .collect();

        DiscoveryResponse {
            run_id: self.run_id,
            location: self.location.clone(),
            status: self.status(),
            pages_fetched: self.pages_fetched,
            candidate_count: self.candidates.len(),
            preferences,
            candidates: self.candidates.all().iter().map(PlaceSummary::from).collect(),
            warnings: self.warnings.clone(),
            generated_at: self.completed_at,
        }
    }
}

/// Discovery pipeline
/// DOCUMENTATION: Geocoder → paginator → frozen candidate set → classifier per preference.
/// Only a failed geocode or a failed first search page abort a run; everything
/// downstream degrades per preference.
pub struct DiscoveryPipeline {
    geocoder: Arc<dyn Geocoder>,
    paginator: PlaceSearchPaginator,
    classifier: PreferenceClassifier,
    settings: PipelineSettings,
}

impl DiscoveryPipeline {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        search: Arc<dyn PlaceSearch>,
        generator: Arc<dyn TextGenerator>,
        settings: PipelineSettings,
    ) -> Self {
        let paginator = PlaceSearchPaginator::new(search, settings.pagination.clone());
        let classifier =
            PreferenceClassifier::new(generator, settings.top_n, settings.request_timeout);

        Self {
            geocoder,
            paginator,
            classifier,
            settings,
        }
    }

    /// Build the pipeline against the live Nominatim, Google Places and Gemini services
    pub fn from_config(config: &Config) -> Result<Self, DiscoveryError> {
        let settings = PipelineSettings::from_config(config);
        let timeout = settings.request_timeout;

        let geocoder = NominatimClient::new(
            config.nominatim_url.clone(),
            &config.nominatim_user_agent,
            timeout,
        )?;
        let search = GooglePlacesClient::new(config.google_places_api_key.clone(), timeout)?;
        let generator = GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_requests_per_minute,
            timeout,
        )?;

        Ok(Self::new(
            Arc::new(geocoder),
            Arc::new(search),
            Arc::new(generator),
            settings,
        ))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Fill a request's missing fields from the configured defaults
    pub fn query_from_request(&self, request: DiscoverRequest) -> DiscoveryQuery {
        let defaults = &self.settings.default_filters;

        DiscoveryQuery {
            location: request.location,
            filters: SearchFilters {
                radius_m: request.radius_m.unwrap_or(defaults.radius_m),
                place_type: request.place_type.or_else(|| defaults.place_type.clone()),
                keyword: request.keyword.or_else(|| defaults.keyword.clone()),
                language: request
                    .language
                    .unwrap_or_else(|| defaults.language.clone()),
            },
            preferences: request
                .preferences
                .unwrap_or_else(|| self.settings.default_preferences.clone()),
        }
    }

    /// Run discovery for one location
    ///
    /// # Arguments
    /// * `query` - Location name, search filters and preference labels
    ///
    /// # Returns
    /// A report whose status is `partial` when any warning was raised, or a fatal
    /// `Resolution` / `Search` error
    pub async fn discover(&self, query: &DiscoveryQuery) -> Result<DiscoveryReport, DiscoveryError> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();

        let name = query.location.trim();
        if name.is_empty() {
            return Err(DiscoveryError::InvalidInput(
                "Location name must not be empty".to_string(),
            ));
        }

        let preferences = normalize_preferences(&query.preferences);

        log::info!(
            "[{}] Starting discovery for '{}' ({} preference(s))",
            run_id,
            name,
            preferences.len()
        );

        // 1. Resolve the location
        let location = self.resolve(name).await?;

        // 2. Collect candidates
        let outcome = self.paginator.search(&location, &query.filters).await?;
        let mut warnings: Vec<PipelineWarning> = outcome.warning.into_iter().collect();
        let candidates = Arc::new(outcome.candidates);

        log::info!(
            "[{}] Collected {} unique candidates over {} page(s)",
            run_id,
            candidates.len(),
            outcome.pages_fetched
        );

        // 3. Classify each preference independently
        let classifications: Vec<Classification> = stream::iter(preferences.iter())
            .map(|preference| {
                let candidates = candidates.as_ref();
                let location = &location;
                async move {
                    self.classifier
                        .classify(location, candidates, preference)
                        .await
                }
            })
            .buffered(self.settings.classification_workers.max(1))
            .collect()
            .await;

        let mut results = BTreeMap::new();
        for classification in classifications {
            if let Some(warning) = classification.warning {
                warnings.push(warning);
            }
            results.insert(
                classification.result.preference.clone(),
                classification.result,
            );
        }

        let report = DiscoveryReport {
            run_id,
            location,
            candidates,
            preferences: results,
            pages_fetched: outcome.pages_fetched,
            warnings,
            started_at,
            completed_at: Utc::now(),
        };

        log::info!(
            "[{}] Discovery for '{}' finished: {:?} with {} warning(s) in {}ms",
            run_id,
            name,
            report.status(),
            report.warnings.len(),
            (report.completed_at - report.started_at).num_milliseconds()
        );

        Ok(report)
    }

    /// Geocode with a time budget; every failure is a resolution failure
    async fn resolve(&self, name: &str) -> Result<Location, DiscoveryError> {
        match tokio::time::timeout(self.settings.request_timeout, self.geocoder.resolve(name)).await
        {
            Ok(Ok(location)) => Ok(location),
            Ok(Err(e))
                if matches!(
                    e,
                    DiscoveryError::Resolution(_) | DiscoveryError::InvalidInput(_)
                ) =>
            {
                Err(e)
            }
            Ok(Err(e)) => Err(DiscoveryError::Resolution(format!("{}: {}", name, e))),
            Err(_) => Err(DiscoveryError::Resolution(format!(
                "{}: timed out after {:?}",
                name,
                self.settings.request_timeout
            ))),
        }
    }
}

/// Trim labels and drop blanks and case-insensitive repeats, keeping first spelling
pub fn normalize_preferences(preferences: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    preferences
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(p.to_lowercase()))
        .map(|p| p.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::test_config;
    use crate::services::testing::{page, ScriptedGenerator, ScriptedPlaceSearch, StaticGeocoder};

    fn toronto() -> Location {
        Location::new("Toronto", 43.6534817, -79.3839347)
    }

    fn settings() -> PipelineSettings {
        PipelineSettings::from_config(&test_config())
    }

    fn query(preferences: &[&str]) -> DiscoveryQuery {
        DiscoveryQuery {
            location: "Toronto".to_string(),
            filters: SearchFilters::default(),
            preferences: preferences.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn three_pages() -> ScriptedPlaceSearch {
        ScriptedPlaceSearch::new(vec![
            Ok(page("p1", 0, 20, Some("t1"))),
            Ok(page("p2", 0, 20, Some("t2"))),
            Ok(page("p3", 0, 20, None)),
        ])
    }

    fn pipeline(
        geocoder: StaticGeocoder,
        search: ScriptedPlaceSearch,
        generator: Arc<ScriptedGenerator>,
    ) -> DiscoveryPipeline {
        DiscoveryPipeline::new(Arc::new(geocoder), Arc::new(search), generator, settings())
    }

    #[tokio::test]
    async fn test_complete_run() {
        let generator = Arc::new(
            ScriptedGenerator::new("")
                .with_response("food", "Place p1 3,Place p2 7,NotARealPlace")
                .with_response("nature", "Place p3 19, Place p1 3"),
        );
        let pipeline = pipeline(
            StaticGeocoder::resolving(toronto()),
            three_pages(),
            generator.clone(),
        );

        let report = pipeline.discover(&query(&["food", "nature"])).await.unwrap();

        assert_eq!(report.status(), ResultStatus::Complete);
        assert_eq!(report.candidates.len(), 60);
        assert_eq!(report.pages_fetched, 3);
        assert_eq!(report.preferences["food"].places, vec!["p1-3", "p2-7"]);
        assert_eq!(report.preferences["nature"].places, vec!["p3-19", "p1-3"]);
        assert_eq!(generator.call_count(), 2);

        // overlapping preferences are allowed
        assert!(report.preferences["food"].contains("p1-3"));
        assert!(report.preferences["nature"].contains("p1-3"));
    }

    #[tokio::test]
    async fn test_every_result_id_is_a_candidate() {
        let generator = Arc::new(
            ScriptedGenerator::new("Place p1 0, fake, p2-5, Place p9 9, Place p3 1")
        );
        let pipeline = pipeline(StaticGeocoder::resolving(toronto()), three_pages(), generator);

        let report = pipeline
            .discover(&query(&["food", "must sees", "nature", "entertainment"]))
            .await
            .unwrap();

        for (_, ids) in report.mapping() {
            for id in ids {
                assert!(report.candidates.contains(id));
            }
        }
    }

    #[tokio::test]
    async fn test_failed_classification_degrades_one_preference() {
        let generator = Arc::new(
            ScriptedGenerator::new("Place p1 0")
                .with_failure("nature", DiscoveryError::ExternalApiError("500".to_string())),
        );
        let pipeline = pipeline(StaticGeocoder::resolving(toronto()), three_pages(), generator);

        let report = pipeline.discover(&query(&["food", "nature"])).await.unwrap();

        assert_eq!(report.status(), ResultStatus::Partial);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.preferences["food"].places, vec!["p1-0"]);
        assert!(report.preferences["nature"].places.is_empty());
    }

    #[tokio::test]
    async fn test_geocoder_failure_is_fatal() {
        let generator = Arc::new(ScriptedGenerator::new(""));
        let pipeline = pipeline(
            StaticGeocoder::failing(DiscoveryError::Resolution("Atlantis".to_string())),
            three_pages(),
            generator.clone(),
        );

        let result = pipeline.discover(&query(&["food"])).await;

        assert_eq!(result.unwrap_err(), DiscoveryError::Resolution("Atlantis".to_string()));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_geocoder_transport_error_becomes_resolution_error() {
        let pipeline = pipeline(
            StaticGeocoder::failing(DiscoveryError::ExternalApiError("dns".to_string())),
            three_pages(),
            Arc::new(ScriptedGenerator::new("")),
        );

        let result = pipeline.discover(&query(&["food"])).await;
        assert!(matches!(result, Err(DiscoveryError::Resolution(_))));
    }

    #[tokio::test]
    async fn test_geocoder_timeout_becomes_resolution_error() {
        let mut settings = settings();
        settings.request_timeout = Duration::from_millis(20);

        let pipeline = DiscoveryPipeline::new(
            Arc::new(StaticGeocoder::resolving(toronto()).with_delay(Duration::from_millis(200))),
            Arc::new(three_pages()),
            Arc::new(ScriptedGenerator::new("")),
            settings,
        );

        let result = pipeline.discover(&query(&["food"])).await;
        assert!(matches!(result, Err(DiscoveryError::Resolution(ref m)) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn test_first_page_failure_is_fatal() {
        let generator = Arc::new(ScriptedGenerator::new(""));
        let pipeline = pipeline(
            StaticGeocoder::resolving(toronto()),
            ScriptedPlaceSearch::new(vec![Err(DiscoveryError::ExternalApiError(
                "API error 500".to_string(),
            ))]),
            generator.clone(),
        );

        let result = pipeline.discover(&query(&["food"])).await;

        assert!(matches!(result, Err(DiscoveryError::Search(_))));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_later_page_failure_is_partial() {
        let pipeline = pipeline(
            StaticGeocoder::resolving(toronto()),
            ScriptedPlaceSearch::new(vec![
                Ok(page("p1", 0, 20, Some("t1"))),
                Err(DiscoveryError::ExternalApiError("boom".to_string())),
            ]),
            Arc::new(ScriptedGenerator::new("Place p1 1")),
        );

        let report = pipeline.discover(&query(&["food"])).await.unwrap();

        assert_eq!(report.status(), ResultStatus::Partial);
        assert_eq!(report.candidates.len(), 20);
        assert!(matches!(
            report.warnings[0],
            PipelineWarning::PartialResults { pages_fetched: 1, .. }
        ));
        assert_eq!(report.preferences["food"].places, vec!["p1-1"]);
    }

    #[tokio::test]
    async fn test_empty_search_is_a_complete_empty_result() {
        let generator = Arc::new(ScriptedGenerator::new("CN Tower"));
        let pipeline = pipeline(
            StaticGeocoder::resolving(toronto()),
            ScriptedPlaceSearch::new(vec![Ok(page("p1", 0, 0, None))]),
            generator.clone(),
        );

        let report = pipeline.discover(&query(&["food", "nature"])).await.unwrap();

        assert_eq!(report.status(), ResultStatus::Complete);
        assert!(report.candidates.is_empty());
        assert!(report.preferences.values().all(|r| r.places.is_empty()));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_repeat_runs_are_idempotent() {
        let generator =
            Arc::new(ScriptedGenerator::new("Place p2 4, Place p1 1, Place p3 0"));

        let first = pipeline(StaticGeocoder::resolving(toronto()), three_pages(), generator.clone())
            .discover(&query(&["food"]))
            .await
            .unwrap();
        let second = pipeline(StaticGeocoder::resolving(toronto()), three_pages(), generator)
            .discover(&query(&["food"]))
            .await
            .unwrap();

        assert_eq!(first.preferences, second.preferences);
    }

    #[tokio::test]
    async fn test_blank_location_is_rejected() {
        let pipeline = pipeline(
            StaticGeocoder::resolving(toronto()),
            three_pages(),
            Arc::new(ScriptedGenerator::new("")),
        );

        let mut blank = query(&["food"]);
        blank.location = "  ".to_string();

        assert!(matches!(
            pipeline.discover(&blank).await,
            Err(DiscoveryError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_preferences_are_classified_once() {
        let generator = Arc::new(ScriptedGenerator::new("Place p1 0"));
        let pipeline = pipeline(
            StaticGeocoder::resolving(toronto()),
            three_pages(),
            generator.clone(),
        );

        let report = pipeline
            .discover(&query(&["food", " Food ", "", "nature"]))
            .await
            .unwrap();

        assert_eq!(report.preferences.len(), 2);
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_response_resolves_names() {
        let pipeline = pipeline(
            StaticGeocoder::resolving(toronto()),
            three_pages(),
            Arc::new(ScriptedGenerator::new("Place p2 2")),
        );

        let response = pipeline
            .discover(&query(&["food"]))
            .await
            .unwrap()
            .to_response();

        assert_eq!(response.status, ResultStatus::Complete);
        assert_eq!(response.candidate_count, 60);
        assert_eq!(
            response.preferences["food"],
            vec![PlaceSummary {
                id: "p2-2".to_string(),
                name: "Place p2 2".to_string(),
            }]
        );
    }

    #[test]
    fn test_query_from_request_applies_defaults() {
        let pipeline = pipeline(
            StaticGeocoder::resolving(toronto()),
            three_pages(),
            Arc::new(ScriptedGenerator::new("")),
        );

        let query = pipeline.query_from_request(DiscoverRequest {
            location: "Toronto".to_string(),
            keyword: Some("museum".to_string()),
            ..Default::default()
        });

        assert_eq!(query.filters.radius_m, 40000);
        assert_eq!(query.filters.place_type.as_deref(), Some("tourist_attraction"));
        assert_eq!(query.filters.keyword.as_deref(), Some("museum"));
        assert_eq!(query.filters.language, "en");
        assert_eq!(query.preferences, vec!["food", "nature"]);
    }

    #[test]
    fn test_settings_from_config() {
        let settings = settings();
        assert_eq!(settings.pagination.max_pages, 3);
        assert_eq!(settings.pagination.page_delay, Duration::ZERO);
        assert_eq!(settings.classification_workers, 2);
        assert_eq!(settings.top_n, 10);
    }
}
