// src/services/paginator.rs
// DOCUMENTATION: Nearby search pagination
// PURPOSE: Walk a nearby search's page tokens into one deduplicated candidate set

use crate::errors::DiscoveryError;
use crate::models::{Location, PipelineWarning, SearchFilters};
use crate::services::candidate_store::{CandidateSet, CandidateStore};
use crate::services::providers::{NearbyPage, PageRequest, PlaceSearch};
use std::sync::Arc;
use std::time::Duration;

/// Pagination limits and pacing
#[derive(Debug, Clone)]
pub struct PaginationSettings {
    /// Hard cap on pages per search; reaching it is a normal stop
    pub max_pages: u32,
    /// Pause before each follow-up page (page tokens are not valid immediately)
    pub page_delay: Duration,
    /// Retries for a page rejected as rate limited or not ready
    pub max_retries: u32,
    /// Time budget for each page request
    pub request_timeout: Duration,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            max_pages: 3,
            page_delay: Duration::from_secs(2),
            max_retries: 2,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of a completed (possibly truncated) search
#[derive(Debug)]
pub struct SearchOutcome {
    pub candidates: CandidateSet,
    pub pages_fetched: u32,
    /// Set when a follow-up page failed and the candidates are partial
    pub warning: Option<PipelineWarning>,
}

/// Sequential wait-then-fetch pager over a PlaceSearch backend
/// DOCUMENTATION: The page token is passed back verbatim; nothing about its content
/// is assumed. Duplicate ids are dropped across all pages, first occurrence wins.
pub struct PlaceSearchPaginator {
    search: Arc<dyn PlaceSearch>,
    settings: PaginationSettings,
}

impl PlaceSearchPaginator {
    pub fn new(search: Arc<dyn PlaceSearch>, settings: PaginationSettings) -> Self {
        Self { search, settings }
    }

    /// Collect every page of a nearby search
    ///
    /// # Arguments
    /// * `location` - Resolved search center
    /// * `filters` - Radius, type/keyword and language for the first request
    ///
    /// # Returns
    /// The frozen candidate set, or `Search` when the first page fails.
    /// Later failures keep what was collected and attach a `PartialResults` warning.
    pub async fn search(
        &self,
        location: &Location,
        filters: &SearchFilters,
    ) -> Result<SearchOutcome, DiscoveryError> {
        let max_pages = self.settings.max_pages.max(1);
        let mut store = CandidateStore::new();
        let mut pages_fetched: u32 = 0;
        let mut warning = None;
        let mut request = PageRequest::First {
            location: location.clone(),
            filters: filters.clone(),
        };

        loop {
            if pages_fetched > 0 {
                tokio::time::sleep(self.settings.page_delay).await;
            }

            let page = match self.fetch_with_backoff(&request).await {
                Ok(page) => page,
                Err(e) if pages_fetched == 0 => {
                    log::error!("First search page failed for {}: {}", location.name, e);
                    return Err(DiscoveryError::Search(e.to_string()));
                }
                Err(e) => {
                    log::warn!(
                        "Search page {} failed for {}, keeping {} candidates: {}",
                        pages_fetched + 1,
                        location.name,
                        store.len(),
                        e
                    );
                    warning = Some(PipelineWarning::PartialResults {
                        pages_fetched,
                        reason: e.to_string(),
                    });
                    break;
                }
            };

            pages_fetched += 1;
            let NearbyPage {
                places,
                next_page_token,
            } = page;

            let received = places.len();
            let mut added = 0;
            for place in places {
                if store.add(place) {
                    added += 1;
                }
            }

            log::info!(
                "Page {}/{} for {}: {} places, {} new, {} total",
                pages_fetched,
                max_pages,
                location.name,
                received,
                added,
                store.len()
            );

            match next_page_token {
                Some(cursor) if pages_fetched < max_pages => {
                    request = PageRequest::Next { cursor };
                }
                Some(_) => {
                    log::debug!("Page cap of {} reached for {}", max_pages, location.name);
                    break;
                }
                None => break,
            }
        }

        Ok(SearchOutcome {
            candidates: store.freeze(),
            pages_fetched,
            warning,
        })
    }

    /// One page request with timeout and rate-limit-aware retries
    async fn fetch_with_backoff(&self, request: &PageRequest) -> Result<NearbyPage, DiscoveryError> {
        let mut attempt: u32 = 0;

        loop {
            let result = match tokio::time::timeout(
                self.settings.request_timeout,
                self.search.nearby_page(request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(DiscoveryError::Timeout(
                    "nearby search page".to_string(),
                    self.settings.request_timeout,
                )),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < self.settings.max_retries => {
                    let backoff = self.backoff(attempt);
                    log::warn!(
                        "{} - retrying page in {}ms (attempt {}/{})",
                        e,
                        backoff.as_millis(),
                        attempt + 1,
                        self.settings.max_retries
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Exponential backoff based on the page delay
    fn backoff(&self, attempt: u32) -> Duration {
        self.settings
            .page_delay
            .saturating_mul(2u32.saturating_pow(attempt + 1))
    }
}
