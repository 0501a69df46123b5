// src/handlers/attractions.rs
// DOCUMENTATION: HTTP handlers for attraction discovery
// PURPOSE: Parse requests, run the discovery pipeline, return responses

use crate::errors::DiscoveryError;
use crate::models::DiscoverRequest;
use crate::services::DiscoveryPipeline;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// POST /attractions/discover
/// Run one discovery for a location and its preferences
pub async fn discover(
    pipeline: web::Data<DiscoveryPipeline>,
    req: web::Json<DiscoverRequest>,
) -> Result<impl Responder, DiscoveryError> {
    // Validate request
    if let Err(e) = req.validate() {
        return Err(DiscoveryError::ValidationError(e.to_string()));
    }

    let query = pipeline.query_from_request(req.into_inner());
    let report = pipeline.discover(&query).await?;

    Ok(HttpResponse::Ok().json(report.to_response()))
}

/// GET /attractions/preferences
/// Preferences classified when a request names none
pub async fn default_preferences(pipeline: web::Data<DiscoveryPipeline>) -> impl Responder {
    let settings = pipeline.settings();
    HttpResponse::Ok().json(json!({
        "preferences": settings.default_preferences,
        "top_n": settings.top_n
    }))
}

/// Configure attraction routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attractions")
            .route("/discover", web::post().to(discover))
            .route("/preferences", web::get().to(default_preferences)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::test_config;
    use crate::models::{DiscoveryResponse, Location, ResultStatus};
    use crate::services::testing::{page, ScriptedGenerator, ScriptedPlaceSearch, StaticGeocoder};
    use crate::services::PipelineSettings;
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;

    fn pipeline(geocoder: StaticGeocoder, search: ScriptedPlaceSearch) -> DiscoveryPipeline {
        DiscoveryPipeline::new(
            Arc::new(geocoder),
            Arc::new(search),
            Arc::new(ScriptedGenerator::new("Place p1 2, Place p2 0")),
            PipelineSettings::from_config(&test_config()),
        )
    }

    fn toronto() -> StaticGeocoder {
        StaticGeocoder::resolving(Location::new("Toronto", 43.6534817, -79.3839347))
    }

    fn two_pages() -> ScriptedPlaceSearch {
        ScriptedPlaceSearch::new(vec![
            Ok(page("p1", 0, 20, Some("t1"))),
            Ok(page("p2", 0, 5, None)),
        ])
    }

    #[actix_web::test]
    async fn test_discover_returns_named_places() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pipeline(toronto(), two_pages())))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/attractions/discover")
            .set_json(json!({"location": "Toronto", "preferences": ["food"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: DiscoveryResponse = test::read_body_json(resp).await;
        assert_eq!(body.status, ResultStatus::Complete);
        assert_eq!(body.candidate_count, 25);
        assert_eq!(body.pages_fetched, 2);

        let names: Vec<&str> = body.preferences["food"]
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Place p1 2", "Place p2 0"]);
    }

    #[actix_web::test]
    async fn test_discover_uses_default_preferences() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pipeline(toronto(), two_pages())))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/attractions/discover")
            .set_json(json!({"location": "Toronto"}))
            .to_request();
        let body: DiscoveryResponse = test::call_and_read_body_json(&app, req).await;

        let keys: Vec<&str> = body.preferences.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["food", "nature"]);
    }

    #[actix_web::test]
    async fn test_invalid_body_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pipeline(toronto(), two_pages())))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/attractions/discover")
            .set_json(json!({"location": "", "radius_m": 90000}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_unknown_location_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pipeline(
                    StaticGeocoder::failing(DiscoveryError::Resolution("Atlantis".to_string())),
                    two_pages(),
                )))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/attractions/discover")
            .set_json(json!({"location": "Atlantis"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "RESOLUTION_ERROR");
    }

    #[actix_web::test]
    async fn test_search_failure_is_bad_gateway() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pipeline(
                    toronto(),
                    ScriptedPlaceSearch::new(vec![Err(DiscoveryError::ExternalApiError(
                        "REQUEST_DENIED".to_string(),
                    ))]),
                )))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/attractions/discover")
            .set_json(json!({"location": "Toronto"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn test_default_preferences_route() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pipeline(toronto(), two_pages())))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/attractions/preferences")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["preferences"], json!(["food", "nature"]));
        assert_eq!(body["top_n"], 10);
    }
}
