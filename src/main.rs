// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config and the discovery pipeline, then start the HTTP server

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use tripquick::config::Config;
use tripquick::handlers;
use tripquick::services::DiscoveryPipeline;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.as_str()
        } else {
            "info,actix_web=info"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting tripquick attraction discovery service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Build the pipeline against the live providers
    let pipeline = match DiscoveryPipeline::from_config(&config) {
        Ok(pipeline) => web::Data::new(pipeline),
        Err(e) => {
            log::error!("Failed to initialize discovery pipeline: {}", e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Discovery pipeline ready (model: {}, pages: {}, workers: {})",
        config.gemini_model,
        config.max_search_pages,
        config.classification_workers
    );

    // 5. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);

    HttpServer::new(move || {
        App::new()
            // Application state
            .app_data(pipeline.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::attractions_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
