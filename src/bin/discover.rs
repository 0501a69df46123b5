// src/bin/discover.rs
// DOCUMENTATION: Command-line client for the discovery service
// PURPOSE: Run one discovery against a running server and print a per-preference summary

use dotenv::dotenv;
use reqwest::Client;
use std::env;
use std::process;
use std::time::{Duration, Instant};
use tripquick::config::env::split_list;
use tripquick::models::{DiscoverRequest, DiscoveryResponse, ResultStatus};

// --- ANSI terminal colors ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

struct DiscoveryCli {
    base_url: String,
    client: Client,
}

impl DiscoveryCli {
    fn new(base_url: String) -> Result<Self, String> {
        // Covers geocoding, three pages with delays and every classification call
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self { base_url, client })
    }

    async fn check_service_health(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn discover(&self, request: &DiscoverRequest) -> Result<DiscoveryResponse, String> {
        let url = format!("{}/attractions/discover", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if response.status().is_success() {
            response
                .json::<DiscoveryResponse>()
                .await
                .map_err(|e| format!("Failed to parse response JSON: {}", e))
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(format!("HTTP {} - {}", status, body))
        }
    }

    fn print_summary(&self, response: &DiscoveryResponse, elapsed: Duration) {
        println!(
            "\n{}📍 {} ({:.4}, {:.4}){}",
            BOLD,
            response.location.name,
            response.location.latitude,
            response.location.longitude,
            RESET
        );
        println!(
            "   {} candidates over {} page(s) in {:.1}s",
            response.candidate_count,
            response.pages_fetched,
            elapsed.as_secs_f64()
        );

        for (preference, places) in &response.preferences {
            println!("\n{}🏷️  {}{} ({})", CYAN, preference, RESET, places.len());
            if places.is_empty() {
                println!("   {}(no matches){}", YELLOW, RESET);
            }
            for (rank, place) in places.iter().enumerate() {
                println!("   {:>2}. {}", rank + 1, place.name);
            }
        }

        println!("──────────────────────────────────────────────────────────────");
        match response.status {
            ResultStatus::Complete => {
                println!("{}✅ Complete results (run {}){}", GREEN, response.run_id, RESET);
            }
            ResultStatus::Partial => {
                println!("{}⚠️  Partial results (run {}){}", YELLOW, response.run_id, RESET);
                for warning in &response.warnings {
                    println!("   {}• {}{}", YELLOW, warning, RESET);
                }
            }
        }
    }
}

fn print_usage() {
    println!("Usage: discover <location> [preference,preference,...]");
    println!("  e.g. discover Toronto \"food,must sees,nature\"");
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(location) = args.first().cloned() else {
        print_usage();
        process::exit(2);
    };
    let preferences = args.get(1).map(|raw| split_list(raw));

    let base_url =
        env::var("TRIPQUICK_URL").unwrap_or_else(|_| "http://localhost:8003".to_string());

    let cli = match DiscoveryCli::new(base_url) {
        Ok(cli) => cli,
        Err(e) => {
            println!("{}❌ {}{}", RED, e, RESET);
            process::exit(1);
        }
    };

    println!("\n{}🔍 Checking service status...{}", CYAN, RESET);
    if !cli.check_service_health().await {
        println!("{}❌ Service unavailable.{}", RED, RESET);
        println!("{}Please ensure tripquick is running (cargo run){}", YELLOW, RESET);
        process::exit(1);
    }
    println!("{}✅ Service available{}", GREEN, RESET);

    let request = DiscoverRequest {
        location,
        preferences,
        ..Default::default()
    };

    println!("\n{}🚀 Discovering attractions in {}...{}", BOLD, request.location, RESET);
    let started = Instant::now();

    match cli.discover(&request).await {
        Ok(response) => cli.print_summary(&response, started.elapsed()),
        Err(e) => {
            println!("{}❌ Discovery failed: {}{}", RED, e, RESET);
            process::exit(1);
        }
    }
}
