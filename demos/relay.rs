//! Navigation relay demonstration.
//!
//! Feeds one or more navigated URLs to the service and prints what each
//! one caused: extracted frequency, probe outcome, deliveries.
//!
//! Usage:
//!   cargo run --example relay -- "http://localhost:8080/?f=98,0"
//!   cargo run --example relay -- --debug "https://maps.fmdx.org/#freq=106.4"

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use frequency_link::FrequencyLink;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let debug = args.iter().any(|a| a == "--debug");
    args.retain(|a| a != "--debug");

    init_logging(debug);

    if args.is_empty() {
        anyhow::bail!("usage: relay [--debug] <url> [<url>...]");
    }

    let link = FrequencyLink::builder()
        .probe_timeout(Duration::from_secs(2))
        .cache_ttl(Duration::from_secs(300))
        .build();

    for url in &args {
        let report = link
            .handle_navigation(url)
            .await
            .with_context(|| format!("handling navigation to {url}"))?;

        println!("=== {url} ===");
        println!("  endpoint:  {}", report.endpoint);
        println!("  reachable: {}", report.reachable);
        match report.frequency {
            Some(freq) => println!("  frequency: {freq} MHz ({})", freq.command()),
            None => println!("  frequency: none"),
        }
        for outcome in &report.deliveries {
            println!("  delivery:  {outcome:?}");
        }
    }

    if let Some(endpoint) = link.confirmed_endpoint() {
        println!("\nconfirmed endpoint after run: {endpoint}");
    }

    Ok(())
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("frequency_link=debug")
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
