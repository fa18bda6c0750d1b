//! Edge Delivery Decision Engine (v1)
//!
//! Selects, per request path: an origin, a cache policy, a
//! transport-security requirement, and whether the response is gated
//! behind a cryptographically signed access token.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                 EDGE GATEWAY                   │
//!                    │                                                │
//!   Client Request   │  ┌────────┐   ┌──────────┐   ┌─────────────┐  │
//!   ─────────────────┼─▶│  http  │──▶│ pipeline │──▶│   routing   │  │
//!                    │  │ server │   │          │   │ (behaviors) │  │
//!                    │  └────────┘   └────┬─────┘   └─────────────┘  │
//!                    │                    │                           │
//!                    │          ┌─────────┴──────────┐                │
//!                    │          ▼                    ▼                │
//!                    │  ┌──────────────┐     ┌──────────────┐        │
//!                    │  │   signing    │     │    origin    │◀───────┼── Origin
//!                    │  │  (verifier)  │     │    fetch     │        │   Servers
//!                    │  └──────────────┘     └──────┬───────┘        │
//!                    │                              │                 │
//!   Client Response  │  ┌──────────────┐     ┌──────▼───────┐        │
//!   ◀────────────────┼──│ cache policy │◀────│   fallback   │        │
//!                    │  │ (max-age)    │     │ (404/403 map)│        │
//!                    │  └──────────────┘     └──────────────┘        │
//!                    │                                                │
//!                    │  Cross-cutting: config · observability         │
//!                    └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use edge_gateway::config::{load_config, EdgeConfig};
use edge_gateway::http::fallback::ErrorResponseMapper;
use edge_gateway::http::HttpServer;
use edge_gateway::observability::init_logging;
use edge_gateway::pipeline::{EdgeRequestPipeline, OriginSet};
use edge_gateway::routing::BehaviorTable;
use edge_gateway::signing::TokenVerifier;

#[derive(Parser)]
#[command(name = "edge-gateway")]
#[command(about = "Edge delivery decision engine", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "edge-gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Misconfiguration refuses startup before any request can be handled.
    let config = if args.config.exists() {
        load_config(&args.config)?
    } else {
        EdgeConfig::default()
    };

    init_logging(&config.observability);
    tracing::info!("edge-gateway v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        behaviors = config.behaviors.len(),
        trusted_keys = config.signing.trusted_keys.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let (table, shadowed) = BehaviorTable::from_config(&config)?;
    for warning in &shadowed {
        tracing::warn!(earlier = %warning.earlier, later = %warning.later, "{warning}");
    }

    let verifier = TokenVerifier::from_config(&config.signing)?;
    let origins = OriginSet::from_config(&config.origins)?;
    let mapper = ErrorResponseMapper::new(config.error_pages.login_audience);

    let pipeline = Arc::new(EdgeRequestPipeline::new(
        Arc::new(table),
        Arc::new(verifier),
        mapper,
        origins,
        config.signing.max_concurrent_verifications,
    ));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(&config, pipeline);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
