//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the pipeline dispatch handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Translate transport details (scheme, host, token parameters) into a
//!   RequestContext for the pipeline
//!
//! # Design Decisions
//! - The server is a thin adapter: every decision lives in the pipeline
//! - Scheme detection trusts x-forwarded-proto (TLS terminates upstream)
//! - Token parameters ride in the query string, never in headers

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, Response},
    response::IntoResponse,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::EdgeConfig;
use crate::pipeline::{EdgeRequestPipeline, RequestContext};
use crate::signing::WireToken;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<EdgeRequestPipeline>,
}

/// HTTP front door for the edge gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a fully built pipeline.
    pub fn new(config: &EdgeConfig, pipeline: Arc<EdgeRequestPipeline>) -> Self {
        let state = AppState { pipeline };
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(edge_handler))
            .route("/", any(edge_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main handler: translate the transport request and dispatch to the
/// pipeline.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> impl IntoResponse {
    let context = request_context(&request);
    let decision = state.pipeline.handle(context).await;

    let mut response = Response::builder().status(decision.status);
    if let Some(headers) = response.headers_mut() {
        headers.extend(decision.headers);
    }
    response
        .body(Body::from(decision.body))
        .unwrap_or_else(|_| {
            Response::new(Body::empty())
        })
}

fn request_context(request: &Request<Body>) -> RequestContext {
    let path = request.uri().path().to_string();
    let raw_query = request.uri().query().map(str::to_string);
    let token = raw_query.as_deref().and_then(WireToken::from_query);

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    // TLS terminates in front of this process; the forwarded scheme is the
    // only signal left.
    let https = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|scheme| scheme.eq_ignore_ascii_case("https"))
        .unwrap_or(false);

    RequestContext {
        path,
        raw_query,
        host,
        https,
        token,
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
