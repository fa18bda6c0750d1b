//! Per-request orchestration.
//!
//! # Data Flow
//! ```text
//! RequestContext (path, scheme, host, token parameters)
//!     → Resolving: behavior table lookup
//!     → transport policy (redirect or reject plaintext)
//!     → Authorizing: signed-token verification when the behavior demands it
//!     → OriginFetch: dispatch to the behavior's origin
//!     → 404/403 remapping via the fallback mapper
//!     → Responding: status + body + Cache-Control from the resolved policy
//! ```
//!
//! # Design Decisions
//! - Authorization failures never reach the origin; they go straight to
//!   the 403 remapping with the specific kind logged internally
//! - Verification is CPU-bound and runs on the blocking pool behind a
//!   bounded semaphore, so invalid-token floods cannot starve the runtime
//! - One remap per request: a failing fallback fetch propagates as-is

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use tokio::sync::Semaphore;

use crate::cache::max_age_hint;
use crate::http::fallback::{ErrorResponseMapper, FallbackResponse};
use crate::routing::{normalize_path, Behavior, BehaviorTable, HttpsPolicy};
use crate::signing::{AuthError, TokenVerifier, WireToken};

pub mod origin;

pub use origin::{HttpOrigin, Origin, OriginError, OriginResponse, OriginSet};

/// Everything the pipeline needs to know about one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub path: String,
    pub raw_query: Option<String>,
    pub host: Option<String>,
    pub https: bool,
    pub token: Option<WireToken>,
}

impl RequestContext {
    /// The resource a presented token must cover. Reconstructed as the full
    /// HTTPS URL when the host is known; a host-less request can only match
    /// a token signed over the bare path.
    fn requested_resource(&self, path: &str) -> String {
        match &self.host {
            Some(host) => format!("https://{host}{path}"),
            None => path.to_string(),
        }
    }
}

/// Final decision for one request.
#[derive(Debug, Clone)]
pub struct EdgeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl EdgeResponse {
    fn status_only(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    fn redirect(location: String) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&location) {
            headers.insert(header::LOCATION, value);
        }
        Self {
            status: StatusCode::MOVED_PERMANENTLY,
            headers,
            body: Bytes::new(),
        }
    }
}

/// Orchestrates resolution, authorization, origin fetch, and remapping.
///
/// Built once at startup; shared read-only across request tasks.
pub struct EdgeRequestPipeline {
    table: Arc<BehaviorTable>,
    verifier: Arc<TokenVerifier>,
    mapper: ErrorResponseMapper,
    origins: OriginSet,
    verify_permits: Arc<Semaphore>,
}

impl EdgeRequestPipeline {
    pub fn new(
        table: Arc<BehaviorTable>,
        verifier: Arc<TokenVerifier>,
        mapper: ErrorResponseMapper,
        origins: OriginSet,
        max_concurrent_verifications: usize,
    ) -> Self {
        Self {
            table,
            verifier,
            mapper,
            origins,
            verify_permits: Arc::new(Semaphore::new(max_concurrent_verifications.max(1))),
        }
    }

    pub async fn handle(&self, request: RequestContext) -> EdgeResponse {
        let path = normalize_path(&request.path);
        let behavior = self.table.resolve(&path);
        tracing::debug!(
            path = %path,
            pattern = behavior.pattern.as_str(),
            origin = %behavior.origin,
            signed = behavior.require_signed_token,
            "behavior resolved"
        );

        if !request.https {
            match behavior.https {
                HttpsPolicy::RedirectToHttps => {
                    if let Some(host) = &request.host {
                        let location = match &request.raw_query {
                            Some(q) => format!("https://{host}{path}?{q}"),
                            None => format!("https://{host}{path}"),
                        };
                        return EdgeResponse::redirect(location);
                    }
                    // No host to redirect to; treat like https-only.
                    return EdgeResponse::status_only(StatusCode::FORBIDDEN);
                }
                HttpsPolicy::HttpsOnly => {
                    return EdgeResponse::status_only(StatusCode::FORBIDDEN);
                }
            }
        }

        if behavior.require_signed_token {
            match &request.token {
                None => {
                    tracing::warn!(path = %path, "protected resource requested without a token");
                    return self.deny().await;
                }
                Some(wire) => {
                    let resource = request.requested_resource(&path);
                    if let Err(err) = self.authorize(wire.clone(), resource).await {
                        tracing::warn!(
                            path = %path,
                            key_pair_id = %wire.key_pair_id,
                            kind = err.kind(),
                            error = %err,
                            "signed token rejected"
                        );
                        return self.deny().await;
                    }
                }
            }
        }

        let response = match self.origins.get(behavior.origin).fetch(&path).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(path = %path, origin = %behavior.origin, error = %err, "origin fetch failed");
                return EdgeResponse::status_only(StatusCode::BAD_GATEWAY);
            }
        };

        if let Some(fallback) = self.mapper.map(response.status) {
            tracing::debug!(
                path = %path,
                origin_status = response.status.as_u16(),
                body_path = fallback.body_path,
                "remapping origin response"
            );
            return self.serve_fallback(fallback).await;
        }

        respond(behavior, response)
    }

    /// Verify on the blocking pool, bounded by the semaphore. A failure to
    /// run the verification at all is a denial, never a crash.
    async fn authorize(&self, wire: WireToken, resource: String) -> Result<(), AuthError> {
        let _permit = self
            .verify_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AuthError::Unavailable)?;
        let verifier = self.verifier.clone();
        match tokio::task::spawn_blocking(move || verifier.verify(&wire, &resource)).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "verification task failed");
                Err(AuthError::Unavailable)
            }
        }
    }

    /// Uniform denial: the 403 remapping, body fetched without any token
    /// requirement (error pages must be reachable unauthenticated).
    async fn deny(&self) -> EdgeResponse {
        match self.mapper.map(StatusCode::FORBIDDEN) {
            Some(fallback) => self.serve_fallback(fallback).await,
            None => EdgeResponse::status_only(StatusCode::FORBIDDEN),
        }
    }

    async fn serve_fallback(&self, fallback: FallbackResponse) -> EdgeResponse {
        let behavior = self.table.resolve(fallback.body_path);
        match self.origins.get(behavior.origin).fetch(fallback.body_path).await {
            Ok(response) if response.status.is_success() => {
                let mut mapped = respond(behavior, response);
                mapped.status = fallback.status;
                mapped
            }
            Ok(response) => {
                // The fallback resource itself failed; no second remap.
                tracing::error!(
                    body_path = fallback.body_path,
                    status = response.status.as_u16(),
                    "fallback resource fetch returned an error"
                );
                EdgeResponse::status_only(response.status)
            }
            Err(err) => {
                tracing::error!(body_path = fallback.body_path, error = %err, "fallback resource fetch failed");
                EdgeResponse::status_only(StatusCode::BAD_GATEWAY)
            }
        }
    }
}

/// Build the final response: origin body plus a Cache-Control derived from
/// the resolved policy, tightened by the origin's own freshness hint.
fn respond(behavior: &Behavior, response: OriginResponse) -> EdgeResponse {
    let hint = response
        .headers
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(max_age_hint);

    let mut headers = HeaderMap::new();
    if let Some(content_type) = response.headers.get(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, content_type.clone());
    }
    if let Ok(value) = HeaderValue::from_str(&behavior.cache_policy.cache_control(hint)) {
        headers.insert(header::CACHE_CONTROL, value);
    }

    EdgeResponse {
        status: response.status,
        headers,
        body: response.body,
    }
}
