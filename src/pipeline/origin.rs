//! Origin fetch collaborator.
//!
//! # Responsibilities
//! - Define the minimal origin contract: `fetch(path) → status + headers + body`
//! - Provide the HTTP implementation used in production
//! - Dispatch by origin id
//!
//! # Design Decisions
//! - Trait object so tests can inject an in-process origin
//! - Bodies are buffered (bounded) so the pipeline can substitute fallback
//!   resources after seeing the status
//! - Retry and replication concerns stay on the other side of this trait

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::uri::{Authority, Scheme};
use axum::http::{HeaderMap, Request, StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::config::schema::OriginsConfig;
use crate::routing::OriginId;

/// Largest origin body the pipeline will buffer.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Error raised by an origin fetch. Never remapped; surfaced as a gateway
/// error to the client.
#[derive(Debug, Error)]
pub enum OriginError {
    #[error("origin request failed: {0}")]
    Unreachable(String),
    #[error("origin body exceeded {MAX_BODY_BYTES} bytes or could not be read")]
    Body,
    #[error("invalid origin address {0:?}")]
    Address(String),
}

/// A buffered origin response.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The backing content source a resolved behavior fetches from.
#[async_trait]
pub trait Origin: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<OriginResponse, OriginError>;
}

/// Production origin: plain HTTP to a configured upstream authority.
pub struct HttpOrigin {
    client: Client<HttpConnector, Body>,
    authority: Authority,
}

impl HttpOrigin {
    pub fn new(address: &str) -> Result<Self, OriginError> {
        let authority = Authority::from_str(address)
            .map_err(|_| OriginError::Address(address.to_string()))?;
        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
            authority,
        })
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch(&self, path: &str) -> Result<OriginResponse, OriginError> {
        let uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path)
            .build()
            .map_err(|e| OriginError::Unreachable(e.to_string()))?;

        let request = Request::get(uri)
            .body(Body::empty())
            .map_err(|e| OriginError::Unreachable(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| OriginError::Unreachable(e.to_string()))?;

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), MAX_BODY_BYTES)
            .await
            .map_err(|_| OriginError::Body)?;

        Ok(OriginResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

/// The origins a table can address, injected once at startup.
#[derive(Clone)]
pub struct OriginSet {
    website: Arc<dyn Origin>,
    login: Arc<dyn Origin>,
}

impl OriginSet {
    pub fn new(website: Arc<dyn Origin>, login: Arc<dyn Origin>) -> Self {
        Self { website, login }
    }

    /// Production origins from configured upstream addresses.
    pub fn from_config(config: &OriginsConfig) -> Result<Self, OriginError> {
        Ok(Self::new(
            Arc::new(HttpOrigin::new(&config.website_address)?),
            Arc::new(HttpOrigin::new(&config.login_address)?),
        ))
    }

    pub fn get(&self, id: OriginId) -> &dyn Origin {
        match id {
            OriginId::Website => self.website.as_ref(),
            OriginId::Login => self.login.as_ref(),
        }
    }
}
