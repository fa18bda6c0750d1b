//! Error-response remapping.
//!
//! # Responsibilities
//! - Remap origin 404s to the SPA shell so client-side routing can take
//!   unknown paths as application routes
//! - Remap 403s to the login entry point for the configured audience
//! - Pass every other status through untouched
//!
//! # Design Decisions
//! - Pure function of the status and the configuration-time audience; no
//!   I/O, no request inspection
//! - The audience set is an open enum; audiences without a defined mapping
//!   fall back to the standard entry point and are flagged at startup

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Which login entry point a denied caller should land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginAudience {
    #[default]
    Standard,
    Apps,
    /// Referenced by the configuration surface but without a defined login
    /// mapping; treated as [`LoginAudience::Standard`] until one exists.
    Eth,
}

pub const STANDARD_LOGIN_PATH: &str = "/login.html";
pub const APPS_LOGIN_PATH: &str = "/apps-login.html";
pub const SPA_INDEX_PATH: &str = "/";

/// A remapped response: the status to emit and the resource to serve as
/// its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackResponse {
    pub status: StatusCode,
    pub body_path: &'static str,
}

/// Maps upstream failure statuses to fallback resources.
#[derive(Debug, Clone)]
pub struct ErrorResponseMapper {
    audience: LoginAudience,
}

impl ErrorResponseMapper {
    pub fn new(audience: LoginAudience) -> Self {
        if audience == LoginAudience::Eth {
            tracing::warn!(
                audience = "eth",
                fallback = STANDARD_LOGIN_PATH,
                "no login mapping is defined for the eth audience; using the standard entry point"
            );
        }
        Self { audience }
    }

    /// Remap a status. `None` means pass the response through unchanged.
    pub fn map(&self, origin_status: StatusCode) -> Option<FallbackResponse> {
        match origin_status {
            StatusCode::NOT_FOUND => Some(FallbackResponse {
                status: StatusCode::OK,
                body_path: SPA_INDEX_PATH,
            }),
            StatusCode::FORBIDDEN => Some(FallbackResponse {
                status: StatusCode::OK,
                body_path: self.login_path(),
            }),
            _ => None,
        }
    }

    fn login_path(&self) -> &'static str {
        match self.audience {
            LoginAudience::Standard | LoginAudience::Eth => STANDARD_LOGIN_PATH,
            LoginAudience::Apps => APPS_LOGIN_PATH,
        }
    }
}
