//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, trace layers)
//!     → pipeline (resolve behavior, authorize, fetch origin)
//!     → fallback.rs (remap 404/403 to fallback resources)
//!     → Send to client
//! ```

pub mod fallback;
pub mod server;

pub use fallback::{ErrorResponseMapper, FallbackResponse, LoginAudience};
pub use server::HttpServer;
