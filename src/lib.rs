//! Edge Delivery Decision Engine Library

pub mod cache;
pub mod config;
pub mod http;
pub mod observability;
pub mod pipeline;
pub mod routing;
pub mod signing;

pub use config::EdgeConfig;
pub use http::HttpServer;
pub use pipeline::EdgeRequestPipeline;
