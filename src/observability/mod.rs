//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; JSON format for machine parsing
//! - Request ID flows through all subsystems
//! - Auth failures log their specific kind here even though clients only
//!   ever see a uniform denial

pub mod logging;

pub use logging::init_logging;
