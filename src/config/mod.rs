//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → compiled into BehaviorTable / TokenVerifier / OriginSet at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the table lives for the process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Misconfiguration refuses startup; nothing invalid reaches requests

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BehaviorConfig, CachePolicyConfig, DefaultBehaviorConfig, EdgeConfig, ErrorPagesConfig,
    ListenerConfig, ObservabilityConfig, OriginsConfig, SigningConfig, TimeoutConfig,
    TrustedKeyConfig,
};
pub use validation::{validate_config, ValidationError};
