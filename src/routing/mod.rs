//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → resolver.rs (first-match-wins scan)
//!     → pattern.rs (evaluate exact / trailing-wildcard match)
//!     → Return: matched Behavior (the default when nothing else matches)
//!
//! Table Construction (at startup):
//!     BehaviorConfig[]
//!     → Parse patterns, reject duplicates, lint unreachable rules
//!     → Freeze as immutable BehaviorTable
//! ```
//!
//! # Design Decisions
//! - Behaviors compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same path always resolves to the same behavior
//! - First match wins (ordered by declaration)

pub mod pattern;
pub mod resolver;
pub mod table;

pub use pattern::{normalize_path, PathPattern, PatternError};
pub use table::{
    Behavior, BehaviorTable, BehaviorTableBuilder, HttpsPolicy, OriginId, ShadowedRule, TableError,
};
