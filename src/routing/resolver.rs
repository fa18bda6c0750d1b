//! Behavior resolution.
//!
//! # Responsibilities
//! - Normalize the request path
//! - Scan behaviors in declaration order, first match wins
//! - Fall back to the default behavior when nothing matches
//!
//! # Design Decisions
//! - Resolution never fails: the default is always an answer
//! - O(n) scan over the table (rule counts are small and fixed)
//! - No automatic specificity reordering; order is the operator's contract

use crate::routing::pattern::normalize_path;
use crate::routing::table::{Behavior, BehaviorTable};

impl BehaviorTable {
    /// Resolve a request path to the highest-priority matching behavior.
    pub fn resolve(&self, path: &str) -> &Behavior {
        let normalized = normalize_path(path);
        self.behaviors
            .iter()
            .find(|behavior| behavior.pattern.matches(&normalized))
            .unwrap_or(&self.default)
    }
}
