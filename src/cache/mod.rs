//! Cache freshness policies.

pub mod policy;

pub use policy::{max_age_hint, CachePolicy, InvalidPolicy};
