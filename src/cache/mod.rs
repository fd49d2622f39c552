//! Query Cache
//!
//! Keyed read-through cache over engine and reader results, with staleness
//! windows, request coalescing and group invalidation.

mod keys;
mod query_cache;

pub use keys::{CacheGroup, Metric, QueryKey};
pub use query_cache::{Cached, QueryCache};
