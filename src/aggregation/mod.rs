//! Aggregation Engine
//!
//! Concurrent fan-out of chain reads across pools and farms, reduced into
//! protocol-wide and per-pool metrics. Per-pool failures are absorbed.

mod engine;
mod pricing;
mod snapshot;

#[cfg(test)]
pub(crate) mod fixtures;

pub use engine::AggregationEngine;
pub use pricing::{apr_to_apy, compute_apr, lp_price, pair_price, REWARD_DECIMALS};
pub use snapshot::{
    HarvestSummary, PoolFailure, PoolSnapshot, PoolValue, ProtocolSnapshot, RewardKind, UserPosition,
};
