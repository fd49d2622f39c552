//! farmhand - client core for MasterChef-style yield farms
//!
//! Pipeline:
//! 1. REGISTRY: logical contract name + network -> address and interface
//! 2. CHAIN READER: typed reads over a `ChainTransport`
//! 3. AGGREGATION: concurrent fan-out into TVL, APR and harvest totals
//! 4. CACHE: keyed read-through with coalescing and group invalidation
//! 5. ACTIONS: harvest/approve with per-action pending state

pub mod actions;
pub mod aggregation;
pub mod cache;
pub mod chain;
pub mod client;
pub mod config;
pub mod error;
pub mod networks;
pub mod registry;
pub mod session;

pub use client::ProtocolClient;
pub use error::{CoreError, CoreResult};
pub use session::SessionContext;
