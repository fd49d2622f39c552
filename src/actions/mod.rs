//! Action Orchestrator
//!
//! `idle -> pending -> {success, failed}` per action id, with cache
//! invalidation of dependent groups on success.

mod orchestrator;
mod plan;

pub use orchestrator::{ActionOrchestrator, ActionRecord, ActionStatus, InvokeOutcome};
pub use plan::{Action, ActionId, TxStep};
