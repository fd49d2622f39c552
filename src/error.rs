//! Error taxonomy for the core
//!
//! Four kinds, each with a fixed propagation rule:
//! - `Configuration`: bad or missing static config. Fatal, never retried.
//! - `ChainUnavailable`: transport failure. Retried on the next natural refetch.
//! - `Decode`: malformed or reverted read. Absorbed per pool during aggregation.
//! - `ActionRejected`: signer declined, submission failed or tx reverted.

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the registry, reader, engine, cache and orchestrator.
///
/// `Clone` is required because one in-flight fetch result is handed to every
/// coalesced waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("chain unavailable: {0}")]
    ChainUnavailable(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("action rejected: {0}")]
    ActionRejected(String),
}

impl CoreError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        CoreError::Configuration(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        CoreError::ChainUnavailable(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        CoreError::Decode(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        CoreError::ActionRejected(msg.into())
    }

    /// Whether a later refetch may succeed without any config change
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::ChainUnavailable(_) | CoreError::Decode(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, CoreError::ChainUnavailable(_))
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
