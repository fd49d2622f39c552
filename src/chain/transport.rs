use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreResult;

/// Outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// `false` when the transaction reverted on chain
    pub success: bool,
}

/// The network reader/writer the core talks through
///
/// Reads fail with `ChainUnavailable` on transport failure and `Decode` when
/// the node answers with a revert. Timeouts belong here, not in callers.
#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// `eth_call` against `to` with ABI-encoded `input`
    async fn call(&self, to: Address, input: Bytes) -> CoreResult<Bytes>;

    /// Sign with the configured signer, submit, and wait for the receipt
    async fn send(&self, to: Address, input: Bytes) -> CoreResult<TxReceipt>;

    async fn block_number(&self) -> CoreResult<u64>;

    /// Address transactions are sent from, if a signer is configured
    fn signer(&self) -> Option<Address>;
}
