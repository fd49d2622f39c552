//! HTTP JSON-RPC transport backed by alloy
//!
//! One provider per transport. Reads go through `eth_call`; writes are
//! signed by the local wallet filler and awaited until mined.

use alloy_network::{EthereumWallet, ReceiptResponse};
use alloy_primitives::{Address, Bytes};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::{RpcError, TransportError};
use async_trait::async_trait;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::transport::{ChainTransport, TxReceipt};
use crate::error::{CoreError, CoreResult};

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time to wait for a submitted transaction to be mined
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

pub struct RpcTransport {
    provider: DynProvider,
    signer: Option<Address>,
    request_timeout: Duration,
    confirmation_timeout: Duration,
}

impl RpcTransport {
    /// Read-only transport
    pub fn new(rpc_url: &str, request_timeout: Duration) -> CoreResult<Self> {
        let url = rpc_url
            .parse()
            .map_err(|e| CoreError::configuration(format!("invalid RPC URL {}: {}", rpc_url, e)))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();

        Ok(Self {
            provider,
            signer: None,
            request_timeout,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        })
    }

    /// Transport that can also sign and submit transactions
    pub fn with_signer(
        rpc_url: &str,
        signer: PrivateKeySigner,
        request_timeout: Duration,
        confirmation_timeout: Duration,
    ) -> CoreResult<Self> {
        let url = rpc_url
            .parse()
            .map_err(|e| CoreError::configuration(format!("invalid RPC URL {}: {}", rpc_url, e)))?;

        let address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        info!("✓ Signer loaded: {:?}", address);

        Ok(Self {
            provider,
            signer: Some(address),
            request_timeout,
            confirmation_timeout,
        })
    }

    /// Parse a hex private key, with or without `0x`
    pub fn parse_signer(key: &str) -> CoreResult<PrivateKeySigner> {
        let key = key.trim().trim_start_matches("0x");
        PrivateKeySigner::from_str(key)
            .map_err(|e| CoreError::configuration(format!("invalid signer key: {}", e)))
    }
}

/// A node-side error response on a read is a revert, not an outage
fn read_error(err: TransportError) -> CoreError {
    match err {
        RpcError::ErrorResp(payload) => CoreError::decode(format!("call reverted: {}", payload.message)),
        other => CoreError::unavailable(other.to_string()),
    }
}

#[async_trait]
impl ChainTransport for RpcTransport {
    async fn call(&self, to: Address, input: Bytes) -> CoreResult<Bytes> {
        let tx = TransactionRequest::default().to(to).input(input.into());
        let request = async { self.provider.call(tx).await };

        match timeout(self.request_timeout, request).await {
            Ok(result) => result.map_err(read_error),
            Err(_) => {
                warn!("eth_call to {:?} timed out after {:?}", to, self.request_timeout);
                Err(CoreError::unavailable(format!("eth_call to {:?} timed out", to)))
            }
        }
    }

    async fn send(&self, to: Address, input: Bytes) -> CoreResult<TxReceipt> {
        let from = self
            .signer
            .ok_or_else(|| CoreError::rejected("no signer configured"))?;

        let tx = TransactionRequest::default().from(from).to(to).input(input.into());

        let pending = timeout(self.request_timeout, self.provider.send_transaction(tx))
            .await
            .map_err(|_| CoreError::rejected("transaction submission timed out"))?
            .map_err(|e| CoreError::rejected(e.to_string()))?;

        let tx_hash = *pending.tx_hash();
        debug!("Submitted {:?} to {:?}, waiting for receipt", tx_hash, to);

        let receipt = timeout(self.confirmation_timeout, pending.get_receipt())
            .await
            .map_err(|_| CoreError::rejected(format!("no receipt for {:?} within {:?}", tx_hash, self.confirmation_timeout)))?
            .map_err(|e| CoreError::rejected(e.to_string()))?;

        Ok(TxReceipt {
            tx_hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
            success: receipt.status(),
        })
    }

    async fn block_number(&self) -> CoreResult<u64> {
        timeout(self.request_timeout, self.provider.get_block_number())
            .await
            .map_err(|_| CoreError::unavailable("eth_blockNumber timed out"))?
            .map_err(|e| CoreError::unavailable(e.to_string()))
    }

    fn signer(&self) -> Option<Address> {
        self.signer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signer_accepts_prefixed_key() {
        // Well-known local devnet key, never funded on a real network
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let signer = RpcTransport::parse_signer(key).unwrap();
        assert_eq!(
            format!("{:?}", signer.address()).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_parse_signer_rejects_garbage() {
        assert!(matches!(
            RpcTransport::parse_signer("not-a-key"),
            Err(CoreError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_url_is_configuration_error() {
        let result = RpcTransport::new("not a url", DEFAULT_REQUEST_TIMEOUT);
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_send_without_signer_is_rejected() {
        let transport = RpcTransport::new("http://localhost:8545", DEFAULT_REQUEST_TIMEOUT).unwrap();
        let result = transport.send(Address::ZERO, Bytes::new()).await;
        assert!(matches!(result, Err(CoreError::ActionRejected(_))));
    }
}
