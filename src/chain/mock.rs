//! In-memory transport for tests
//!
//! Responses are keyed on (contract, calldata). Anything not registered
//! answers like a node would for a missing function: a revert.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::transport::{ChainTransport, TxReceipt};
use crate::error::{CoreError, CoreResult};

/// What `send` does with the next submission
#[derive(Debug, Clone)]
pub enum SendOutcome {
    Mined,
    Reverted,
    Rejected(String),
}

pub struct MockTransport {
    responses: Mutex<HashMap<(Address, Bytes), CoreResult<Bytes>>>,
    calls: AtomicUsize,
    calls_by_target: Mutex<HashMap<Address, usize>>,
    disconnected: AtomicBool,
    call_delay: Mutex<Option<Duration>>,
    send_delay: Mutex<Option<Duration>>,
    send_outcome: Mutex<SendOutcome>,
    sent: Mutex<Vec<(Address, Bytes)>>,
    signer: Mutex<Option<Address>>,
    block: AtomicU64,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            calls_by_target: Mutex::new(HashMap::new()),
            disconnected: AtomicBool::new(false),
            call_delay: Mutex::new(None),
            send_delay: Mutex::new(None),
            send_outcome: Mutex::new(SendOutcome::Mined),
            sent: Mutex::new(Vec::new()),
            signer: Mutex::new(None),
            block: AtomicU64::new(1),
        }
    }

    /// Left-padded word for an address return value
    pub fn address_word(address: Address) -> U256 {
        U256::from_be_bytes(address.into_word().0)
    }

    pub fn respond<C: SolCall>(&self, to: Address, call: C, words: &[U256]) {
        let mut out = Vec::with_capacity(words.len() * 32);
        for word in words {
            out.extend_from_slice(&word.to_be_bytes::<32>());
        }
        self.respond_raw(to, call, out);
    }

    pub fn respond_raw<C: SolCall>(&self, to: Address, call: C, raw: Vec<u8>) {
        let key = (to, Bytes::from(call.abi_encode()));
        self.responses.lock().unwrap().insert(key, Ok(Bytes::from(raw)));
    }

    pub fn fail<C: SolCall>(&self, to: Address, call: C, err: CoreError) {
        let key = (to, Bytes::from(call.abi_encode()));
        self.responses.lock().unwrap().insert(key, Err(err));
    }

    /// Every subsequent call and send fails with `ChainUnavailable`
    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    pub fn set_call_delay(&self, delay: Duration) {
        *self.call_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_send_outcome(&self, outcome: SendOutcome) {
        *self.send_outcome.lock().unwrap() = outcome;
    }

    pub fn set_signer(&self, signer: Option<Address>) {
        *self.signer.lock().unwrap() = signer;
    }

    pub fn set_block(&self, block: u64) {
        self.block.store(block, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_to(&self, to: Address) -> usize {
        self.calls_by_target.lock().unwrap().get(&to).copied().unwrap_or(0)
    }

    pub fn sent(&self) -> Vec<(Address, Bytes)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainTransport for MockTransport {
    async fn call(&self, to: Address, input: Bytes) -> CoreResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.calls_by_target.lock().unwrap().entry(to).or_default() += 1;

        let delay = *self.call_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.disconnected.load(Ordering::SeqCst) {
            return Err(CoreError::unavailable("mock transport disconnected"));
        }

        self.responses
            .lock()
            .unwrap()
            .get(&(to, input))
            .cloned()
            .unwrap_or_else(|| Err(CoreError::decode("execution reverted")))
    }

    async fn send(&self, to: Address, input: Bytes) -> CoreResult<TxReceipt> {
        if self.signer().is_none() {
            return Err(CoreError::rejected("no signer configured"));
        }

        let delay = *self.send_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.disconnected.load(Ordering::SeqCst) {
            return Err(CoreError::rejected("mock transport disconnected"));
        }

        let outcome = self.send_outcome.lock().unwrap().clone();
        if let SendOutcome::Rejected(reason) = outcome {
            return Err(CoreError::rejected(reason));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push((to, input));

        Ok(TxReceipt {
            tx_hash: B256::with_last_byte(sent.len() as u8),
            block_number: Some(self.block.load(Ordering::SeqCst)),
            gas_used: 21_000,
            success: matches!(outcome, SendOutcome::Mined),
        })
    }

    async fn block_number(&self) -> CoreResult<u64> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(CoreError::unavailable("mock transport disconnected"));
        }
        Ok(self.block.load(Ordering::SeqCst))
    }

    fn signer(&self) -> Option<Address> {
        *self.signer.lock().unwrap()
    }
}
