//! Chain access: transport seam, typed reads and unit handling

mod reader;
mod rpc;
mod transport;
mod units;

#[cfg(test)]
pub(crate) mod mock;

pub use reader::{ChainReader, PoolMetadata};
pub use rpc::{RpcTransport, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
pub use transport::{ChainTransport, TxReceipt};
pub use units::{to_f64, TokenAmount};
