//! Contract Registry
//!
//! Maps a logical contract name plus network id to an address and an
//! interface kind. Ad-hoc ERC-20 handles (LP tokens) are built from an
//! address and never registered.

mod handle;
pub mod interfaces;
mod table;

pub use handle::{ContractHandle, ContractKind, ContractName};
pub use table::ContractRegistry;
