use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use serde::Serialize;
use std::fmt;

use crate::cache::CacheGroup;
use crate::registry::interfaces::{IMasterChef, IERC20};

/// Identity used for the single-pending-invocation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionId {
    HarvestAll,
    Harvest(u64),
    Approve(u64),
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionId::HarvestAll => write!(f, "harvest-all"),
            ActionId::Harvest(pid) => write!(f, "harvest #{}", pid),
            ActionId::Approve(pid) => write!(f, "approve #{}", pid),
        }
    }
}

/// A user-initiated write with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Claim from every listed pid, one transaction each
    HarvestAll { pids: Vec<u64> },
    Harvest { pid: u64 },
    /// Let the staking contract pull `lp_token`
    Approve { pid: u64, lp_token: Address },
}

/// One transaction of an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxStep {
    pub to: Address,
    pub input: Bytes,
    pub description: String,
}

impl Action {
    pub fn id(&self) -> ActionId {
        match self {
            Action::HarvestAll { .. } => ActionId::HarvestAll,
            Action::Harvest { pid } => ActionId::Harvest(*pid),
            Action::Approve { pid, .. } => ActionId::Approve(*pid),
        }
    }

    /// Transactions to send, in order
    pub fn steps(&self, chef: Address) -> Vec<TxStep> {
        match self {
            Action::HarvestAll { pids } => pids.iter().map(|pid| harvest_step(chef, *pid)).collect(),
            Action::Harvest { pid } => vec![harvest_step(chef, *pid)],
            Action::Approve { pid, lp_token } => vec![TxStep {
                to: *lp_token,
                input: IERC20::approveCall {
                    spender: chef,
                    amount: U256::MAX,
                }
                .abi_encode()
                .into(),
                description: format!("approve LP of pool {}", pid),
            }],
        }
    }

    /// Cache groups made stale by a successful run
    pub fn invalidates(&self, account: Address) -> Vec<CacheGroup> {
        match self {
            Action::HarvestAll { .. } | Action::Harvest { .. } => {
                vec![CacheGroup::WalletBalance(account), CacheGroup::PendingReward(account)]
            }
            Action::Approve { .. } => vec![CacheGroup::Allowance(account)],
        }
    }
}

/// Depositing zero claims pending rewards without moving stake
fn harvest_step(chef: Address, pid: u64) -> TxStep {
    TxStep {
        to: chef,
        input: IMasterChef::depositCall {
            pid: U256::from(pid),
            amount: U256::ZERO,
            referrer: Address::ZERO,
        }
        .abi_encode()
        .into(),
        description: format!("harvest pool {}", pid),
    }
}
