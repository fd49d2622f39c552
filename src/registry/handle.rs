use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Logical names of the statically registered contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractName {
    RewardToken,
    SecondaryRewardToken,
    MasterChef,
    Referral,
    Presale,
}

impl ContractName {
    pub const ALL: [ContractName; 5] = [
        ContractName::RewardToken,
        ContractName::SecondaryRewardToken,
        ContractName::MasterChef,
        ContractName::Referral,
        ContractName::Presale,
    ];

    /// Interface shape behind this name
    pub fn kind(&self) -> ContractKind {
        match self {
            ContractName::RewardToken => ContractKind::RewardToken,
            ContractName::SecondaryRewardToken => ContractKind::Erc20,
            ContractName::MasterChef => ContractKind::Staking,
            ContractName::Referral => ContractKind::Referral,
            ContractName::Presale => ContractKind::Presale,
        }
    }
}

impl std::fmt::Display for ContractName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractName::RewardToken => write!(f, "reward-token"),
            ContractName::SecondaryRewardToken => write!(f, "secondary-reward-token"),
            ContractName::MasterChef => write!(f, "masterchef"),
            ContractName::Referral => write!(f, "referral"),
            ContractName::Presale => write!(f, "presale"),
        }
    }
}

/// Capability set of a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    /// Plain ERC-20 (also used for LP pair tokens)
    Erc20,
    /// ERC-20 with max/minted/burned supply accessors
    RewardToken,
    Staking,
    Referral,
    Presale,
}

impl ContractKind {
    /// Whether a handle of this kind can serve ERC-20 reads
    pub fn is_erc20(&self) -> bool {
        matches!(self, ContractKind::Erc20 | ContractKind::RewardToken)
    }
}

/// A resolved, callable contract for one network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractHandle {
    pub address: Address,
    pub kind: ContractKind,
    /// `None` for ad-hoc ERC-20 handles built from an address
    pub name: Option<ContractName>,
}

impl ContractHandle {
    /// Generic ERC-20 accessor for any token address (LP tokens included)
    pub fn erc20(address: Address) -> Self {
        Self {
            address,
            kind: ContractKind::Erc20,
            name: None,
        }
    }

    /// Guard used by the reader before encoding a call
    pub fn expect(&self, kind: ContractKind) -> CoreResult<&Self> {
        let ok = match kind {
            ContractKind::Erc20 => self.kind.is_erc20(),
            other => self.kind == other,
        };
        if ok {
            Ok(self)
        } else {
            Err(CoreError::configuration(format!(
                "contract {} is {:?}, expected {:?}",
                self.label(),
                self.kind,
                kind
            )))
        }
    }

    pub fn label(&self) -> String {
        match self.name {
            Some(name) => name.to_string(),
            None => format!("{:?}", self.address),
        }
    }
}
