use alloy_primitives::{address, Address};
use std::collections::HashMap;
use tracing::debug;

use super::handle::{ContractHandle, ContractName};
use crate::error::{CoreError, CoreResult};
use crate::networks::{FANTOM, MUMBAI};

/// Static name -> (network -> address) lookup table
///
/// Side-effect free. Built once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    addresses: HashMap<ContractName, HashMap<u64, Address>>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the deployed protocol contracts
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(ContractName::Referral, FANTOM, address!("24F3282A439EBd13a4F24fE8756a1d6aaC65570F"));
        registry.register(ContractName::Referral, MUMBAI, address!("8295CCCA26e2e4396061515B0b72731BDf5796C1"));

        registry.register(ContractName::MasterChef, FANTOM, address!("c5F43e0418754f39494a23220a485C5fB5cBC0b6"));
        registry.register(ContractName::MasterChef, MUMBAI, address!("A3dc6b430A90D61e7f1C7800d43Bd67b8a06D597"));

        registry.register(ContractName::RewardToken, FANTOM, address!("b508A36a19251b2AC07b33EB7e5505eE46B0C5eB"));
        registry.register(ContractName::RewardToken, MUMBAI, address!("5EB25908Abf8764CB101bE704d6Bb4a8d5254f72"));

        // Same deployment on both networks
        registry.register(ContractName::SecondaryRewardToken, FANTOM, address!("e0654C8e6fd4D733349ac7E09f6f23DA256bF475"));
        registry.register(ContractName::SecondaryRewardToken, MUMBAI, address!("e0654C8e6fd4D733349ac7E09f6f23DA256bF475"));

        registry.register(ContractName::Presale, FANTOM, address!("41013D1521B20CA67397e7c65256bfb2975FAAc8"));
        registry.register(ContractName::Presale, MUMBAI, address!("807Be9676f72390bCaB19f914f770d9713a2d9e0"));

        registry
    }

    pub fn register(&mut self, name: ContractName, network_id: u64, address: Address) -> &mut Self {
        self.addresses.entry(name).or_default().insert(network_id, address);
        self
    }

    /// Resolve a callable handle for `name` on `network_id`
    pub fn resolve(&self, name: ContractName, network_id: u64) -> CoreResult<ContractHandle> {
        let table = self
            .addresses
            .get(&name)
            .ok_or_else(|| CoreError::configuration(format!("unknown contract {}", name)))?;

        let address = table.get(&network_id).copied().ok_or_else(|| {
            CoreError::configuration(format!("{} has no address on network {}", name, network_id))
        })?;

        Ok(ContractHandle {
            address,
            kind: name.kind(),
            name: Some(name),
        })
    }

    /// Every registered contract must cover every supported network
    pub fn validate_coverage(&self, network_ids: &[u64]) -> CoreResult<()> {
        for name in ContractName::ALL {
            for &network_id in network_ids {
                self.resolve(name, network_id)?;
            }
        }
        debug!(
            "Registry covers {} contracts on {} networks",
            ContractName::ALL.len(),
            network_ids.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ContractKind;

    #[test]
    fn test_builtin_covers_supported_networks() {
        let registry = ContractRegistry::builtin();
        assert!(registry.validate_coverage(&[FANTOM, MUMBAI]).is_ok());
    }

    #[test]
    fn test_resolve_returns_typed_handle() {
        let registry = ContractRegistry::builtin();
        let chef = registry.resolve(ContractName::MasterChef, FANTOM).unwrap();
        assert_eq!(chef.kind, ContractKind::Staking);
        assert_eq!(chef.address, address!("c5F43e0418754f39494a23220a485C5fB5cBC0b6"));
    }

    #[test]
    fn test_unsupported_network_is_configuration_error() {
        let registry = ContractRegistry::builtin();
        let err = registry.resolve(ContractName::Referral, 1).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
        assert!(registry.validate_coverage(&[FANTOM, 1]).is_err());
    }

    #[test]
    fn test_unknown_name_is_configuration_error() {
        let registry = ContractRegistry::new();
        assert!(matches!(
            registry.resolve(ContractName::Presale, FANTOM),
            Err(CoreError::Configuration(_))
        ));
    }
}
