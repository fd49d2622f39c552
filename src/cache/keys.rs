use alloy_primitives::Address;
use serde::Serialize;
use std::fmt;

/// Every metric the client can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    RewardInWallet,
    SecondaryInWallet,
    RewardToHarvest,
    SecondaryToHarvest,
    RewardTokenStats,
    ProtocolStats,
    PoolSnapshot,
    Referral,
    PresaleInfo,
}

/// Logical invalidation groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CacheGroup {
    /// Everything read on a network
    Network(u64),
    /// Everything scoped to one account, on any network
    Account(Address),
    WalletBalance(Address),
    PendingReward(Address),
    Allowance(Address),
    /// Account-independent protocol metrics of a network
    Protocol(u64),
}

/// Metric name plus the parameters it was computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QueryKey {
    pub metric: Metric,
    pub network: u64,
    pub account: Option<Address>,
    pub pool: Option<u64>,
}

impl QueryKey {
    pub fn new(metric: Metric, network: u64) -> Self {
        Self {
            metric,
            network,
            account: None,
            pool: None,
        }
    }

    pub fn with_account(mut self, account: Option<Address>) -> Self {
        self.account = account;
        self
    }

    pub fn with_pool(mut self, pid: u64) -> Self {
        self.pool = Some(pid);
        self
    }

    /// Groups this key belongs to
    pub fn groups(&self) -> Vec<CacheGroup> {
        let mut groups = vec![CacheGroup::Network(self.network)];

        let Some(account) = self.account else {
            if !matches!(self.metric, Metric::Referral) {
                groups.push(CacheGroup::Protocol(self.network));
            }
            return groups;
        };

        groups.push(CacheGroup::Account(account));
        match self.metric {
            Metric::RewardInWallet | Metric::SecondaryInWallet => {
                groups.push(CacheGroup::WalletBalance(account));
            }
            Metric::RewardToHarvest | Metric::SecondaryToHarvest => {
                groups.push(CacheGroup::PendingReward(account));
            }
            Metric::PoolSnapshot => {
                groups.push(CacheGroup::PendingReward(account));
                groups.push(CacheGroup::Allowance(account));
            }
            _ => {}
        }
        groups
    }

    pub fn in_group(&self, group: &CacheGroup) -> bool {
        self.groups().contains(group)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.metric, self.network)?;
        if let Some(account) = self.account {
            write!(f, "/{:?}", account)?;
        }
        if let Some(pid) = self.pool {
            write!(f, "#{}", pid)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_keys_join_balance_group() {
        let account = Address::repeat_byte(0x42);
        let key = QueryKey::new(Metric::RewardInWallet, 250).with_account(Some(account));
        assert!(key.in_group(&CacheGroup::WalletBalance(account)));
        assert!(key.in_group(&CacheGroup::Account(account)));
        assert!(key.in_group(&CacheGroup::Network(250)));
        assert!(!key.in_group(&CacheGroup::PendingReward(account)));
        assert!(!key.in_group(&CacheGroup::WalletBalance(Address::repeat_byte(0x43))));
    }

    #[test]
    fn test_anonymous_keys_are_protocol_scoped() {
        let key = QueryKey::new(Metric::ProtocolStats, 250);
        assert_eq!(key.groups(), vec![CacheGroup::Network(250), CacheGroup::Protocol(250)]);
    }

    #[test]
    fn test_pool_snapshot_depends_on_rewards_and_allowance() {
        let account = Address::repeat_byte(0x42);
        let key = QueryKey::new(Metric::PoolSnapshot, 250).with_account(Some(account)).with_pool(3);
        assert!(key.in_group(&CacheGroup::PendingReward(account)));
        assert!(key.in_group(&CacheGroup::Allowance(account)));
        assert_eq!(key.to_string(), format!("PoolSnapshot@250/{:?}#3", account));
    }
}
