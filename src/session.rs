//! Session context
//!
//! The active network and account, passed explicitly to every engine call.
//! Changing either invalidates the cache groups keyed by the old value.

use alloy_primitives::Address;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheGroup, QueryCache};
use crate::error::CoreResult;
use crate::networks::NetworkCatalog;

/// Snapshot of who is asking and on which chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub network: u64,
    /// `None` for an anonymous session
    pub account: Option<Address>,
}

impl SessionContext {
    pub fn new(network: u64, account: Option<Address>) -> Self {
        Self { network, account }
    }

    pub fn anonymous(network: u64) -> Self {
        Self::new(network, None)
    }
}

pub struct Session {
    context: RwLock<SessionContext>,
    cache: QueryCache,
    networks: Arc<NetworkCatalog>,
}

impl Session {
    pub fn new(context: SessionContext, cache: QueryCache, networks: Arc<NetworkCatalog>) -> CoreResult<Self> {
        networks.get(context.network)?;
        Ok(Self {
            context: RwLock::new(context),
            cache,
            networks,
        })
    }

    pub async fn context(&self) -> SessionContext {
        *self.context.read().await
    }

    /// Connect, disconnect or switch account. Returns invalidated key count.
    pub async fn set_account(&self, account: Option<Address>) -> usize {
        let mut context = self.context.write().await;
        let previous = context.account;
        if previous == account {
            return 0;
        }
        context.account = account;
        drop(context);

        let groups: Vec<CacheGroup> = previous.into_iter().chain(account).map(CacheGroup::Account).collect();
        let count = self.cache.invalidate_groups(&groups).await;

        match account {
            Some(account) => info!("👤 Account set to {:?} ({} keys invalidated)", account, count),
            None => info!("👤 Account disconnected ({} keys invalidated)", count),
        }
        count
    }

    /// Follow a wallet-provider network change
    pub async fn switch_network(&self, network: u64) -> CoreResult<usize> {
        self.networks.get(network)?;

        let mut context = self.context.write().await;
        let previous = context.network;
        if previous == network {
            return Ok(0);
        }
        context.network = network;
        drop(context);

        let count = self.cache.invalidate_group(&CacheGroup::Network(previous)).await;
        info!("🌐 Switched network {} -> {} ({} keys invalidated)", previous, network, count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Metric, QueryKey};
    use crate::error::CoreError;
    use crate::networks::{FANTOM, MUMBAI};
    use std::time::Duration;

    async fn warm(cache: &QueryCache, key: QueryKey) {
        cache
            .get(key, Duration::from_secs(60), || async { Ok::<_, CoreError>(1u64) })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_invalidates_account_keys() {
        let cache = QueryCache::new();
        let account = Address::repeat_byte(0x42);
        let session = Session::new(
            SessionContext::new(FANTOM, Some(account)),
            cache.clone(),
            Arc::new(NetworkCatalog::builtin()),
        )
        .unwrap();

        let wallet = QueryKey::new(Metric::RewardInWallet, FANTOM).with_account(Some(account));
        let stats = QueryKey::new(Metric::ProtocolStats, FANTOM);
        warm(&cache, wallet).await;
        warm(&cache, stats).await;

        assert_eq!(session.set_account(None).await, 1);
        assert_eq!(session.context().await.account, None);
        assert!(cache.peek::<u64>(&wallet).await.unwrap().stale);
        assert!(!cache.peek::<u64>(&stats).await.unwrap().stale);

        assert_eq!(session.set_account(None).await, 0);
    }

    #[tokio::test]
    async fn test_network_switch_invalidates_old_network() {
        let cache = QueryCache::new();
        let session = Session::new(
            SessionContext::anonymous(FANTOM),
            cache.clone(),
            Arc::new(NetworkCatalog::builtin()),
        )
        .unwrap();

        warm(&cache, QueryKey::new(Metric::ProtocolStats, FANTOM)).await;
        assert_eq!(session.switch_network(MUMBAI).await.unwrap(), 1);
        assert_eq!(session.context().await.network, MUMBAI);
    }

    #[tokio::test]
    async fn test_unsupported_network_is_rejected() {
        let session = Session::new(
            SessionContext::anonymous(FANTOM),
            QueryCache::new(),
            Arc::new(NetworkCatalog::builtin()),
        )
        .unwrap();

        assert!(matches!(session.switch_network(1).await, Err(CoreError::Configuration(_))));
        assert_eq!(session.context().await.network, FANTOM);
        assert!(Session::new(SessionContext::anonymous(1), QueryCache::new(), Arc::new(NetworkCatalog::builtin())).is_err());
    }

    #[test]
    fn test_switching_back_keeps_account() {
        let account = Address::repeat_byte(0x07);
        let session = Session::new(
            SessionContext::new(FANTOM, Some(account)),
            QueryCache::new(),
            Arc::new(NetworkCatalog::builtin()),
        )
        .unwrap();

        tokio_test::block_on(async {
            tokio_test::assert_ok!(session.switch_network(MUMBAI).await);
            tokio_test::assert_ok!(session.switch_network(FANTOM).await);
            tokio_test::assert_err!(session.switch_network(0).await);
            assert_eq!(session.context().await, SessionContext::new(FANTOM, Some(account)));
        });
    }
}
