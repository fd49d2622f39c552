//! Protocol client
//!
//! Metric requests go through the query cache to the aggregation engine or
//! the chain reader. Action requests go to the orchestrator. The session
//! decides which network and account every request is for.

mod metrics;

pub use metrics::{Countdown, PresaleInfo, PresalePhase, ReferralInfo, TokenStats};

use alloy_primitives::Address;
use futures::future::{join_all, try_join, try_join3};
use std::sync::Arc;
use std::time::Duration;

use crate::actions::{Action, ActionId, ActionOrchestrator, ActionRecord, InvokeOutcome};
use crate::aggregation::{AggregationEngine, HarvestSummary, PoolSnapshot, ProtocolSnapshot, RewardKind, REWARD_DECIMALS};
use crate::cache::{Cached, Metric, QueryCache, QueryKey};
use crate::chain::{ChainReader, ChainTransport, TokenAmount};
use crate::error::CoreResult;
use crate::networks::{NetworkCatalog, NetworkInfo, PoolCategory};
use crate::registry::{ContractName, ContractRegistry};
use crate::session::{Session, SessionContext};

pub struct ProtocolClient {
    engine: AggregationEngine,
    cache: QueryCache,
    orchestrator: ActionOrchestrator,
    session: Session,
    stale_after: Duration,
}

impl ProtocolClient {
    pub fn new(
        transport: Arc<dyn ChainTransport>,
        registry: Arc<ContractRegistry>,
        networks: Arc<NetworkCatalog>,
        context: SessionContext,
        stale_after: Duration,
    ) -> CoreResult<Self> {
        let cache = QueryCache::new();
        let session = Session::new(context, cache.clone(), networks.clone())?;
        let orchestrator = ActionOrchestrator::new(transport.clone(), registry.clone(), cache.clone());
        let engine = AggregationEngine::new(ChainReader::new(transport), registry, networks);

        Ok(Self {
            engine,
            cache,
            orchestrator,
            session,
            stale_after,
        })
    }

    pub async fn context(&self) -> SessionContext {
        self.session.context().await
    }

    pub async fn network(&self) -> CoreResult<NetworkInfo> {
        let ctx = self.context().await;
        self.engine.networks().get(ctx.network).cloned()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn set_account(&self, account: Option<Address>) -> usize {
        self.session.set_account(account).await
    }

    pub async fn switch_network(&self, network: u64) -> CoreResult<usize> {
        self.session.switch_network(network).await
    }

    // ============================================
    // WALLET + REWARDS
    // ============================================

    pub async fn reward_in_wallet(&self) -> CoreResult<Cached<TokenAmount>> {
        self.wallet_balance(Metric::RewardInWallet, ContractName::RewardToken).await
    }

    pub async fn secondary_in_wallet(&self) -> CoreResult<Cached<TokenAmount>> {
        self.wallet_balance(Metric::SecondaryInWallet, ContractName::SecondaryRewardToken)
            .await
    }

    async fn wallet_balance(&self, metric: Metric, token: ContractName) -> CoreResult<Cached<TokenAmount>> {
        let ctx = self.context().await;
        let key = QueryKey::new(metric, ctx.network).with_account(ctx.account);
        let engine = self.engine.clone();

        self.cache
            .get(key, self.stale_after, move || async move {
                let handle = engine.registry().resolve(token, ctx.network)?;
                let raw = engine.reader().balance_of(&handle, ctx.account).await?;
                Ok(TokenAmount::new(raw, REWARD_DECIMALS))
            })
            .await
    }

    pub async fn reward_to_harvest(&self) -> CoreResult<Cached<HarvestSummary>> {
        self.to_harvest(Metric::RewardToHarvest, RewardKind::Primary).await
    }

    pub async fn secondary_to_harvest(&self) -> CoreResult<Cached<HarvestSummary>> {
        self.to_harvest(Metric::SecondaryToHarvest, RewardKind::Secondary).await
    }

    async fn to_harvest(&self, metric: Metric, kind: RewardKind) -> CoreResult<Cached<HarvestSummary>> {
        let ctx = self.context().await;
        let key = QueryKey::new(metric, ctx.network).with_account(ctx.account);
        let engine = self.engine.clone();

        self.cache
            .get(key, self.stale_after, move || async move { engine.harvestable(&ctx, kind).await })
            .await
    }

    // ============================================
    // PROTOCOL
    // ============================================

    pub async fn reward_token_stats(&self) -> CoreResult<Cached<TokenStats>> {
        let ctx = self.context().await;
        let key = QueryKey::new(Metric::RewardTokenStats, ctx.network);
        let engine = self.engine.clone();

        self.cache
            .get(key, self.stale_after, move || async move {
                let token = engine.registry().resolve(ContractName::RewardToken, ctx.network)?;
                let reader = engine.reader();
                let (max, minted, burned) = try_join3(
                    reader.max_supply(&token),
                    reader.total_minted(&token),
                    reader.total_burned(&token),
                )
                .await?;

                let amount = |raw| TokenAmount::new(raw, REWARD_DECIMALS);
                Ok(TokenStats::new(amount(max), amount(minted), amount(burned)))
            })
            .await
    }

    /// TVL over every configured pool and farm
    pub async fn protocol_stats(&self) -> CoreResult<Cached<ProtocolSnapshot>> {
        let ctx = self.context().await;
        let key = QueryKey::new(Metric::ProtocolStats, ctx.network);
        let network = self.engine.networks().get(ctx.network)?.clone();
        let engine = self.engine.clone();

        self.cache
            .get(key, self.stale_after, move || async move {
                engine
                    .compute_protocol_snapshot(&ctx, &network.pool_ids, &network.farm_ids)
                    .await
            })
            .await
    }

    pub async fn pool_snapshot(&self, pid: u64) -> CoreResult<Cached<PoolSnapshot>> {
        let ctx = self.context().await;
        self.pool_snapshot_for(ctx, pid).await
    }

    async fn pool_snapshot_for(&self, ctx: SessionContext, pid: u64) -> CoreResult<Cached<PoolSnapshot>> {
        let key = QueryKey::new(Metric::PoolSnapshot, ctx.network)
            .with_account(ctx.account)
            .with_pool(pid);
        let engine = self.engine.clone();

        self.cache
            .get(key, self.stale_after, move || async move { engine.compute_pool_snapshot(&ctx, pid).await })
            .await
    }

    /// Snapshots of every pool (or farm) in configured order
    pub async fn pools(&self, category: PoolCategory) -> CoreResult<Vec<(u64, CoreResult<Cached<PoolSnapshot>>)>> {
        let ctx = self.context().await;
        let network = self.engine.networks().get(ctx.network)?;
        let pids = network.ids_for(category).to_vec();

        let snapshots = join_all(pids.iter().map(|pid| self.pool_snapshot_for(ctx, *pid))).await;
        Ok(pids.into_iter().zip(snapshots).collect())
    }

    pub async fn presale_info(&self) -> CoreResult<Cached<PresaleInfo>> {
        let ctx = self.context().await;
        let key = QueryKey::new(Metric::PresaleInfo, ctx.network);
        let block_time = self.engine.networks().get(ctx.network)?.block_time_secs;
        let engine = self.engine.clone();

        self.cache
            .get(key, self.stale_after, move || async move {
                let presale = engine.registry().resolve(ContractName::Presale, ctx.network)?;
                let reader = engine.reader();
                let (start, end, current) = try_join3(
                    reader.presale_start_block(&presale),
                    reader.presale_end_block(&presale),
                    reader.block_number(),
                )
                .await?;
                Ok(PresaleInfo::new(start, end, current, block_time))
            })
            .await
    }

    pub async fn referral_info(&self) -> CoreResult<Cached<ReferralInfo>> {
        let ctx = self.context().await;
        let key = QueryKey::new(Metric::Referral, ctx.network).with_account(ctx.account);
        let engine = self.engine.clone();

        self.cache
            .get(key, self.stale_after, move || async move {
                let referral = engine.registry().resolve(ContractName::Referral, ctx.network)?;
                let reader = engine.reader();
                let (referrer, referrals) = try_join(
                    reader.referrer_of(&referral, ctx.account),
                    reader.referrals_count(&referral, ctx.account),
                )
                .await?;
                Ok(ReferralInfo { referrer, referrals })
            })
            .await
    }

    // ============================================
    // ACTIONS
    // ============================================

    /// Claim both rewards from every pool that has any pending
    pub async fn harvest_all(&self) -> CoreResult<InvokeOutcome> {
        let ctx = self.context().await;
        let network = self.engine.networks().get(ctx.network)?;

        let (primary, secondary) = try_join(self.reward_to_harvest(), self.secondary_to_harvest()).await?;
        let claimable = primary.value.harvestable_pids();
        let claimable_secondary = secondary.value.harvestable_pids();
        let pids = network
            .all_ids()
            .into_iter()
            .filter(|pid| claimable.contains(pid) || claimable_secondary.contains(pid))
            .collect();

        self.orchestrator.invoke(&ctx, Action::HarvestAll { pids }).await
    }

    pub async fn harvest(&self, pid: u64) -> CoreResult<InvokeOutcome> {
        let ctx = self.context().await;
        self.engine.networks().get(ctx.network)?.descriptor(pid)?;
        self.orchestrator.invoke(&ctx, Action::Harvest { pid }).await
    }

    /// Approve the staking contract to pull the LP token of `pid`
    pub async fn approve(&self, pid: u64) -> CoreResult<InvokeOutcome> {
        let ctx = self.context().await;
        self.engine.networks().get(ctx.network)?.descriptor(pid)?;
        let chef = self.engine.registry().resolve(ContractName::MasterChef, ctx.network)?;
        let meta = self.engine.reader().pool_info(&chef, pid).await?;

        self.orchestrator
            .invoke(
                &ctx,
                Action::Approve {
                    pid,
                    lp_token: meta.lp_token,
                },
            )
            .await
    }

    pub async fn action_status(&self, id: ActionId) -> ActionRecord {
        self.orchestrator.status(id).await
    }
}
