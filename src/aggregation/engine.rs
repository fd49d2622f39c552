use alloy_primitives::Address;
use chrono::Utc;
use futures::future::{join_all, try_join};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::pricing::{apr_to_apy, compute_apr, reward_token_price, staked_token_price, REWARD_DECIMALS};
use super::snapshot::{
    HarvestSummary, PoolFailure, PoolSnapshot, PoolValue, ProtocolSnapshot, RewardKind, UserPosition,
};
use crate::chain::{to_f64, ChainReader, TokenAmount};
use crate::error::{CoreError, CoreResult};
use crate::networks::{NetworkCatalog, NetworkInfo, PoolCategory, PoolDescriptor};
use crate::registry::{ContractHandle, ContractName, ContractRegistry};
use crate::session::SessionContext;

/// Fans reads out across pools and reduces them into snapshots
///
/// Stateless between passes. Everything a pass computes is owned by that
/// pass and handed back to the caller.
#[derive(Clone)]
pub struct AggregationEngine {
    reader: ChainReader,
    registry: Arc<ContractRegistry>,
    networks: Arc<NetworkCatalog>,
}

impl AggregationEngine {
    pub fn new(reader: ChainReader, registry: Arc<ContractRegistry>, networks: Arc<NetworkCatalog>) -> Self {
        Self {
            reader,
            registry,
            networks,
        }
    }

    pub fn reader(&self) -> &ChainReader {
        &self.reader
    }

    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    pub fn networks(&self) -> &NetworkCatalog {
        &self.networks
    }

    // ============================================
    // PROTOCOL SNAPSHOT
    // ============================================

    /// TVL across `pool_ids` and `farm_ids`
    ///
    /// A failing pool contributes zero and is listed in `failures`. The call
    /// itself only fails on bad configuration, or when every pool failed
    /// because the chain could not be reached.
    pub async fn compute_protocol_snapshot(
        &self,
        ctx: &SessionContext,
        pool_ids: &[u64],
        farm_ids: &[u64],
    ) -> CoreResult<ProtocolSnapshot> {
        let start = Instant::now();
        let network = self.networks.get(ctx.network)?;
        let chef = self.registry.resolve(ContractName::MasterChef, ctx.network)?;

        let entries: Vec<(&PoolDescriptor, PoolCategory)> = pool_ids
            .iter()
            .map(|pid| (*pid, PoolCategory::Pool))
            .chain(farm_ids.iter().map(|pid| (*pid, PoolCategory::Farm)))
            .map(|(pid, category)| network.descriptor(pid).map(|d| (d, category)))
            .collect::<CoreResult<_>>()?;

        // Phase 1: LP address per pool
        let metas = join_all(entries.iter().map(|(d, _)| self.reader.pool_info(&chef, d.pid))).await;

        // Phase 2: staked amount and price per pool
        let values = join_all(entries.iter().zip(metas).map(|((descriptor, _), meta)| {
            let chef = &chef;
            async move {
                let meta = meta?;
                self.pool_value(network, chef, descriptor, meta.lp_token).await
            }
        }))
        .await;

        let mut pools = Vec::with_capacity(entries.len());
        let mut failures = Vec::new();
        let mut value_in_pools = 0.0;
        let mut value_in_farms = 0.0;

        for ((descriptor, category), result) in entries.iter().zip(values) {
            match result {
                Ok((staked, price)) => {
                    let total_staked = staked.to_f64();
                    let value_locked = total_staked * price;
                    match category {
                        PoolCategory::Pool => value_in_pools += value_locked,
                        PoolCategory::Farm => value_in_farms += value_locked,
                    }
                    pools.push(PoolValue {
                        pid: descriptor.pid,
                        category: *category,
                        total_staked,
                        price,
                        value_locked,
                        priced: true,
                    });
                }
                Err(error) => {
                    warn!("⚠️ {} {} skipped: {}", category, descriptor.pid, error);
                    pools.push(PoolValue::absent(descriptor.pid, *category));
                    failures.push(PoolFailure {
                        pid: descriptor.pid,
                        error,
                    });
                }
            }
        }

        if !entries.is_empty()
            && failures.len() == entries.len()
            && failures.iter().all(|f| f.error.is_unavailable())
        {
            return Err(CoreError::unavailable(format!(
                "all {} pool reads failed on network {}",
                entries.len(),
                ctx.network
            )));
        }

        let total_value_locked = value_in_pools + value_in_farms;
        info!(
            "📊 TVL {:.2} ({} pools, {} farms, {} failed) in {:?}",
            total_value_locked,
            pool_ids.len(),
            farm_ids.len(),
            failures.len(),
            start.elapsed()
        );

        Ok(ProtocolSnapshot {
            total_value_locked,
            value_in_farms,
            value_in_pools,
            pools,
            failures,
            computed_at: Utc::now(),
        })
    }

    /// (amount staked in the chef, quote price per whole token)
    async fn pool_value(
        &self,
        network: &NetworkInfo,
        chef: &ContractHandle,
        descriptor: &PoolDescriptor,
        lp_token: Address,
    ) -> CoreResult<(TokenAmount, f64)> {
        let lp = ContractHandle::erc20(lp_token);
        let (staked, price) = try_join(
            self.reader.balance_of(&lp, Some(chef.address)),
            staked_token_price(&self.reader, network, chef, descriptor, lp_token),
        )
        .await?;

        Ok((TokenAmount::new(staked, descriptor.decimals), price))
    }

    // ============================================
    // POOL SNAPSHOT
    // ============================================

    /// Full public and user view of one pool. Errors propagate.
    pub async fn compute_pool_snapshot(&self, ctx: &SessionContext, pid: u64) -> CoreResult<PoolSnapshot> {
        let network = self.networks.get(ctx.network)?;
        let chef = self.registry.resolve(ContractName::MasterChef, ctx.network)?;
        let descriptor = network.descriptor(pid)?;

        let meta = self.reader.pool_info(&chef, pid).await?;
        let lp = ContractHandle::erc20(meta.lp_token);

        let public = async {
            try_join(
                self.pool_value(network, &chef, descriptor, meta.lp_token),
                try_join(
                    self.reader.reward_per_block(&chef),
                    reward_token_price(&self.reader, network, &chef),
                ),
            )
            .await
        };
        let user = async {
            try_join(
                self.reader.user_stake(&chef, pid, ctx.account),
                try_join(
                    self.reader.pending_reward(&chef, pid, ctx.account),
                    self.reader.allowance(&lp, ctx.account, chef.address),
                ),
            )
            .await
        };

        let (((total_staked, price), (reward_per_block, reward_price)), (staked, (pending, allowance))) =
            try_join(public, user).await?;

        let value_locked = total_staked.to_f64() * price;
        let apr = if descriptor.active {
            compute_apr(
                descriptor.multiplier,
                network.total_multiplier(),
                to_f64(reward_per_block, REWARD_DECIMALS),
                network.blocks_per_year(),
                reward_price,
                value_locked,
            )
        } else {
            0.0
        };

        debug!("Pool {} value {:.2} apr {:.2}%", pid, value_locked, apr);

        Ok(PoolSnapshot {
            pid,
            category: network.category_of(pid),
            label: descriptor.label,
            active: descriptor.active,
            multiplier: descriptor.multiplier,
            deposit_fee_bps: meta.deposit_fee_bps,
            lp_token: meta.lp_token,
            total_staked,
            price,
            value_locked,
            apr,
            apy: apr_to_apy(apr),
            user: UserPosition {
                staked: TokenAmount::new(staked, descriptor.decimals),
                pending_reward: TokenAmount::new(pending, REWARD_DECIMALS),
                approved: !allowance.is_zero(),
            },
            computed_at: Utc::now(),
        })
    }

    /// One snapshot per id, in input order, each independently failable
    pub async fn compute_pool_snapshots(&self, ctx: &SessionContext, pids: &[u64]) -> Vec<CoreResult<PoolSnapshot>> {
        join_all(pids.iter().map(|pid| self.compute_pool_snapshot(ctx, *pid))).await
    }

    // ============================================
    // HARVESTABLE REWARDS
    // ============================================

    /// Pending rewards of `kind` summed over every configured pool and farm
    pub async fn harvestable(&self, ctx: &SessionContext, kind: RewardKind) -> CoreResult<HarvestSummary> {
        let network = self.networks.get(ctx.network)?;
        let chef = self.registry.resolve(ContractName::MasterChef, ctx.network)?;
        let pids = network.all_ids();

        let reads = join_all(pids.iter().map(|pid| {
            let chef = &chef;
            async move {
                match kind {
                    RewardKind::Primary => self.reader.pending_reward(chef, *pid, ctx.account).await,
                    RewardKind::Secondary => self.reader.pending_secondary_reward(chef, *pid, ctx.account).await,
                }
            }
        }))
        .await;

        let mut total = TokenAmount::zero(REWARD_DECIMALS);
        let mut per_pool = Vec::with_capacity(pids.len());
        let mut failures = Vec::new();

        for (pid, result) in pids.iter().zip(reads) {
            match result {
                Ok(raw) => {
                    let amount = TokenAmount::new(raw, REWARD_DECIMALS);
                    total = total.saturating_add(amount);
                    per_pool.push((*pid, amount));
                }
                Err(error) => {
                    warn!("⚠️ Pending {:?} reward for {} skipped: {}", kind, pid, error);
                    failures.push(PoolFailure { pid: *pid, error });
                }
            }
        }

        if !pids.is_empty() && failures.len() == pids.len() && failures.iter().all(|f| f.error.is_unavailable()) {
            return Err(CoreError::unavailable("all pending reward reads failed"));
        }

        Ok(HarvestSummary {
            kind,
            total,
            per_pool,
            failures,
        })
    }
}
