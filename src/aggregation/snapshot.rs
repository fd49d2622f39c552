use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chain::TokenAmount;
use crate::error::CoreError;
use crate::networks::PoolCategory;

/// One pool's contribution to a protocol snapshot
#[derive(Debug, Clone, Serialize)]
pub struct PoolValue {
    pub pid: u64,
    pub category: PoolCategory,
    pub total_staked: f64,
    pub price: f64,
    pub value_locked: f64,
    /// `false` when the pool's reads failed and it contributed zero
    pub priced: bool,
}

impl PoolValue {
    pub(crate) fn absent(pid: u64, category: PoolCategory) -> Self {
        Self {
            pid,
            category,
            total_staked: 0.0,
            price: 0.0,
            value_locked: 0.0,
            priced: false,
        }
    }
}

/// A per-pool read failure absorbed during aggregation
#[derive(Debug, Clone, Serialize)]
pub struct PoolFailure {
    pub pid: u64,
    pub error: CoreError,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProtocolSnapshot {
    pub total_value_locked: f64,
    pub value_in_farms: f64,
    pub value_in_pools: f64,
    /// Input order: pool ids first, then farm ids
    pub pools: Vec<PoolValue>,
    pub failures: Vec<PoolFailure>,
    pub computed_at: DateTime<Utc>,
}

impl ProtocolSnapshot {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// User-scoped part of a pool snapshot. All zero when no account is connected.
#[derive(Debug, Clone, Serialize)]
pub struct UserPosition {
    pub staked: TokenAmount,
    pub pending_reward: TokenAmount,
    pub approved: bool,
}

impl UserPosition {
    pub fn has_staked(&self) -> bool {
        !self.staked.is_zero()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    pub pid: u64,
    pub category: PoolCategory,
    pub label: &'static str,
    pub active: bool,
    pub multiplier: u32,
    pub deposit_fee_bps: u16,
    pub lp_token: Address,
    pub total_staked: TokenAmount,
    pub price: f64,
    pub value_locked: f64,
    /// Percent per year, simple
    pub apr: f64,
    /// Percent per year, compounded daily
    pub apy: f64,
    pub user: UserPosition,
    pub computed_at: DateTime<Utc>,
}

/// Which of the two reward tokens a harvest read is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RewardKind {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestSummary {
    pub kind: RewardKind,
    pub total: TokenAmount,
    pub per_pool: Vec<(u64, TokenAmount)>,
    pub failures: Vec<PoolFailure>,
}

impl HarvestSummary {
    /// Pids with something to claim, in configured order
    pub fn harvestable_pids(&self) -> Vec<u64> {
        self.per_pool
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(pid, _)| *pid)
            .collect()
    }
}
