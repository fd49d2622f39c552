//! Per-network static configuration
//!
//! RPC endpoints, explorers, the quote token used for pricing, and the
//! pool/farm tables. Loaded once at startup and immutable afterwards.

use alloy_primitives::{address, Address};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};

pub const FANTOM: u64 = 250;
pub const MUMBAI: u64 = 80001;

const SECONDS_PER_YEAR: f64 = 31_536_000.0;

// ============================================
// TYPES
// ============================================

#[derive(Debug, Clone, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Token every price is expressed in
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuoteToken {
    pub symbol: &'static str,
    pub address: Address,
    pub decimals: u8,
}

/// Whether a descriptor sits in the pool list or the farm list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PoolCategory {
    Pool,
    Farm,
}

impl std::fmt::Display for PoolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolCategory::Pool => write!(f, "pool"),
            PoolCategory::Farm => write!(f, "farm"),
        }
    }
}

/// How a staked token gets a quote-denominated price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceRoute {
    /// Staked token is an LP pair; priced from its quote-side reserve
    PairLp,
    /// Staked token is priced through a token/quote pair
    ViaPair(Address),
    /// Staked token is priced through the LP token of another pid
    ViaPool(u64),
}

/// Immutable pool/farm configuration
#[derive(Debug, Clone, Serialize)]
pub struct PoolDescriptor {
    pub pid: u64,
    pub active: bool,
    /// Allocation weight used for the reward share
    pub multiplier: u32,
    pub deposit_fee_bps: u16,
    pub label: &'static str,
    pub dex: Option<&'static str>,
    pub decimals: u8,
    pub price_route: PriceRoute,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub chain_name: &'static str,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<&'static str>,
    pub block_explorer_urls: Vec<&'static str>,
    pub block_time_secs: f64,
    pub quote_token: Option<QuoteToken>,
    /// Pid whose LP prices the reward token (for APR)
    pub reward_price_pool: Option<u64>,
    pub pool_ids: Vec<u64>,
    pub farm_ids: Vec<u64>,
    pub pools: Vec<PoolDescriptor>,
}

impl NetworkInfo {
    pub fn descriptor(&self, pid: u64) -> CoreResult<&PoolDescriptor> {
        self.pools.iter().find(|p| p.pid == pid).ok_or_else(|| {
            CoreError::configuration(format!("pid {} not configured on network {}", pid, self.chain_id))
        })
    }

    /// Pools first, then farms, in configured order
    pub fn all_ids(&self) -> Vec<u64> {
        self.pool_ids.iter().chain(self.farm_ids.iter()).copied().collect()
    }

    pub fn category_of(&self, pid: u64) -> PoolCategory {
        if self.farm_ids.contains(&pid) {
            PoolCategory::Farm
        } else {
            PoolCategory::Pool
        }
    }

    pub fn ids_for(&self, category: PoolCategory) -> &[u64] {
        match category {
            PoolCategory::Pool => &self.pool_ids,
            PoolCategory::Farm => &self.farm_ids,
        }
    }

    pub fn blocks_per_year(&self) -> f64 {
        if self.block_time_secs <= 0.0 {
            return 0.0;
        }
        SECONDS_PER_YEAR / self.block_time_secs
    }

    /// Sum of multipliers across active descriptors
    pub fn total_multiplier(&self) -> u64 {
        self.pools
            .iter()
            .filter(|p| p.active)
            .map(|p| p.multiplier as u64)
            .sum()
    }

    pub fn default_rpc_url(&self) -> Option<&'static str> {
        self.rpc_urls.first().copied()
    }
}

// ============================================
// CATALOG
// ============================================

/// Every supported network, keyed by chain id
#[derive(Debug, Clone, Default)]
pub struct NetworkCatalog {
    networks: BTreeMap<u64, NetworkInfo>,
}

impl NetworkCatalog {
    pub fn new(networks: impl IntoIterator<Item = NetworkInfo>) -> Self {
        Self {
            networks: networks.into_iter().map(|n| (n.chain_id, n)).collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new([fantom(), mumbai()])
    }

    pub fn get(&self, chain_id: u64) -> CoreResult<&NetworkInfo> {
        self.networks
            .get(&chain_id)
            .ok_or_else(|| CoreError::configuration(format!("unsupported network {}", chain_id)))
    }

    pub fn ids(&self) -> Vec<u64> {
        self.networks.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkInfo> {
        self.networks.values()
    }
}

// ============================================
// BUILT-IN NETWORKS
// ============================================

fn fantom() -> NetworkInfo {
    // SpookySwap WFTM/USDC
    let wftm_usdc = address!("2b4C76d0dc16BE1C31D4C1DC53bF9B45987Fc75c");

    NetworkInfo {
        chain_id: FANTOM,
        chain_name: "Fantom Mainnet",
        native_currency: NativeCurrency { name: "Fantom", symbol: "FTM", decimals: 18 },
        rpc_urls: vec!["https://rpc.ftm.tools/"],
        block_explorer_urls: vec!["https://ftmscan.com/"],
        block_time_secs: 1.0,
        quote_token: Some(QuoteToken {
            symbol: "USDC",
            address: address!("04068DA6C83AFCFA0e13ba15A6696662335D5B75"),
            decimals: 6,
        }),
        reward_price_pool: Some(1),
        pool_ids: vec![0, 1, 2, 3, 4, 5, 6, 7],
        farm_ids: vec![8],
        pools: vec![
            pool(0, 40, 0, "REWARD", None, 18, PriceRoute::ViaPool(1)),
            pool(1, 40, 0, "REWARD-USDC LP", Some("SpookySwap"), 18, PriceRoute::PairLp),
            pool(2, 20, 400, "WFTM-USDC LP", Some("SpookySwap"), 18, PriceRoute::PairLp),
            pool(3, 10, 400, "WFTM", None, 18, PriceRoute::ViaPair(wftm_usdc)),
            pool(4, 10, 400, "USDC", None, 6, PriceRoute::PairLp),
            pool(5, 10, 400, "SECONDARY-USDC LP", Some("SpookySwap"), 18, PriceRoute::PairLp),
            pool(6, 10, 400, "DAI-USDC LP", Some("SpookySwap"), 18, PriceRoute::PairLp),
            pool(7, 10, 400, "SECONDARY-WFTM LP", Some("SpookySwap"), 18, PriceRoute::PairLp),
            pool(8, 80, 0, "REWARD-WFTM LP", Some("SpookySwap"), 18, PriceRoute::PairLp),
        ],
    }
}

fn mumbai() -> NetworkInfo {
    NetworkInfo {
        chain_id: MUMBAI,
        chain_name: "Mumbai",
        native_currency: NativeCurrency { name: "MATIC", symbol: "MATIC", decimals: 18 },
        rpc_urls: vec![
            "https://rpc-mumbai.maticvigil.com/",
            "https://matic-mumbai.chainstacklabs.com",
            "https://matic-testnet-archive-rpc.bwarelabs.com",
        ],
        block_explorer_urls: vec![
            "https://mumbai.polygonscan.com/",
            "https://polygon-explorer-mumbai.chainstacklabs.com/",
            "https://explorer-mumbai.maticvigil.com/",
        ],
        block_time_secs: 2.0,
        // No quote token deployed on the testnet: values read as zero
        quote_token: None,
        reward_price_pool: None,
        pool_ids: vec![1],
        farm_ids: vec![],
        pools: vec![pool(1, 40, 0, "REWARD-USDC LP", Some("Quickswap"), 18, PriceRoute::PairLp)],
    }
}

fn pool(
    pid: u64,
    multiplier: u32,
    deposit_fee_bps: u16,
    label: &'static str,
    dex: Option<&'static str>,
    decimals: u8,
    price_route: PriceRoute,
) -> PoolDescriptor {
    PoolDescriptor {
        pid,
        active: true,
        multiplier,
        deposit_fee_bps,
        label,
        dex,
        decimals,
        price_route,
    }
}
