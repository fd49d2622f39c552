//! Staged chain state for engine, cache and orchestrator tests

use alloy_primitives::{Address, U256};
use std::sync::Arc;

use super::AggregationEngine;
use crate::chain::mock::MockTransport;
use crate::chain::ChainReader;
use crate::networks::{NativeCurrency, NetworkCatalog, NetworkInfo, PoolDescriptor, PriceRoute, QuoteToken};
use crate::registry::interfaces::{IMasterChef, IPair, IERC20};
use crate::registry::{ContractName, ContractRegistry};
use crate::session::SessionContext;

pub const TEST_NETWORK: u64 = 31337;

const QUOTE_DECIMALS: u8 = 6;
const PAIR_DEPTH: u64 = 1000;

pub fn quote() -> Address {
    Address::with_last_byte(0x05)
}

pub fn chef() -> Address {
    Address::repeat_byte(0xC0)
}

pub fn reward_token() -> Address {
    Address::repeat_byte(0xA1)
}

pub fn secondary_token() -> Address {
    Address::repeat_byte(0xA2)
}

pub fn account() -> Address {
    Address::repeat_byte(0x42)
}

pub fn lp(pid: u64) -> Address {
    Address::with_last_byte(0x10 + pid as u8)
}

pub fn pair(pid: u64) -> Address {
    Address::with_last_byte(0x30 + pid as u8)
}

pub fn token(pid: u64) -> Address {
    Address::with_last_byte(0x50 + pid as u8)
}

pub fn whole(amount: u64, decimals: u8) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(decimals))
}

pub fn test_network(pool_ids: &[u64], farm_ids: &[u64]) -> NetworkInfo {
    let pools = pool_ids
        .iter()
        .chain(farm_ids)
        .map(|pid| PoolDescriptor {
            pid: *pid,
            active: true,
            multiplier: 10,
            deposit_fee_bps: 0,
            label: "TEST-LP",
            dex: None,
            decimals: 18,
            price_route: PriceRoute::ViaPair(pair(*pid)),
        })
        .collect();

    NetworkInfo {
        chain_id: TEST_NETWORK,
        chain_name: "Devnet",
        native_currency: NativeCurrency { name: "Ether", symbol: "ETH", decimals: 18 },
        rpc_urls: vec!["http://localhost:8545"],
        block_explorer_urls: vec![],
        block_time_secs: 1.0,
        quote_token: Some(QuoteToken {
            symbol: "USDC",
            address: quote(),
            decimals: QUOTE_DECIMALS,
        }),
        reward_price_pool: Some(0),
        pool_ids: pool_ids.to_vec(),
        farm_ids: farm_ids.to_vec(),
        pools,
    }
}

pub fn test_registry() -> ContractRegistry {
    let mut registry = ContractRegistry::new();
    registry
        .register(ContractName::MasterChef, TEST_NETWORK, chef())
        .register(ContractName::RewardToken, TEST_NETWORK, reward_token())
        .register(ContractName::SecondaryRewardToken, TEST_NETWORK, secondary_token())
        .register(ContractName::Referral, TEST_NETWORK, Address::repeat_byte(0xEF))
        .register(ContractName::Presale, TEST_NETWORK, Address::repeat_byte(0xFE));
    registry
}

pub struct Fixture {
    pub mock: Arc<MockTransport>,
    pub engine: AggregationEngine,
    pub registry: Arc<ContractRegistry>,
    pub networks: Arc<NetworkCatalog>,
    pub ctx: SessionContext,
    pub chef: Address,
}

impl Fixture {
    pub fn new(pool_ids: &[u64], farm_ids: &[u64]) -> Self {
        let mock = Arc::new(MockTransport::new());
        let registry = Arc::new(test_registry());
        let networks = Arc::new(NetworkCatalog::new([test_network(pool_ids, farm_ids)]));
        let engine = AggregationEngine::new(ChainReader::new(mock.clone()), registry.clone(), networks.clone());

        Self {
            mock,
            engine,
            registry,
            networks,
            ctx: SessionContext::new(TEST_NETWORK, Some(account())),
            chef: chef(),
        }
    }

    pub fn anonymous(mut self) -> Self {
        self.ctx.account = None;
        self
    }

    /// `staked` whole LP tokens in the chef, priced at `price` quote units each
    pub fn stage_pool(&self, pid: u64, staked: u64, price: u64) {
        let mock = &self.mock;
        mock.respond(
            chef(),
            IMasterChef::poolInfoCall { pid: U256::from(pid) },
            &[MockTransport::address_word(lp(pid)), U256::from(10u64), U256::ZERO, U256::ZERO, U256::ZERO],
        );
        mock.respond(lp(pid), IERC20::balanceOfCall { account: chef() }, &[whole(staked, 18)]);
        self.stage_pair(pair(pid), token(pid), price);
    }

    /// token/quote pair with `PAIR_DEPTH` tokens against `price * PAIR_DEPTH` quote
    pub fn stage_pair(&self, pair: Address, token: Address, price: u64) {
        let mock = &self.mock;
        mock.respond(pair, IPair::token0Call {}, &[MockTransport::address_word(token)]);
        mock.respond(pair, IPair::token1Call {}, &[MockTransport::address_word(quote())]);
        mock.respond(
            pair,
            IPair::getReservesCall {},
            &[whole(PAIR_DEPTH, 18), whole(price * PAIR_DEPTH, QUOTE_DECIMALS), U256::ZERO],
        );
        mock.respond(pair, IERC20::totalSupplyCall {}, &[whole(PAIR_DEPTH, 18)]);
    }

    /// One reward per block, reward token priced at 1 through pool 0's LP.
    /// Requires pool 0 to be staged.
    pub fn stage_rewards(&self) {
        self.mock.respond(chef(), IMasterChef::rewardPerBlockCall {}, &[whole(1, 18)]);
        self.stage_pair(lp(0), reward_token(), 1);
    }

    /// Pending primary and secondary rewards (whole tokens) for the fixture account
    pub fn stage_pending(&self, pid: u64, primary: u64, secondary: u64) {
        let user = account();
        self.mock.respond(
            chef(),
            IMasterChef::pendingRewardCall { pid: U256::from(pid), user },
            &[whole(primary, 18)],
        );
        self.mock.respond(
            chef(),
            IMasterChef::pendingSecondaryRewardCall { pid: U256::from(pid), user },
            &[whole(secondary, 18)],
        );
    }

    /// Stake, pending reward and allowance for the fixture account
    pub fn stage_user(&self, pid: u64, staked: u64, pending: u64, allowance: u64) {
        let user = account();
        self.mock.respond(
            chef(),
            IMasterChef::userInfoCall { pid: U256::from(pid), user },
            &[whole(staked, 18), U256::ZERO],
        );
        self.mock.respond(
            chef(),
            IMasterChef::pendingRewardCall { pid: U256::from(pid), user },
            &[whole(pending, 18)],
        );
        self.mock.respond(
            lp(pid),
            IERC20::allowanceCall { owner: user, spender: chef() },
            &[U256::from(allowance)],
        );
    }
}
