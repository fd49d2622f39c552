//! Quote-denominated pricing and reward rates
//!
//! Every price is expressed in the network's quote token. A network without
//! a quote token prices everything at zero rather than failing.

use alloy_primitives::Address;
use futures::future::try_join4;

use crate::chain::{to_f64, ChainReader};
use crate::error::CoreResult;
use crate::networks::{NetworkInfo, PoolDescriptor, PriceRoute, QuoteToken};
use crate::registry::ContractHandle;

/// Reward tokens are 18-decimal on every supported network
pub const REWARD_DECIMALS: u8 = 18;

const DAYS_PER_YEAR: f64 = 365.0;

/// Price of one whole staked token of `descriptor`
pub(crate) async fn staked_token_price(
    reader: &ChainReader,
    network: &NetworkInfo,
    chef: &ContractHandle,
    descriptor: &PoolDescriptor,
    lp_token: Address,
) -> CoreResult<f64> {
    let Some(quote) = network.quote_token else {
        return Ok(0.0);
    };
    if lp_token == quote.address {
        return Ok(1.0);
    }

    match descriptor.price_route {
        PriceRoute::PairLp => lp_token_price(reader, &quote, lp_token, descriptor.decimals).await,
        PriceRoute::ViaPair(pair) => token_price_via_pair(reader, &quote, pair, descriptor.decimals).await,
        PriceRoute::ViaPool(pid) => {
            let meta = reader.pool_info(chef, pid).await?;
            token_price_via_pair(reader, &quote, meta.lp_token, descriptor.decimals).await
        }
    }
}

/// Reward token price through the network's reward/quote pool
pub(crate) async fn reward_token_price(
    reader: &ChainReader,
    network: &NetworkInfo,
    chef: &ContractHandle,
) -> CoreResult<f64> {
    let (Some(quote), Some(pid)) = (network.quote_token, network.reward_price_pool) else {
        return Ok(0.0);
    };
    let meta = reader.pool_info(chef, pid).await?;
    token_price_via_pair(reader, &quote, meta.lp_token, REWARD_DECIMALS).await
}

/// Quote-side reserve of `pair` plus the other side, both in raw units.
/// `None` when the pair does not trade against the quote token.
async fn quote_side(
    reader: &ChainReader,
    quote: &QuoteToken,
    pair: Address,
) -> CoreResult<Option<(f64, f64, f64)>> {
    let handle = ContractHandle::erc20(pair);
    let (token0, token1, (reserve0, reserve1), supply) = try_join4(
        reader.pair_token0(&handle),
        reader.pair_token1(&handle),
        reader.pair_reserves(&handle),
        reader.total_supply(&handle),
    )
    .await?;

    let sides = if token0 == quote.address {
        Some((reserve0, reserve1))
    } else if token1 == quote.address {
        Some((reserve1, reserve0))
    } else {
        None
    };

    Ok(sides.map(|(quote_reserve, other_reserve)| {
        (
            to_f64(quote_reserve, quote.decimals),
            to_f64(other_reserve, 0),
            to_f64(supply, 0),
        )
    }))
}

async fn lp_token_price(reader: &ChainReader, quote: &QuoteToken, lp: Address, decimals: u8) -> CoreResult<f64> {
    Ok(match quote_side(reader, quote, lp).await? {
        Some((quote_reserve, _, raw_supply)) => lp_price(quote_reserve, raw_supply / scale(decimals)),
        None => 0.0,
    })
}

async fn token_price_via_pair(
    reader: &ChainReader,
    quote: &QuoteToken,
    pair: Address,
    decimals: u8,
) -> CoreResult<f64> {
    Ok(match quote_side(reader, quote, pair).await? {
        Some((quote_reserve, raw_other, _)) => pair_price(quote_reserve, raw_other / scale(decimals)),
        None => 0.0,
    })
}

fn scale(decimals: u8) -> f64 {
    10_f64.powi(decimals as i32)
}

// ============================================
// PURE MATH
// ============================================

/// An LP token is worth twice its quote-side reserve spread over its supply
pub fn lp_price(quote_reserve: f64, lp_supply: f64) -> f64 {
    if lp_supply <= 0.0 {
        return 0.0;
    }
    finite_or_zero(2.0 * quote_reserve / lp_supply)
}

pub fn pair_price(quote_reserve: f64, token_reserve: f64) -> f64 {
    if token_reserve <= 0.0 {
        return 0.0;
    }
    finite_or_zero(quote_reserve / token_reserve)
}

/// Yearly reward value allocated to a pool over its staked value, in percent.
/// Zero staked value yields zero.
pub fn compute_apr(
    multiplier: u32,
    total_multiplier: u64,
    reward_per_block: f64,
    blocks_per_year: f64,
    reward_price: f64,
    staked_value: f64,
) -> f64 {
    if staked_value <= 0.0 || total_multiplier == 0 {
        return 0.0;
    }
    let share = multiplier as f64 / total_multiplier as f64;
    let yearly_rewards = reward_per_block * blocks_per_year * share * reward_price;
    finite_or_zero(yearly_rewards / staked_value * 100.0)
}

/// Daily compounding
pub fn apr_to_apy(apr: f64) -> f64 {
    if apr <= 0.0 {
        return 0.0;
    }
    let daily = apr / 100.0 / DAYS_PER_YEAR;
    finite_or_zero(((1.0 + daily).powf(DAYS_PER_YEAR) - 1.0) * 100.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
