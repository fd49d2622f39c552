use alloy_primitives::Address;
use serde::Serialize;

use crate::chain::TokenAmount;

/// Supply figures of the reward token
#[derive(Debug, Clone, Serialize)]
pub struct TokenStats {
    pub max_supply: TokenAmount,
    pub total_minted: TokenAmount,
    pub total_burned: TokenAmount,
    /// Minted minus burned
    pub circulating: TokenAmount,
}

impl TokenStats {
    pub fn new(max_supply: TokenAmount, total_minted: TokenAmount, total_burned: TokenAmount) -> Self {
        let circulating = TokenAmount::new(
            total_minted.raw.saturating_sub(total_burned.raw),
            total_minted.decimals,
        );
        Self {
            max_supply,
            total_minted,
            total_burned,
            circulating,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PresalePhase {
    Upcoming,
    Live,
    Ended,
}

/// Whole days/hours/minutes/seconds of a duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Countdown {
    pub fn from_secs(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PresaleInfo {
    pub start_block: u64,
    pub end_block: u64,
    pub current_block: u64,
    pub phase: PresalePhase,
    /// Estimated from the network's block time; zero once started
    pub starts_in: Countdown,
}

impl PresaleInfo {
    pub fn new(start_block: u64, end_block: u64, current_block: u64, block_time_secs: f64) -> Self {
        let phase = if current_block < start_block {
            PresalePhase::Upcoming
        } else if current_block <= end_block {
            PresalePhase::Live
        } else {
            PresalePhase::Ended
        };
        let blocks_left = start_block.saturating_sub(current_block);
        let secs = (blocks_left as f64 * block_time_secs.max(0.0)).round() as u64;

        Self {
            start_block,
            end_block,
            current_block,
            phase,
            starts_in: Countdown::from_secs(secs),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralInfo {
    pub referrer: Option<Address>,
    pub referrals: u64,
}
