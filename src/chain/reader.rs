//! Chain Reader - typed single-value reads
//!
//! Every method is exactly one round trip (or zero, when the account is
//! absent and the defined default applies). No batching happens here; the
//! aggregation engine fans reads out concurrently.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

use super::transport::ChainTransport;
use crate::error::{CoreError, CoreResult};
use crate::registry::interfaces::{IMasterChef, IPair, IPresale, IReferral, IRewardToken, IERC20};
use crate::registry::{ContractHandle, ContractKind};

/// On-chain pool metadata from `poolInfo(pid)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolMetadata {
    pub pid: u64,
    pub lp_token: Address,
    pub alloc_point: U256,
    pub deposit_fee_bps: u16,
}

#[derive(Clone)]
pub struct ChainReader {
    transport: Arc<dyn ChainTransport>,
}

impl ChainReader {
    pub fn new(transport: Arc<dyn ChainTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn ChainTransport> {
        &self.transport
    }

    async fn read<C: SolCall>(&self, handle: &ContractHandle, call: C) -> CoreResult<C::Return> {
        let input = call.abi_encode();
        trace!("{} -> {}", handle.label(), C::SIGNATURE);

        let raw = self.transport.call(handle.address, input.into()).await?;

        C::abi_decode_returns(&raw).map_err(|e| {
            CoreError::decode(format!("{} on {}: {}", C::SIGNATURE, handle.label(), e))
        })
    }

    // ============================================
    // ERC-20
    // ============================================

    /// Zero when no account is connected
    pub async fn balance_of(&self, token: &ContractHandle, account: Option<Address>) -> CoreResult<U256> {
        token.expect(ContractKind::Erc20)?;
        let Some(account) = account else {
            return Ok(U256::ZERO);
        };
        self.read(token, IERC20::balanceOfCall { account }).await
    }

    pub async fn total_supply(&self, token: &ContractHandle) -> CoreResult<U256> {
        token.expect(ContractKind::Erc20)?;
        self.read(token, IERC20::totalSupplyCall {}).await
    }

    pub async fn decimals(&self, token: &ContractHandle) -> CoreResult<u8> {
        token.expect(ContractKind::Erc20)?;
        self.read(token, IERC20::decimalsCall {}).await
    }

    /// Zero when no account is connected
    pub async fn allowance(
        &self,
        token: &ContractHandle,
        owner: Option<Address>,
        spender: Address,
    ) -> CoreResult<U256> {
        token.expect(ContractKind::Erc20)?;
        let Some(owner) = owner else {
            return Ok(U256::ZERO);
        };
        self.read(token, IERC20::allowanceCall { owner, spender }).await
    }

    // ============================================
    // REWARD TOKEN SUPPLY
    // ============================================

    pub async fn max_supply(&self, token: &ContractHandle) -> CoreResult<U256> {
        token.expect(ContractKind::RewardToken)?;
        self.read(token, IRewardToken::maxSupplyCall {}).await
    }

    pub async fn total_minted(&self, token: &ContractHandle) -> CoreResult<U256> {
        token.expect(ContractKind::RewardToken)?;
        self.read(token, IRewardToken::totalMintedCall {}).await
    }

    pub async fn total_burned(&self, token: &ContractHandle) -> CoreResult<U256> {
        token.expect(ContractKind::RewardToken)?;
        self.read(token, IRewardToken::totalBurnedCall {}).await
    }

    // ============================================
    // STAKING
    // ============================================

    pub async fn pool_length(&self, chef: &ContractHandle) -> CoreResult<u64> {
        chef.expect(ContractKind::Staking)?;
        let length = self.read(chef, IMasterChef::poolLengthCall {}).await?;
        u64::try_from(length).map_err(|_| CoreError::decode(format!("pool length {} overflows u64", length)))
    }

    pub async fn reward_per_block(&self, chef: &ContractHandle) -> CoreResult<U256> {
        chef.expect(ContractKind::Staking)?;
        self.read(chef, IMasterChef::rewardPerBlockCall {}).await
    }

    pub async fn pool_info(&self, chef: &ContractHandle, pid: u64) -> CoreResult<PoolMetadata> {
        chef.expect(ContractKind::Staking)?;
        let info = self
            .read(chef, IMasterChef::poolInfoCall { pid: U256::from(pid) })
            .await?;

        Ok(PoolMetadata {
            pid,
            lp_token: info.lpToken,
            alloc_point: info.allocPoint,
            deposit_fee_bps: info.depositFeeBP,
        })
    }

    /// Amount the account has staked in `pid`; zero when no account
    pub async fn user_stake(&self, chef: &ContractHandle, pid: u64, account: Option<Address>) -> CoreResult<U256> {
        chef.expect(ContractKind::Staking)?;
        let Some(user) = account else {
            return Ok(U256::ZERO);
        };
        let info = self
            .read(chef, IMasterChef::userInfoCall { pid: U256::from(pid), user })
            .await?;
        Ok(info.amount)
    }

    /// Harvestable primary reward; zero when no account
    pub async fn pending_reward(&self, chef: &ContractHandle, pid: u64, account: Option<Address>) -> CoreResult<U256> {
        chef.expect(ContractKind::Staking)?;
        let Some(user) = account else {
            return Ok(U256::ZERO);
        };
        self.read(chef, IMasterChef::pendingRewardCall { pid: U256::from(pid), user })
            .await
    }

    /// Harvestable secondary reward, a separate accessor from the primary one
    pub async fn pending_secondary_reward(
        &self,
        chef: &ContractHandle,
        pid: u64,
        account: Option<Address>,
    ) -> CoreResult<U256> {
        chef.expect(ContractKind::Staking)?;
        let Some(user) = account else {
            return Ok(U256::ZERO);
        };
        self.read(chef, IMasterChef::pendingSecondaryRewardCall { pid: U256::from(pid), user })
            .await
    }

    // ============================================
    // LP PAIRS
    // ============================================

    pub async fn pair_token0(&self, pair: &ContractHandle) -> CoreResult<Address> {
        pair.expect(ContractKind::Erc20)?;
        self.read(pair, IPair::token0Call {}).await
    }

    pub async fn pair_token1(&self, pair: &ContractHandle) -> CoreResult<Address> {
        pair.expect(ContractKind::Erc20)?;
        self.read(pair, IPair::token1Call {}).await
    }

    pub async fn pair_reserves(&self, pair: &ContractHandle) -> CoreResult<(U256, U256)> {
        pair.expect(ContractKind::Erc20)?;
        let reserves = self.read(pair, IPair::getReservesCall {}).await?;
        Ok((
            U256::from(reserves.reserve0.to::<u128>()),
            U256::from(reserves.reserve1.to::<u128>()),
        ))
    }

    // ============================================
    // REFERRAL
    // ============================================

    /// `None` when disconnected or when nobody referred the account
    pub async fn referrer_of(&self, referral: &ContractHandle, account: Option<Address>) -> CoreResult<Option<Address>> {
        referral.expect(ContractKind::Referral)?;
        let Some(user) = account else {
            return Ok(None);
        };
        let referrer = self.read(referral, IReferral::getReferrerCall { user }).await?;
        Ok((referrer != Address::ZERO).then_some(referrer))
    }

    pub async fn referrals_count(&self, referral: &ContractHandle, account: Option<Address>) -> CoreResult<u64> {
        referral.expect(ContractKind::Referral)?;
        let Some(referrer) = account else {
            return Ok(0);
        };
        let count = self.read(referral, IReferral::referralsCountCall { referrer }).await?;
        u64::try_from(count).map_err(|_| CoreError::decode(format!("referral count {} overflows u64", count)))
    }

    // ============================================
    // PRESALE
    // ============================================

    pub async fn presale_start_block(&self, presale: &ContractHandle) -> CoreResult<u64> {
        presale.expect(ContractKind::Presale)?;
        let block = self.read(presale, IPresale::presaleStartBlockCall {}).await?;
        u64::try_from(block).map_err(|_| CoreError::decode(format!("start block {} overflows u64", block)))
    }

    pub async fn presale_end_block(&self, presale: &ContractHandle) -> CoreResult<u64> {
        presale.expect(ContractKind::Presale)?;
        let block = self.read(presale, IPresale::presaleEndBlockCall {}).await?;
        u64::try_from(block).map_err(|_| CoreError::decode(format!("end block {} overflows u64", block)))
    }

    pub async fn block_number(&self) -> CoreResult<u64> {
        self.transport.block_number().await
    }
}
