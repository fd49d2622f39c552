//! Contract interfaces, one capability set per contract kind
//!
//! Only the functions the reader and the orchestrator actually call are
//! declared here.

use alloy_sol_types::sol;

// ============================================
// TOKENS
// ============================================

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Capped, burnable reward token
    interface IRewardToken {
        function maxSupply() external view returns (uint256);
        function totalMinted() external view returns (uint256);
        function totalBurned() external view returns (uint256);
    }
}

// ============================================
// LP PAIRS
// ============================================

sol! {
    interface IPair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }
}

// ============================================
// STAKING (MasterChef)
// ============================================

sol! {
    interface IMasterChef {
        function poolLength() external view returns (uint256);
        function rewardPerBlock() external view returns (uint256);
        function poolInfo(uint256 pid) external view returns (
            address lpToken,
            uint256 allocPoint,
            uint256 lastRewardBlock,
            uint256 accRewardPerShare,
            uint16 depositFeeBP
        );
        function userInfo(uint256 pid, address user) external view returns (uint256 amount, uint256 rewardDebt);
        function pendingReward(uint256 pid, address user) external view returns (uint256);
        function pendingSecondaryReward(uint256 pid, address user) external view returns (uint256);

        /// Depositing zero harvests the pool's pending rewards
        function deposit(uint256 pid, uint256 amount, address referrer) external;
    }
}

// ============================================
// REFERRAL + PRESALE
// ============================================

sol! {
    interface IReferral {
        function getReferrer(address user) external view returns (address);
        function referralsCount(address referrer) external view returns (uint256);
    }

    interface IPresale {
        function presaleStartBlock() external view returns (uint256);
        function presaleEndBlock() external view returns (uint256);
    }
}
