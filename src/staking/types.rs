//! Staking registry types.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Bonding state of a transcoder as reported by the contract.
///
/// Wire encoding is the `uint8` returned by `getTranscoderState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscoderState {
    Bonding,
    Bonded,
    Unbonded,
    Unbonding,
    Unregistered,
}

impl TryFrom<u8> for TranscoderState {
    type Error = BlockchainError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Bonding),
            1 => Ok(Self::Bonded),
            2 => Ok(Self::Unbonded),
            3 => Ok(Self::Unbonding),
            4 => Ok(Self::Unregistered),
            other => Err(BlockchainError::InvalidResponse(format!(
                "unknown transcoder state {}",
                other
            ))),
        }
    }
}

impl From<TranscoderState> for u8 {
    fn from(state: TranscoderState) -> Self {
        match state {
            TranscoderState::Bonding => 0,
            TranscoderState::Bonded => 1,
            TranscoderState::Unbonded => 2,
            TranscoderState::Unbonding => 3,
            TranscoderState::Unregistered => 4,
        }
    }
}

impl std::fmt::Display for TranscoderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bonding => "bonding",
            Self::Bonded => "bonded",
            Self::Unbonded => "unbonded",
            Self::Unbonding => "unbonding",
            Self::Unregistered => "unregistered",
        };
        f.write_str(name)
    }
}

/// Stake and capacity record returned by `transcoders(address)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TranscoderRecord {
    pub total: U256,
    pub capacity: U256,
    pub self_stake: U256,
    pub delegated_stake: U256,
    pub effective_min_self_stake: U256,
}

/// Point-in-time snapshot of one transcoder. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcoder {
    pub address: Address,
    pub state: TranscoderState,
    pub total_stake: U256,
    pub self_stake: U256,
    pub delegated_stake: U256,
    pub capacity: U256,
    pub effective_min_self_stake: U256,
}

impl Transcoder {
    pub fn from_parts(address: Address, state: TranscoderState, record: TranscoderRecord) -> Self {
        Self {
            address,
            state,
            total_stake: record.total,
            self_stake: record.self_stake,
            delegated_stake: record.delegated_stake,
            capacity: record.capacity,
            effective_min_self_stake: record.effective_min_self_stake,
        }
    }

    pub fn is_bonded(&self) -> bool {
        self.state == TranscoderState::Bonded
    }
}

/// Raw `getPendingWithdrawal` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingWithdrawal {
    pub amount: U256,
    pub readiness_timestamp: u64,
}

impl PendingWithdrawal {
    /// Both fields zero: the party has nothing pending.
    pub fn is_empty(&self) -> bool {
        self.amount.is_zero() && self.readiness_timestamp == 0
    }

    /// Whether the contract would accept completion at `now` (a block timestamp).
    pub fn is_ready_at(&self, now: u64) -> bool {
        !self.is_empty() && self.readiness_timestamp <= now
    }
}

/// Outcome of a withdrawal request or completion.
///
/// Exactly one shape holds: a pending withdrawal has a readiness timestamp
/// and no amount, a completed one has an amount and no timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WithdrawalInfo {
    Pending { readiness_timestamp: u64 },
    Completed { amount: U256 },
}

impl WithdrawalInfo {
    /// A pending withdrawal; the timestamp must be non-zero.
    pub fn pending(readiness_timestamp: u64) -> BlockchainResult<Self> {
        if readiness_timestamp == 0 {
            return Err(BlockchainError::InvalidResponse(
                "pending withdrawal without readiness timestamp".to_string(),
            ));
        }
        Ok(Self::Pending { readiness_timestamp })
    }

    pub fn completed(amount: U256) -> Self {
        Self::Completed { amount }
    }

    pub fn amount(&self) -> Option<U256> {
        match self {
            Self::Completed { amount } => Some(*amount),
            Self::Pending { .. } => None,
        }
    }

    pub fn readiness_timestamp(&self) -> Option<u64> {
        match self {
            Self::Pending { readiness_timestamp } => Some(*readiness_timestamp),
            Self::Completed { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Immutable `[start, end)` index range over the on-chain transcoder array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscoderRange {
    pub start: U256,
    pub end: U256,
}

impl TranscoderRange {
    pub fn new(start: U256, end: U256) -> Self {
        Self { start, end }
    }

    /// The whole registry of size `count`.
    pub fn all(count: U256) -> Self {
        Self::new(U256::ZERO, count)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A state-changing contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakingCall {
    RegisterTranscoder { capacity: U256 },
    Delegate { to: Address, amount: U256 },
    RequestWithdrawal { from: Address, amount: U256 },
    CompleteWithdrawals,
    SetApprovalPeriod { seconds: U256 },
    SetSelfMinStake { amount: U256 },
    Slash { transcoder: Address },
}

impl StakingCall {
    /// Contract method name, used for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterTranscoder { .. } => "registerTranscoder",
            Self::Delegate { .. } => "delegate",
            Self::RequestWithdrawal { .. } => "requestWithdrawal",
            Self::CompleteWithdrawals => "completeWithdrawals",
            Self::SetApprovalPeriod { .. } => "setApprovalPeriod",
            Self::SetSelfMinStake { .. } => "setSelfMinStake",
            Self::Slash { .. } => "slash",
        }
    }
}
