//! `StakingManager` contract binding.
//!
//! # Responsibilities
//! - Declare the contract interface (`sol!`)
//! - Implement [`StakingLedger`] over a [`BlockchainClient`]
//! - Encode state-changing calls and decode withdrawal events from receipts

use alloy::eips::BlockId;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};
use async_trait::async_trait;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::transaction::{ReceiptSource, TxBuilder};
use crate::blockchain::types::{BlockInfo, BlockchainError, BlockchainResult, PendingTx, TxReceipt};
use crate::blockchain::wallet::Wallet;
use crate::staking::ledger::StakingLedger;
use crate::staking::types::{
    PendingWithdrawal, StakingCall, TranscoderRecord, TranscoderState, WithdrawalInfo,
};

sol! {
    #[sol(rpc)]
    contract StakingManager {
        /// Emitted when a withdrawal is queued behind the approval period.
        #[derive(Debug)]
        event WithdrawalRequested(
            address indexed delegator,
            address indexed transcoder,
            uint256 amount,
            uint256 readinessTimestamp
        );

        /// Emitted when funds are paid out to the delegator.
        #[derive(Debug)]
        event WithdrawalCompleted(address indexed delegator, uint256 amount);

        function getTranscoderState(address transcoder) external view returns (uint8);
        function getTotalStake(address transcoder) external view returns (uint256);
        function transcoders(address transcoder) external view returns (
            uint256 total,
            uint256 capacity,
            uint256 selfStake,
            uint256 delegatedStake,
            uint256 effectiveMinSelfStake
        );
        function transcodersCount() external view returns (uint256);
        function transcodersArray(uint256 index) external view returns (address);
        function getPendingWithdrawal(address delegator) external view returns (
            uint256 amount,
            uint256 readinessTimestamp
        );

        function registerTranscoder(uint256 capacity) external;
        function delegate(address transcoder, uint256 amount) external;
        function requestWithdrawal(address transcoder, uint256 amount) external;
        function completeWithdrawals() external;
        function setApprovalPeriod(uint256 period) external;
        function setSelfMinStake(uint256 amount) external;
        function slash(address transcoder) external;
    }
}

pub use StakingManager::{WithdrawalCompleted, WithdrawalRequested};

/// ABI-encode a state-changing call.
pub fn encode_call(call: &StakingCall) -> Bytes {
    let encoded = match *call {
        StakingCall::RegisterTranscoder { capacity } => {
            StakingManager::registerTranscoderCall { capacity }.abi_encode()
        }
        StakingCall::Delegate { to, amount } => StakingManager::delegateCall {
            transcoder: to,
            amount,
        }
        .abi_encode(),
        StakingCall::RequestWithdrawal { from, amount } => StakingManager::requestWithdrawalCall {
            transcoder: from,
            amount,
        }
        .abi_encode(),
        StakingCall::CompleteWithdrawals => StakingManager::completeWithdrawalsCall {}.abi_encode(),
        StakingCall::SetApprovalPeriod { seconds } => {
            StakingManager::setApprovalPeriodCall { period: seconds }.abi_encode()
        }
        StakingCall::SetSelfMinStake { amount } => {
            StakingManager::setSelfMinStakeCall { amount }.abi_encode()
        }
        StakingCall::Slash { transcoder } => StakingManager::slashCall { transcoder }.abi_encode(),
    };
    Bytes::from(encoded)
}

/// Find the withdrawal outcome for `delegator` in a receipt emitted by `contract`.
///
/// A completion event wins over a request event in the same receipt.
pub fn withdrawal_from_receipt(
    receipt: &TxReceipt,
    contract: Address,
    delegator: Address,
) -> BlockchainResult<Option<WithdrawalInfo>> {
    let mut requested = None;

    for log in receipt.logs.iter().filter(|log| log.address == contract) {
        let Some(topic) = log.data.topics().first() else {
            continue;
        };
        if *topic == WithdrawalCompleted::SIGNATURE_HASH {
            let event = decode_event::<WithdrawalCompleted>(log, receipt.tx_hash)?;
            if event.delegator == delegator {
                return Ok(Some(WithdrawalInfo::completed(event.amount)));
            }
        } else if *topic == WithdrawalRequested::SIGNATURE_HASH {
            let event = decode_event::<WithdrawalRequested>(log, receipt.tx_hash)?;
            if event.delegator == delegator {
                let readiness = u64::try_from(event.readinessTimestamp).map_err(|_| {
                    BlockchainError::InvalidResponse(format!(
                        "readiness timestamp {} out of range",
                        event.readinessTimestamp
                    ))
                })?;
                requested = Some(WithdrawalInfo::pending(readiness)?);
            }
        }
    }

    Ok(requested)
}

fn decode_event<E: SolEvent>(log: &alloy::primitives::Log, tx_hash: TxHash) -> BlockchainResult<E> {
    E::decode_log_data(&log.data).map_err(|e| {
        BlockchainError::InvalidResponse(format!(
            "undecodable {} log in {}: {}",
            E::SIGNATURE,
            tx_hash,
            e
        ))
    })
}

/// [`StakingLedger`] backed by a JSON-RPC node.
#[derive(Debug, Clone)]
pub struct AlloyStakingLedger {
    client: BlockchainClient,
    tx_builder: TxBuilder,
    address: Address,
}

impl AlloyStakingLedger {
    pub fn new(client: BlockchainClient, address: Address) -> Self {
        Self {
            tx_builder: TxBuilder::new(client.clone()),
            client,
            address,
        }
    }

    pub fn client(&self) -> &BlockchainClient {
        &self.client
    }

    fn contract(&self) -> StakingManager::StakingManagerInstance<alloy::providers::DynProvider> {
        StakingManager::new(self.address, self.client.provider())
    }
}

#[async_trait]
impl ReceiptSource for AlloyStakingLedger {
    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<TxReceipt>> {
        self.client.get_transaction_receipt(tx_hash).await
    }
}

#[async_trait]
impl StakingLedger for AlloyStakingLedger {
    fn contract_address(&self) -> Address {
        self.address
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.client.get_block_number().await
    }

    async fn latest_block(&self) -> BlockchainResult<BlockInfo> {
        self.client.latest_block().await
    }

    async fn transcoders_count(&self, block: BlockId) -> BlockchainResult<U256> {
        let contract = self.contract();
        let call = contract.transcodersCount().block(block);
        self.client
            .rpc("transcodersCount", call.call(), BlockchainError::from_contract)
            .await
    }

    async fn transcoder_address_at(&self, index: U256, block: BlockId) -> BlockchainResult<Address> {
        let contract = self.contract();
        let call = contract.transcodersArray(index).block(block);
        self.client
            .rpc("transcodersArray", call.call(), BlockchainError::from_contract)
            .await
    }

    async fn transcoder_record(&self, address: Address, block: BlockId) -> BlockchainResult<TranscoderRecord> {
        let contract = self.contract();
        let call = contract.transcoders(address).block(block);
        let record = self
            .client
            .rpc("transcoders", call.call(), BlockchainError::from_contract)
            .await?;
        Ok(TranscoderRecord {
            total: record.total,
            capacity: record.capacity,
            self_stake: record.selfStake,
            delegated_stake: record.delegatedStake,
            effective_min_self_stake: record.effectiveMinSelfStake,
        })
    }

    async fn transcoder_state(&self, address: Address, block: BlockId) -> BlockchainResult<TranscoderState> {
        let contract = self.contract();
        let call = contract.getTranscoderState(address).block(block);
        let raw = self
            .client
            .rpc("getTranscoderState", call.call(), BlockchainError::from_contract)
            .await?;
        TranscoderState::try_from(raw)
    }

    async fn total_stake(&self, address: Address, block: BlockId) -> BlockchainResult<U256> {
        let contract = self.contract();
        let call = contract.getTotalStake(address).block(block);
        self.client
            .rpc("getTotalStake", call.call(), BlockchainError::from_contract)
            .await
    }

    async fn pending_withdrawal(&self, delegator: Address, block: BlockId) -> BlockchainResult<PendingWithdrawal> {
        let contract = self.contract();
        let call = contract.getPendingWithdrawal(delegator).block(block);
        let pending = self
            .client
            .rpc("getPendingWithdrawal", call.call(), BlockchainError::from_contract)
            .await?;
        let readiness_timestamp = u64::try_from(pending.readinessTimestamp).map_err(|_| {
            BlockchainError::InvalidResponse(format!(
                "readiness timestamp {} out of range",
                pending.readinessTimestamp
            ))
        })?;
        Ok(PendingWithdrawal {
            amount: pending.amount,
            readiness_timestamp,
        })
    }

    async fn submit(&self, wallet: &Wallet, call: &StakingCall) -> BlockchainResult<PendingTx> {
        self.tx_builder.submit(wallet, self.address, encode_call(call)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Log, LogData};

    const CONTRACT: Address = Address::repeat_byte(0x02);
    const DELEGATOR: Address = Address::repeat_byte(0xd1);

    fn log_of<E: SolEvent>(address: Address, event: &E) -> Log {
        Log {
            address,
            data: event.encode_log_data(),
        }
    }

    fn receipt(logs: Vec<Log>) -> TxReceipt {
        TxReceipt {
            tx_hash: TxHash::repeat_byte(1),
            block_number: Some(10),
            success: true,
            logs,
        }
    }

    #[test]
    fn test_encode_call_selectors() {
        let data = encode_call(&StakingCall::CompleteWithdrawals);
        assert_eq!(&data[..], &StakingManager::completeWithdrawalsCall::SELECTOR[..]);

        let data = encode_call(&StakingCall::Delegate {
            to: DELEGATOR,
            amount: U256::from(50),
        });
        assert_eq!(&data[..4], &StakingManager::delegateCall::SELECTOR[..]);
        let decoded = StakingManager::delegateCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.transcoder, DELEGATOR);
        assert_eq!(decoded.amount, U256::from(50));
    }

    #[test]
    fn test_completed_event_decoded() {
        let event = WithdrawalCompleted {
            delegator: DELEGATOR,
            amount: U256::from(1000),
        };
        let info = withdrawal_from_receipt(&receipt(vec![log_of(CONTRACT, &event)]), CONTRACT, DELEGATOR)
            .unwrap()
            .unwrap();
        assert_eq!(info.amount(), Some(U256::from(1000)));
    }

    #[test]
    fn test_requested_event_decoded() {
        let event = WithdrawalRequested {
            delegator: DELEGATOR,
            transcoder: Address::repeat_byte(0x77),
            amount: U256::from(250),
            readinessTimestamp: U256::from(1_700_000_100u64),
        };
        let info = withdrawal_from_receipt(&receipt(vec![log_of(CONTRACT, &event)]), CONTRACT, DELEGATOR)
            .unwrap()
            .unwrap();
        assert_eq!(info.readiness_timestamp(), Some(1_700_000_100));
        assert_eq!(info.amount(), None);
    }

    #[test]
    fn test_foreign_logs_ignored() {
        let event = WithdrawalCompleted {
            delegator: DELEGATOR,
            amount: U256::from(1),
        };
        let other_contract = log_of(Address::repeat_byte(0x99), &event);
        let other_delegator = log_of(
            CONTRACT,
            &WithdrawalCompleted {
                delegator: Address::repeat_byte(0x55),
                amount: U256::from(1),
            },
        );
        let unrelated = Log {
            address: CONTRACT,
            data: LogData::new_unchecked(vec![], Bytes::new()),
        };
        let result =
            withdrawal_from_receipt(&receipt(vec![other_contract, other_delegator, unrelated]), CONTRACT, DELEGATOR)
                .unwrap();
        assert!(result.is_none());
    }
}
