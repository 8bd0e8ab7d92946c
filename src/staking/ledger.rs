//! Seam between the client core and the remote contract.
//!
//! Every method is one remote round trip. Implementations hold no local
//! cache; each read reflects the ledger at the requested block.

use alloy::eips::BlockId;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::blockchain::transaction::ReceiptSource;
use crate::blockchain::types::{BlockInfo, BlockchainResult, PendingTx};
use crate::blockchain::wallet::Wallet;
use crate::staking::types::{PendingWithdrawal, StakingCall, TranscoderRecord, TranscoderState};

/// Typed access to the deployed staking contract.
#[async_trait]
pub trait StakingLedger: ReceiptSource {
    /// Address the contract lives at; receipts are filtered by it.
    fn contract_address(&self) -> Address;

    async fn block_number(&self) -> BlockchainResult<u64>;

    async fn latest_block(&self) -> BlockchainResult<BlockInfo>;

    /// `transcodersCount()`
    async fn transcoders_count(&self, block: BlockId) -> BlockchainResult<U256>;

    /// `transcodersArray(index)`; reverts when `index` is out of range.
    async fn transcoder_address_at(&self, index: U256, block: BlockId) -> BlockchainResult<Address>;

    /// `transcoders(address)`
    async fn transcoder_record(&self, address: Address, block: BlockId) -> BlockchainResult<TranscoderRecord>;

    /// `getTranscoderState(address)`
    async fn transcoder_state(&self, address: Address, block: BlockId) -> BlockchainResult<TranscoderState>;

    /// `getTotalStake(address)`
    async fn total_stake(&self, address: Address, block: BlockId) -> BlockchainResult<U256>;

    /// `getPendingWithdrawal(address)`
    async fn pending_withdrawal(&self, delegator: Address, block: BlockId) -> BlockchainResult<PendingWithdrawal>;

    /// Sign `call` with `wallet` and broadcast it.
    async fn submit(&self, wallet: &Wallet, call: &StakingCall) -> BlockchainResult<PendingTx>;
}
