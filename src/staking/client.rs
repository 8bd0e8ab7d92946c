//! Staking client: point reads and confirmed submissions.
//!
//! # Responsibilities
//! - Read transcoder state, stake and capacity at the latest (or a given) block
//! - Submit state-changing calls and wait for their receipts
//!
//! Enumeration lives in `enumeration.rs`, withdrawals in `withdrawal.rs`.

use alloy::eips::BlockId;
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::transaction::{await_confirmation, record_outcome};
use crate::blockchain::types::{BlockchainError, BlockchainResult, PendingTx, TxReceipt};
use crate::blockchain::wallet::Wallet;
use crate::config::schema::{PollingConfig, StakingConfig, WalletConfig};
use crate::config::validation::parse_address;
use crate::resilience::{PollPolicy, WaitControl};
use crate::staking::contract::AlloyStakingLedger;
use crate::staking::ledger::StakingLedger;
use crate::staking::types::{StakingCall, Transcoder, TranscoderState};

/// Client for the staking registry.
///
/// Holds no mutable state; clones share the ledger connection.
#[derive(Debug)]
pub struct StakingClient<L: ?Sized> {
    pub(crate) ledger: Arc<L>,
    pub(crate) policy: PollPolicy,
    confirmation_timeout: Duration,
    pub(crate) pin_enumeration_block: bool,
}

impl<L: ?Sized> Clone for StakingClient<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            policy: self.policy,
            confirmation_timeout: self.confirmation_timeout,
            pin_enumeration_block: self.pin_enumeration_block,
        }
    }
}

impl StakingClient<AlloyStakingLedger> {
    /// Connect to the node and contract named in `config`.
    pub async fn connect(config: &StakingConfig) -> BlockchainResult<Self> {
        let address = parse_address(&config.blockchain.contract_address)
            .map_err(BlockchainError::InvalidConfig)?;
        let client = BlockchainClient::new(config.blockchain.clone()).await?;

        tracing::info!(contract = %address, "Staking client connected");

        Ok(Self::new(
            Arc::new(AlloyStakingLedger::new(client, address)),
            &config.polling,
        ))
    }

    /// Load the configured signing key for the connected chain.
    pub async fn wallet(&self, config: &WalletConfig) -> BlockchainResult<Wallet> {
        let chain_id = match self.ledger.client().config().chain_id {
            Some(id) => id,
            None => self.ledger.client().get_chain_id().await?.into(),
        };
        Wallet::from_config(config, chain_id)
    }
}

impl<L: StakingLedger + ?Sized> StakingClient<L> {
    pub fn new(ledger: Arc<L>, polling: &PollingConfig) -> Self {
        Self {
            ledger,
            policy: PollPolicy::from(polling),
            confirmation_timeout: Duration::from_secs(polling.confirmation_timeout_secs),
            pin_enumeration_block: polling.pin_enumeration_block,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Bonding state; an address that never registered is `Unregistered`.
    pub async fn transcoder_state(&self, address: Address) -> BlockchainResult<TranscoderState> {
        self.ledger.transcoder_state(address, BlockId::latest()).await
    }

    pub async fn transcoder_stake(&self, address: Address) -> BlockchainResult<U256> {
        self.ledger.total_stake(address, BlockId::latest()).await
    }

    pub async fn transcoder_capacity(&self, address: Address) -> BlockchainResult<U256> {
        let record = self.ledger.transcoder_record(address, BlockId::latest()).await?;
        Ok(record.capacity)
    }

    pub async fn transcoder(&self, address: Address) -> BlockchainResult<Transcoder> {
        self.transcoder_at_block(address, BlockId::latest()).await
    }

    /// Snapshot composed of two reads at `block`.
    ///
    /// With `BlockId::latest()` the reads may observe different blocks.
    pub async fn transcoder_at_block(&self, address: Address, block: BlockId) -> BlockchainResult<Transcoder> {
        let record = self.ledger.transcoder_record(address, block).await?;
        let state = self.ledger.transcoder_state(address, block).await?;
        Ok(Transcoder::from_parts(address, state, record))
    }

    pub async fn transcoders_count(&self) -> BlockchainResult<U256> {
        self.ledger.transcoders_count(BlockId::latest()).await
    }

    /// Snapshot of the transcoder stored at `index` of the registry array.
    pub async fn transcoder_at_index(&self, index: U256) -> BlockchainResult<Transcoder> {
        self.transcoder_at_index_in(index, BlockId::latest()).await
    }

    pub(crate) async fn transcoder_at_index_in(&self, index: U256, block: BlockId) -> BlockchainResult<Transcoder> {
        let address = self.ledger.transcoder_address_at(index, block).await?;
        self.transcoder_at_block(address, block).await
    }

    /// Sign and broadcast `call` without waiting for it.
    pub async fn submit(&self, wallet: &Wallet, call: StakingCall) -> BlockchainResult<PendingTx> {
        tracing::info!(call = call.name(), from = %wallet.address(), "Submitting transaction");
        self.ledger.submit(wallet, &call).await
    }

    /// Wait for `pending` to be mined successfully.
    ///
    /// The configured confirmation timeout applies on top of any deadline in
    /// `control`.
    pub async fn confirm(&self, pending: PendingTx, control: &WaitControl) -> BlockchainResult<TxReceipt> {
        let control = control.clone().with_timeout(self.confirmation_timeout);
        await_confirmation(&*self.ledger, pending, &control, &self.policy).await
    }

    /// Submit `call` and wait for its receipt.
    pub async fn execute(
        &self,
        wallet: &Wallet,
        call: StakingCall,
        control: &WaitControl,
    ) -> BlockchainResult<TxReceipt> {
        let name = call.name();
        let result = match self.submit(wallet, call).await {
            Ok(pending) => self.confirm(pending, control).await,
            Err(e) => Err(e),
        };
        record_outcome(name, &result);
        result
    }

    pub async fn register_transcoder(
        &self,
        wallet: &Wallet,
        capacity: U256,
        control: &WaitControl,
    ) -> BlockchainResult<TxReceipt> {
        self.execute(wallet, StakingCall::RegisterTranscoder { capacity }, control)
            .await
    }

    pub async fn delegate(
        &self,
        wallet: &Wallet,
        to: Address,
        amount: U256,
        control: &WaitControl,
    ) -> BlockchainResult<TxReceipt> {
        self.execute(wallet, StakingCall::Delegate { to, amount }, control).await
    }

    /// Operator call; the period is truncated to whole seconds.
    pub async fn set_approval_period(
        &self,
        wallet: &Wallet,
        period: Duration,
        control: &WaitControl,
    ) -> BlockchainResult<TxReceipt> {
        let seconds = U256::from(period.as_secs());
        self.execute(wallet, StakingCall::SetApprovalPeriod { seconds }, control)
            .await
    }

    /// Operator call.
    pub async fn set_self_min_stake(
        &self,
        wallet: &Wallet,
        amount: U256,
        control: &WaitControl,
    ) -> BlockchainResult<TxReceipt> {
        self.execute(wallet, StakingCall::SetSelfMinStake { amount }, control)
            .await
    }

    /// Operator call.
    pub async fn slash(
        &self,
        wallet: &Wallet,
        transcoder: Address,
        control: &WaitControl,
    ) -> BlockchainResult<TxReceipt> {
        self.execute(wallet, StakingCall::Slash { transcoder }, control).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bad_contract_address_is_a_config_error() {
        let mut config = StakingConfig::default();
        config.blockchain.rpc_url = "http://127.0.0.1:9".to_string();
        config.blockchain.contract_address = "0x1234".to_string();

        let err = StakingClient::connect(&config).await.unwrap_err();
        assert!(matches!(err, BlockchainError::InvalidConfig(_)));
        assert!(!err.is_transient());
    }
}
