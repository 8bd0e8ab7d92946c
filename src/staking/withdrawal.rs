//! Withdrawal request, completion and readiness waiting.

use alloy::eips::BlockId;
use alloy::primitives::{Address, U256};

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::blockchain::wallet::Wallet;
use crate::resilience::{poll_until, WaitControl};
use crate::staking::client::StakingClient;
use crate::staking::contract::withdrawal_from_receipt;
use crate::staking::ledger::StakingLedger;
use crate::staking::types::{PendingWithdrawal, StakingCall, WithdrawalInfo};

impl<L: StakingLedger + ?Sized> StakingClient<L> {
    /// Raw pending withdrawal record for `delegator` at the latest block.
    pub async fn pending_withdrawal(&self, delegator: Address) -> BlockchainResult<PendingWithdrawal> {
        self.ledger.pending_withdrawal(delegator, BlockId::latest()).await
    }

    /// Withdraw `amount` of the wallet's stake from `from`.
    ///
    /// Returns `Completed` when the contract paid out immediately and
    /// `Pending` when the withdrawal waits for the approval period.
    pub async fn request_withdrawal(
        &self,
        wallet: &Wallet,
        from: Address,
        amount: U256,
        control: &WaitControl,
    ) -> BlockchainResult<WithdrawalInfo> {
        let receipt = self
            .execute(wallet, StakingCall::RequestWithdrawal { from, amount }, control)
            .await?;

        let info = withdrawal_from_receipt(&receipt, self.ledger.contract_address(), wallet.address())?
            .ok_or_else(|| {
                BlockchainError::InvalidResponse(format!(
                    "requestWithdrawal receipt {} carries no withdrawal event",
                    receipt.tx_hash
                ))
            })?;

        tracing::info!(
            delegator = %wallet.address(),
            transcoder = %from,
            outcome = ?info,
            "Withdrawal requested"
        );
        Ok(info)
    }

    /// Complete every ready withdrawal of the wallet.
    ///
    /// Fails with `NoPendingWithdrawals` without sending anything when the
    /// wallet has no pending record.
    pub async fn complete_withdrawals(
        &self,
        wallet: &Wallet,
        control: &WaitControl,
    ) -> BlockchainResult<WithdrawalInfo> {
        let pending = self.pending_withdrawal(wallet.address()).await?;
        if pending.is_empty() {
            return Err(BlockchainError::NoPendingWithdrawals);
        }
        self.submit_completion(wallet, control).await
    }

    async fn submit_completion(&self, wallet: &Wallet, control: &WaitControl) -> BlockchainResult<WithdrawalInfo> {
        let receipt = self
            .execute(wallet, StakingCall::CompleteWithdrawals, control)
            .await?;

        match withdrawal_from_receipt(&receipt, self.ledger.contract_address(), wallet.address())? {
            Some(info @ WithdrawalInfo::Completed { .. }) => {
                tracing::info!(delegator = %wallet.address(), amount = ?info.amount(), "Withdrawal completed");
                Ok(info)
            }
            _ => Err(BlockchainError::NoPendingWithdrawals),
        }
    }

    /// Wait until the wallet's pending withdrawal is ready, then complete it.
    ///
    /// Keeps polling while there is no record, the record is not yet ready,
    /// or completion raced with another party and found nothing to pay out.
    /// Returns `Cancelled` or `DeadlineExceeded` per `control`.
    pub async fn wait_withdrawal_completed(
        &self,
        wallet: &Wallet,
        control: &WaitControl,
    ) -> BlockchainResult<WithdrawalInfo> {
        let delegator = wallet.address();
        tracing::info!(delegator = %delegator, "Waiting for withdrawal");

        poll_until(control, &self.policy, move || async move {
            let head = self.ledger.latest_block().await?;
            let pending = self
                .ledger
                .pending_withdrawal(delegator, BlockId::number(head.number))
                .await?;

            if pending.is_empty() {
                tracing::debug!(delegator = %delegator, "No pending withdrawal");
                return Ok(None);
            }
            if !pending.is_ready_at(head.timestamp) {
                tracing::debug!(
                    delegator = %delegator,
                    ready_at = pending.readiness_timestamp,
                    now = head.timestamp,
                    "Withdrawal not ready"
                );
                return Ok(None);
            }

            match self.submit_completion(wallet, control).await {
                Ok(info) => Ok(Some(info)),
                Err(BlockchainError::NoPendingWithdrawals) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }
}
