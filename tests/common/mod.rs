//! Shared utilities for integration tests.
//!
//! `MockStakingLedger` is an in-memory stand-in for the deployed contract.
//! It applies the staking rules at submission time and serves the receipt
//! once mining is due.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::eips::BlockId;
use alloy::primitives::{Address, Log, TxHash, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

use staking_client::blockchain::{BlockInfo, BlockchainError, BlockchainResult, PendingTx, ReceiptSource, TxReceipt};
use staking_client::config::PollingConfig;
use staking_client::staking::contract::{WithdrawalCompleted, WithdrawalRequested};
use staking_client::staking::{PendingWithdrawal, StakingCall, StakingLedger, TranscoderRecord, TranscoderState};
use staking_client::{StakingClient, Wallet};

pub const CONTRACT: Address = Address::repeat_byte(0x5a);
pub const CHAIN_ID: u64 = 1337;
pub const GENESIS_TIME: u64 = 1_700_000_000;

/// Fast polling so tests finish in milliseconds.
pub fn test_polling() -> PollingConfig {
    PollingConfig {
        poll_interval_ms: 5,
        max_poll_interval_ms: 20,
        backoff: false,
        confirmation_timeout_secs: 5,
        pin_enumeration_block: true,
    }
}

pub fn client(ledger: &Arc<MockStakingLedger>) -> StakingClient<MockStakingLedger> {
    client_with(ledger, &test_polling())
}

pub fn client_with(ledger: &Arc<MockStakingLedger>, polling: &PollingConfig) -> StakingClient<MockStakingLedger> {
    StakingClient::new(ledger.clone(), polling)
}

pub fn wallet() -> Wallet {
    Wallet::from_signer(PrivateKeySigner::random(), CHAIN_ID)
}

#[derive(Debug, Default, Clone)]
struct Entry {
    capacity: U256,
    self_stake: U256,
    delegated_stake: U256,
    effective_min_self_stake: U256,
    slashed: bool,
}

impl Entry {
    fn state(&self) -> TranscoderState {
        if self.slashed {
            TranscoderState::Unbonded
        } else if self.self_stake >= self.effective_min_self_stake && !self.self_stake.is_zero() {
            TranscoderState::Bonded
        } else {
            TranscoderState::Bonding
        }
    }
}

#[derive(Debug, Default)]
struct Chain {
    timestamp: u64,
    block_number: u64,
    min_self_stake: U256,
    approval_period: u64,
    registry: Vec<Address>,
    entries: HashMap<Address, Entry>,
    delegations: HashMap<(Address, Address), U256>,
    pending: HashMap<Address, PendingWithdrawal>,
    receipts: HashMap<TxHash, (TxReceipt, usize)>,
    tx_count: u64,
    fail_index: Option<U256>,
    reject_submissions: bool,
    mining_delay: usize,
    read_blocks: Vec<BlockId>,
}

/// Per-method call counters.
#[derive(Debug, Default)]
pub struct Counters {
    pub transcoders_count: AtomicUsize,
    pub transcoder_address_at: AtomicUsize,
    pub transcoder_record: AtomicUsize,
    pub transcoder_state: AtomicUsize,
    pub total_stake: AtomicUsize,
    pub pending_withdrawal: AtomicUsize,
    pub block_number: AtomicUsize,
    pub latest_block: AtomicUsize,
    pub submissions: AtomicUsize,
    pub receipt_lookups: AtomicUsize,
}

impl Counters {
    /// Contract `eth_call`s made so far.
    pub fn contract_reads(&self) -> usize {
        [
            &self.transcoders_count,
            &self.transcoder_address_at,
            &self.transcoder_record,
            &self.transcoder_state,
            &self.total_stake,
            &self.pending_withdrawal,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

#[derive(Debug)]
pub struct MockStakingLedger {
    chain: Mutex<Chain>,
    pub calls: Counters,
}

impl MockStakingLedger {
    pub fn new(min_self_stake: u64, approval_period: u64) -> Arc<Self> {
        Arc::new(Self {
            chain: Mutex::new(Chain {
                timestamp: GENESIS_TIME,
                block_number: 1,
                min_self_stake: U256::from(min_self_stake),
                approval_period,
                ..Default::default()
            }),
            calls: Counters::default(),
        })
    }

    /// Advance the block clock by `secs` and mine an empty block.
    pub fn advance_time(&self, secs: u64) {
        let mut chain = self.chain.lock().unwrap();
        chain.timestamp += secs;
        chain.block_number += 1;
    }

    /// Block ids seen by the registry reads (count, index, record, state).
    pub fn read_blocks(&self) -> Vec<BlockId> {
        self.chain.lock().unwrap().read_blocks.clone()
    }

    pub fn now(&self) -> u64 {
        self.chain.lock().unwrap().timestamp
    }

    /// Make `transcodersArray(index)` fail with a transport error.
    pub fn fail_index(&self, index: Option<u64>) {
        self.chain.lock().unwrap().fail_index = index.map(U256::from);
    }

    /// Make every broadcast fail.
    pub fn reject_submissions(&self, reject: bool) {
        self.chain.lock().unwrap().reject_submissions = reject;
    }

    /// Hide each new receipt for `lookups` receipt queries.
    pub fn set_mining_delay(&self, lookups: usize) {
        self.chain.lock().unwrap().mining_delay = lookups;
    }

    /// Register a transcoder directly, bypassing transactions.
    pub fn seed_transcoder(&self, address: Address, self_stake: u64, delegated: u64) {
        let mut chain = self.chain.lock().unwrap();
        let entry = Entry {
            capacity: U256::from(10),
            self_stake: U256::from(self_stake),
            delegated_stake: U256::from(delegated),
            effective_min_self_stake: chain.min_self_stake,
            slashed: false,
        };
        chain.registry.push(address);
        chain.entries.insert(address, entry);
    }

    fn execute(chain: &mut Chain, sender: Address, call: &StakingCall) -> Result<Vec<Log>, &'static str> {
        let now = chain.timestamp;
        match *call {
            StakingCall::RegisterTranscoder { capacity } => {
                if chain.entries.contains_key(&sender) {
                    return Err("already registered");
                }
                let entry = Entry {
                    capacity,
                    effective_min_self_stake: chain.min_self_stake,
                    ..Default::default()
                };
                chain.registry.push(sender);
                chain.entries.insert(sender, entry);
                Ok(Vec::new())
            }
            StakingCall::Delegate { to, amount } => {
                let entry = chain.entries.get_mut(&to).ok_or("not a transcoder")?;
                if sender == to {
                    entry.self_stake += amount;
                } else {
                    entry.delegated_stake += amount;
                }
                *chain.delegations.entry((sender, to)).or_default() += amount;
                Ok(Vec::new())
            }
            StakingCall::RequestWithdrawal { from, amount } => {
                let staked = chain.delegations.get(&(sender, from)).copied().unwrap_or_default();
                if staked < amount || amount.is_zero() {
                    return Err("insufficient stake");
                }
                let entry = chain.entries.get_mut(&from).ok_or("not a transcoder")?;
                let was_bonded = entry.state() == TranscoderState::Bonded;
                if sender == from {
                    entry.self_stake -= amount;
                } else {
                    entry.delegated_stake -= amount;
                }
                chain.delegations.insert((sender, from), staked - amount);

                if !was_bonded {
                    let event = WithdrawalCompleted {
                        delegator: sender,
                        amount,
                    };
                    return Ok(vec![log_of(&event)]);
                }

                let readiness = now + chain.approval_period;
                let pending = chain.pending.entry(sender).or_default();
                pending.amount += amount;
                pending.readiness_timestamp = readiness;
                let event = WithdrawalRequested {
                    delegator: sender,
                    transcoder: from,
                    amount,
                    readinessTimestamp: U256::from(readiness),
                };
                Ok(vec![log_of(&event)])
            }
            StakingCall::CompleteWithdrawals => match chain.pending.get(&sender).copied() {
                None => Ok(Vec::new()),
                Some(pending) if pending.readiness_timestamp > now => Err("withdrawal not ready"),
                Some(pending) => {
                    chain.pending.remove(&sender);
                    let event = WithdrawalCompleted {
                        delegator: sender,
                        amount: pending.amount,
                    };
                    Ok(vec![log_of(&event)])
                }
            },
            StakingCall::SetApprovalPeriod { seconds } => {
                chain.approval_period = seconds.to::<u64>();
                Ok(Vec::new())
            }
            StakingCall::SetSelfMinStake { amount } => {
                chain.min_self_stake = amount;
                Ok(Vec::new())
            }
            StakingCall::Slash { transcoder } => {
                let entry = chain.entries.get_mut(&transcoder).ok_or("not a transcoder")?;
                entry.slashed = true;
                entry.self_stake = U256::ZERO;
                Ok(Vec::new())
            }
        }
    }
}

fn log_of<E: SolEvent>(event: &E) -> Log {
    Log {
        address: CONTRACT,
        data: event.encode_log_data(),
    }
}

#[async_trait]
impl ReceiptSource for MockStakingLedger {
    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<TxReceipt>> {
        self.calls.receipt_lookups.fetch_add(1, Ordering::SeqCst);
        let mut chain = self.chain.lock().unwrap();
        match chain.receipts.get_mut(&tx_hash) {
            None => Ok(None),
            Some((_, remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Ok(None)
            }
            Some((receipt, _)) => Ok(Some(receipt.clone())),
        }
    }
}

#[async_trait]
impl StakingLedger for MockStakingLedger {
    fn contract_address(&self) -> Address {
        CONTRACT
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.calls.block_number.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain.lock().unwrap().block_number)
    }

    async fn latest_block(&self) -> BlockchainResult<BlockInfo> {
        self.calls.latest_block.fetch_add(1, Ordering::SeqCst);
        let chain = self.chain.lock().unwrap();
        Ok(BlockInfo {
            number: chain.block_number,
            timestamp: chain.timestamp,
        })
    }

    async fn transcoders_count(&self, block: BlockId) -> BlockchainResult<U256> {
        self.calls.transcoders_count.fetch_add(1, Ordering::SeqCst);
        let mut chain = self.chain.lock().unwrap();
        chain.read_blocks.push(block);
        Ok(U256::from(chain.registry.len()))
    }

    async fn transcoder_address_at(&self, index: U256, block: BlockId) -> BlockchainResult<Address> {
        self.calls.transcoder_address_at.fetch_add(1, Ordering::SeqCst);
        let mut chain = self.chain.lock().unwrap();
        chain.read_blocks.push(block);
        if chain.fail_index == Some(index) {
            return Err(BlockchainError::TransientNetwork("connection reset".to_string()));
        }
        usize::try_from(index)
            .ok()
            .and_then(|i| chain.registry.get(i).copied())
            .ok_or_else(|| BlockchainError::RemoteRevert("execution reverted: index out of range".to_string()))
    }

    async fn transcoder_record(&self, address: Address, block: BlockId) -> BlockchainResult<TranscoderRecord> {
        self.calls.transcoder_record.fetch_add(1, Ordering::SeqCst);
        let mut chain = self.chain.lock().unwrap();
        chain.read_blocks.push(block);
        Ok(chain
            .entries
            .get(&address)
            .map(|e| TranscoderRecord {
                total: e.self_stake + e.delegated_stake,
                capacity: e.capacity,
                self_stake: e.self_stake,
                delegated_stake: e.delegated_stake,
                effective_min_self_stake: e.effective_min_self_stake,
            })
            .unwrap_or_default())
    }

    async fn transcoder_state(&self, address: Address, block: BlockId) -> BlockchainResult<TranscoderState> {
        self.calls.transcoder_state.fetch_add(1, Ordering::SeqCst);
        let mut chain = self.chain.lock().unwrap();
        chain.read_blocks.push(block);
        Ok(chain
            .entries
            .get(&address)
            .map(Entry::state)
            .unwrap_or(TranscoderState::Unregistered))
    }

    async fn total_stake(&self, address: Address, _block: BlockId) -> BlockchainResult<U256> {
        self.calls.total_stake.fetch_add(1, Ordering::SeqCst);
        let chain = self.chain.lock().unwrap();
        Ok(chain
            .entries
            .get(&address)
            .map(|e| e.self_stake + e.delegated_stake)
            .unwrap_or_default())
    }

    async fn pending_withdrawal(&self, delegator: Address, _block: BlockId) -> BlockchainResult<PendingWithdrawal> {
        self.calls.pending_withdrawal.fetch_add(1, Ordering::SeqCst);
        let chain = self.chain.lock().unwrap();
        Ok(chain.pending.get(&delegator).copied().unwrap_or_default())
    }

    async fn submit(&self, wallet: &Wallet, call: &StakingCall) -> BlockchainResult<PendingTx> {
        self.calls.submissions.fetch_add(1, Ordering::SeqCst);
        let mut chain = self.chain.lock().unwrap();
        if chain.reject_submissions {
            return Err(BlockchainError::Submission("nonce too low".to_string()));
        }

        chain.tx_count += 1;
        chain.block_number += 1;
        let tx_hash = TxHash::left_padding_from(&chain.tx_count.to_be_bytes());

        let (success, logs) = match Self::execute(&mut chain, wallet.address(), call) {
            Ok(logs) => (true, logs),
            Err(_) => (false, Vec::new()),
        };
        let receipt = TxReceipt {
            tx_hash,
            block_number: Some(chain.block_number),
            success,
            logs,
        };
        let delay = chain.mining_delay;
        chain.receipts.insert(tx_hash, (receipt, delay));

        Ok(PendingTx { tx_hash })
    }
}
