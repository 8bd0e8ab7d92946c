//! Staking registry client.
//!
//! # Data Flow
//! ```text
//! StakingClient (reads, enumeration, withdrawals)
//!     → StakingLedger (one remote round trip per method)
//!     → contract.rs (sol! binding over BlockchainClient)
//! ```
//!
//! Every snapshot is read fresh from the ledger; nothing is cached.

pub mod client;
pub mod contract;
pub mod enumeration;
pub mod ledger;
pub mod types;
pub mod withdrawal;

pub use client::StakingClient;
pub use contract::{encode_call, withdrawal_from_receipt, AlloyStakingLedger, StakingManager};
pub use ledger::StakingLedger;
pub use types::{
    PendingWithdrawal, StakingCall, Transcoder, TranscoderRange, TranscoderRecord, TranscoderState,
    WithdrawalInfo,
};
