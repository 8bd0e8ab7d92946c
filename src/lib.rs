//! Client for an on-chain staking registry.
//!
//! Queries transcoder bonding state and stake, enumerates the registry,
//! submits signed staking transactions and waits for withdrawals to mature.

pub mod blockchain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod staking;

pub use blockchain::{BlockchainError, Wallet};
pub use config::schema::StakingConfig;
pub use lifecycle::Shutdown;
pub use resilience::WaitControl;
pub use staking::{StakingClient, StakingLedger};
