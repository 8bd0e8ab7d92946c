//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (STAKING_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (ETH_* environment overrides)
//!     → validation.rs (semantic checks)
//!     → StakingConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Environment variables win over the file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, load_unvalidated, ConfigError};
pub use schema::{
    BlockchainConfig, LogFormat, ObservabilityConfig, OperatorConfig, PollingConfig,
    StakingConfig, WalletConfig,
};
