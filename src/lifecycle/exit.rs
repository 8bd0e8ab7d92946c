//! Mapping of failures to process exit codes.

use std::process::ExitCode;
use thiserror::Error;

use crate::blockchain::types::BlockchainError;
use crate::config::ConfigError;

/// Top-level failure of a binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid argument: {0}")]
    Usage(String),

    #[error(transparent)]
    Chain(#[from] BlockchainError),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl AppError {
    pub fn code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Usage(_) => 2,
            AppError::Output(_) => 1,
            AppError::Chain(e) => match e {
                BlockchainError::Wallet(_)
                | BlockchainError::InvalidConfig(_)
                | BlockchainError::ChainMismatch { .. } => 2,
                BlockchainError::TransientNetwork(_) | BlockchainError::Timeout(_) => 3,
                BlockchainError::DeadlineExceeded => 4,
                BlockchainError::RemoteRevert(_) | BlockchainError::ExecutionReverted { .. } => 5,
                BlockchainError::NoPendingWithdrawals => 6,
                BlockchainError::Cancelled => 130,
                BlockchainError::Submission(_) | BlockchainError::InvalidResponse(_) => 1,
            },
        }
    }
}

/// Log `result` and turn it into the process exit code.
pub fn exit_code(result: Result<(), AppError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.code(), "Exiting with failure");
            eprintln!("error: {}", e);
            ExitCode::from(e.code())
        }
    }
}
