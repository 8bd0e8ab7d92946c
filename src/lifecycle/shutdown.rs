//! Shutdown coordination.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::blockchain::types::BlockchainError;
use crate::resilience::WaitControl;

/// Coordinator for cancelling in-flight waits.
///
/// Clones share one token; cancelling any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown has been triggered.
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }

    /// Drive `work` until it finishes or shutdown is triggered.
    ///
    /// On shutdown `work` is dropped wherever it is suspended (an RPC, a
    /// broadcast, a poll) and `Cancelled` is returned.
    pub async fn run_until_triggered<F, T, E>(&self, work: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<BlockchainError>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(BlockchainError::Cancelled.into()),
            result = work => result,
        }
    }

    /// Wait control cancelled by this coordinator, with an optional timeout.
    pub fn wait_control(&self, timeout: Option<Duration>) -> WaitControl {
        let control = WaitControl::new(self.token.child_token());
        match timeout {
            Some(timeout) => control.with_timeout(timeout),
            None => control,
        }
    }
}
