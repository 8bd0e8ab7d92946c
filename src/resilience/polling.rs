//! Cancellable polling loop.
//!
//! # Responsibilities
//! - Drive a check future once per tick until it reports completion
//! - Stop within one tick when the caller cancels or the deadline passes
//! - Surface check errors immediately (no retry)
//!
//! Each tick lands in one [`PollState`]. `Waiting` schedules the next tick and
//! every other state is terminal.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::schema::PollingConfig;
use crate::resilience::backoff::calculate_backoff;

/// Cancellation signal and optional deadline for one bounded wait.
#[derive(Debug, Clone, Default)]
pub struct WaitControl {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl WaitControl {
    /// Wait governed only by `cancel`.
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel, deadline: None }
    }

    /// Add an absolute deadline. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Add a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolves when the deadline passes; never resolves without one.
    async fn deadline_elapsed(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

/// Interval schedule between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_interval: Duration,
    /// Grow the interval exponentially (with jitter) instead of keeping it fixed.
    pub backoff: bool,
}

impl PollPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            backoff: false,
        }
    }

    /// Delay to sleep after the given (1-based) unsuccessful tick.
    pub fn delay(&self, attempt: u32) -> Duration {
        if !self.backoff {
            return self.interval;
        }
        calculate_backoff(
            attempt,
            self.interval.as_millis() as u64,
            self.max_interval.as_millis() as u64,
        )
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_interval: Duration::from_millis(config.max_poll_interval_ms.max(config.poll_interval_ms)),
            backoff: config.backoff,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

/// Outcome of one tick of a polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState<T> {
    /// Condition not met yet; tick again.
    Waiting,
    /// Condition met.
    Completed(T),
    /// The cancellation token fired.
    Cancelled,
    /// The deadline passed.
    TimedOut,
}

impl<T> PollState<T> {
    /// Map a terminal state to the caller-visible result.
    ///
    /// Returns `None` for `Waiting`.
    fn into_outcome(self) -> Option<BlockchainResult<T>> {
        match self {
            PollState::Waiting => None,
            PollState::Completed(value) => Some(Ok(value)),
            PollState::Cancelled => Some(Err(BlockchainError::Cancelled)),
            PollState::TimedOut => Some(Err(BlockchainError::DeadlineExceeded)),
        }
    }
}

/// Run `check` every tick until it yields `Some`.
///
/// A check that is in flight when cancellation or the deadline fires is
/// dropped and its result discarded. Errors from `check` end the loop as-is.
pub async fn poll_until<T, F, Fut>(
    control: &WaitControl,
    policy: &PollPolicy,
    mut check: F,
) -> BlockchainResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BlockchainResult<Option<T>>>,
{
    let mut attempt: u32 = 0;

    loop {
        let state = tokio::select! {
            biased;
            _ = control.cancel.cancelled() => PollState::Cancelled,
            _ = control.deadline_elapsed() => PollState::TimedOut,
            checked = check() => match checked? {
                Some(value) => PollState::Completed(value),
                None => PollState::Waiting,
            },
        };
        if let Some(outcome) = state.into_outcome() {
            return outcome;
        }

        attempt = attempt.saturating_add(1);
        let delay = policy.delay(attempt);
        tracing::trace!(attempt = attempt, delay_ms = delay.as_millis() as u64, "Poll tick pending");

        let state: PollState<T> = tokio::select! {
            biased;
            _ = control.cancel.cancelled() => PollState::Cancelled,
            _ = control.deadline_elapsed() => PollState::TimedOut,
            _ = sleep(delay) => PollState::Waiting,
        };
        if let Some(outcome) = state.into_outcome() {
            return outcome;
        }
    }
}
