//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Bounded wait (receipt confirmation, withdrawal readiness):
//!     → polling.rs (tick, check, classify into PollState)
//!     → backoff.rs (delay between ticks, fixed or exponential with jitter)
//!     → WaitControl (cancellation token + deadline, checked every tick)
//! ```
//!
//! # Design Decisions
//! - Every wait has a cancellation signal; deadlines are optional
//! - No hidden retries: a failed check ends the wait with its error
//! - Intervals and deadlines come from configuration

pub mod backoff;
pub mod polling;

pub use polling::{poll_until, PollPolicy, PollState, WaitControl};
