//! Process lifecycle for the binaries.
//!
//! # Data Flow
//! ```text
//! Ctrl-C (signals.rs)
//!     → Shutdown token cancelled (shutdown.rs)
//!     → every WaitControl derived from it stops within one tick
//!     → error mapped to a process exit code (exit.rs)
//! ```

pub mod exit;
pub mod shutdown;
pub mod signals;

pub use exit::{exit_code, AppError};
pub use shutdown::Shutdown;
