//! OS signal handling.
//!
//! The first Ctrl-C triggers the [`Shutdown`] coordinator, which cancels
//! every wait derived from it and the work driven by
//! [`Shutdown::run_until_triggered`]. Listening for Ctrl-C replaces the
//! default handler for the rest of the process, so a second Ctrl-C exits
//! immediately with status 130.

use crate::lifecycle::Shutdown;

/// Exit status for a process stopped by an interrupt.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Spawn a task that triggers `shutdown` on Ctrl-C.
pub fn install(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        tracing::warn!("Interrupt received, cancelling in-flight work");
        shutdown.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second interrupt received, exiting");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    })
}
