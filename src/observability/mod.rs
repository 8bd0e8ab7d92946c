//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Consumers:
//!     → stderr (pretty or compact fmt layer)
//!     → any `metrics` recorder installed by an embedding application
//! ```
//!
//! # Design Decisions
//! - Structured fields (tx_hash, address, index) rather than formatted strings
//! - Metrics are no-ops until a recorder is installed
//! - Secrets never reach either sink

pub mod logging;
pub mod metrics;
