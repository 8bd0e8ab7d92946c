//! Metrics collection.
//!
//! # Metrics
//! - `staking_rpc_calls_total` (counter): RPC calls by method, outcome
//! - `staking_transactions_total` (counter): submitted calls by call name, outcome
//! - `staking_enumerated_transcoders_total` (counter): snapshots produced by enumeration

use metrics::counter;

/// Record one RPC round trip.
pub fn record_rpc_call(method: &'static str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("staking_rpc_calls_total", "method" => method, "outcome" => outcome).increment(1);
}

/// Record the final outcome of a submitted transaction.
pub fn record_transaction(call: &'static str, outcome: &'static str) {
    counter!("staking_transactions_total", "call" => call, "outcome" => outcome).increment(1);
}

/// Record snapshots produced by an enumeration.
pub fn record_enumerated(count: u64) {
    counter!("staking_enumerated_transcoders_total").increment(count);
}
