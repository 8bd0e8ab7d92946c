//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check addresses, URLs and amounts parse
//! - Validate value ranges (timeouts > 0, intervals > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StakingConfig → Result<(), Vec<ValidationError>>
//! - The parse helpers are reused by the binaries so accepted syntax matches

use std::time::Duration;

use alloy::primitives::{Address, U256};

use crate::config::schema::StakingConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &StakingConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.blockchain.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new("blockchain.rpc_url", e.to_string()));
    }
    if config.blockchain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be greater than 0"));
    }
    if config.blockchain.contract_address.is_empty() {
        errors.push(ValidationError::new("blockchain.contract_address", "is required"));
    } else if let Err(e) = parse_address(&config.blockchain.contract_address) {
        errors.push(ValidationError::new("blockchain.contract_address", e));
    }

    if config.polling.poll_interval_ms == 0 {
        errors.push(ValidationError::new("polling.poll_interval_ms", "must be greater than 0"));
    }
    if config.polling.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "polling.confirmation_timeout_secs",
            "must be greater than 0",
        ));
    }

    let operator = &config.operator;
    if operator.update_approval {
        match operator.approval_period.as_deref() {
            None => errors.push(ValidationError::new(
                "operator.approval_period",
                "required when update_approval is set",
            )),
            Some(raw) => {
                if let Err(e) = parse_duration(raw) {
                    errors.push(ValidationError::new("operator.approval_period", e));
                }
            }
        }
    }
    if operator.update_min_stake {
        match operator.min_stake.as_deref() {
            None => errors.push(ValidationError::new(
                "operator.min_stake",
                "required when update_min_stake is set",
            )),
            Some(raw) => {
                if let Err(e) = parse_amount(raw) {
                    errors.push(ValidationError::new("operator.min_stake", e));
                }
            }
        }
    }
    for (i, raw) in operator.slashed.iter().enumerate() {
        if let Err(e) = parse_address(raw) {
            errors.push(ValidationError::new(&format!("operator.slashed[{}]", i), e));
        }
    }

    let wallet = &config.wallet;
    if operator.has_actions() && wallet.key_file.is_none() && wallet.private_key.is_none() {
        errors.push(ValidationError::new(
            "wallet",
            "operator actions need key_file or private_key",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse a 20-byte hex address.
pub fn parse_address(raw: &str) -> Result<Address, String> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| format!("can't use '{}' as an address: {}", raw, e))
}

/// Parse a token amount, decimal or `0x`-prefixed hex.
pub fn parse_amount(raw: &str) -> Result<U256, String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(raw, 10),
    };
    parsed.map_err(|e| format!("can't use '{}' as an amount: {}", raw, e))
}

/// Parse a duration written as bare seconds or with an `s`, `m` or `h` suffix.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (digits, unit_secs) = match raw.char_indices().last() {
        Some((i, 's')) => (&raw[..i], 1),
        Some((i, 'm')) => (&raw[..i], 60),
        Some((i, 'h')) => (&raw[..i], 3600),
        _ => (raw, 1),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("can't use '{}' as a duration", raw))?;
    value
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", raw))
}
