//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::StakingConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV_VAR: &str = "STAKING_CONFIG";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML file without validating it.
pub fn read_config_file(path: &Path) -> Result<StakingConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<StakingConfig, ConfigError> {
    let config = read_config_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay `ETH_*` variables onto `config`.
///
/// `lookup` abstracts the environment so callers and tests can supply their own.
pub fn apply_env_overrides<F>(config: &mut StakingConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("ETH_URL") {
        config.blockchain.rpc_url = v;
    }
    if let Some(v) = lookup("ETH_CONTRACT") {
        config.blockchain.contract_address = v;
    }
    if let Some(v) = lookup("ETH_CHAINID") {
        let id = v.trim().parse().map_err(|_| ConfigError::Env {
            var: "ETH_CHAINID",
            message: format!("'{}' is not a chain id", v),
        })?;
        config.blockchain.chain_id = Some(id);
    }
    if let Some(v) = lookup("ETH_KEY") {
        config.wallet.key_file = Some(v);
    }
    if let Some(v) = lookup("ETH_PASSWORD") {
        config.wallet.password = Some(v);
    }
    if let Some(v) = lookup("ETH_PRIVATEKEY") {
        config.wallet.private_key = Some(v);
    }
    if let Some(v) = lookup("ETH_UPDATEAPPROVAL") {
        config.operator.update_approval = parse_bool("ETH_UPDATEAPPROVAL", &v)?;
    }
    if let Some(v) = lookup("ETH_APPROVALPERIOD") {
        config.operator.approval_period = Some(v);
    }
    if let Some(v) = lookup("ETH_UPDATEMINSTAKE") {
        config.operator.update_min_stake = parse_bool("ETH_UPDATEMINSTAKE", &v)?;
    }
    if let Some(v) = lookup("ETH_MINSTAKE") {
        config.operator.min_stake = Some(v);
    }
    if let Some(v) = lookup("ETH_SLASHED") {
        config.operator.slashed = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    Ok(())
}

/// Build the effective configuration for a binary.
///
/// Reads the file named by `STAKING_CONFIG` when set, applies process
/// environment overrides, then validates.
pub fn load() -> Result<StakingConfig, ConfigError> {
    let config = load_unvalidated()?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Same as [`load`] without validation, for callers that layer further
/// overrides on top.
pub fn load_unvalidated() -> Result<StakingConfig, ConfigError> {
    let mut config = match std::env::var(CONFIG_PATH_ENV_VAR) {
        Ok(path) => read_config_file(Path::new(&path))?,
        Err(_) => StakingConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Env {
            var,
            message: format!("'{}' is not a boolean", raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = StakingConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("ETH_URL", "http://node:8545"),
                ("ETH_CONTRACT", "0x0202020000000000000000000000000000000000"),
                ("ETH_CHAINID", "1337"),
                ("ETH_KEY", "/keys/op.json"),
                ("ETH_PASSWORD", "secret"),
                ("ETH_UPDATEAPPROVAL", "true"),
                ("ETH_APPROVALPERIOD", "2h"),
                ("ETH_SLASHED", "0x0000000000000000000000000000000000000001, 0x0000000000000000000000000000000000000002,"),
            ]),
        )
        .unwrap();

        assert_eq!(config.blockchain.rpc_url, "http://node:8545");
        assert_eq!(config.blockchain.chain_id, Some(1337));
        assert_eq!(config.wallet.key_file.as_deref(), Some("/keys/op.json"));
        assert!(config.operator.update_approval);
        assert!(!config.operator.update_min_stake);
        assert_eq!(config.operator.slashed.len(), 2);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bad_env_bool() {
        let mut config = StakingConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("ETH_UPDATEMINSTAKE", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("ETH_UPDATEMINSTAKE"));
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [blockchain]
            rpc_url = "http://127.0.0.1:8545"
            contract_address = "0x0202020000000000000000000000000000000000"

            [polling]
            poll_interval_ms = 250
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.polling.poll_interval_ms, 250);
    }

    #[test]
    fn test_load_config_reports_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[polling]\npoll_interval_ms = 0").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("polling.poll_interval_ms"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/staking.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
