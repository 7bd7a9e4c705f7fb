//! Faucet configuration, with environment overrides.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use faucet_ledger_cycle::CycleConfig;
use faucet_ledger_store::LedgerOptions;

use crate::error::{FaucetError, Result};

pub const ENV_CYCLE_INTERVAL_SECS: &str = "FAUCET_CYCLE_INTERVAL_SECS";
pub const ENV_TTL_SECS: &str = "FAUCET_TTL_SECS";
pub const ENV_SEND_BATCH_LIMIT: &str = "FAUCET_SEND_BATCH_LIMIT";
pub const ENV_CONFIRM_BATCH_LIMIT: &str = "FAUCET_CONFIRM_BATCH_LIMIT";
/// Zero disables the callback deadline; unset keeps the 30 s default.
pub const ENV_CALLBACK_TIMEOUT_SECS: &str = "FAUCET_CALLBACK_TIMEOUT_SECS";

/// Configuration for a [`Faucet`](crate::Faucet).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetConfig {
    pub cycle: CycleConfig,
    pub ledger: LedgerOptions,
}

impl FaucetConfig {
    /// Defaults, overridden by any `FAUCET_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_CYCLE_INTERVAL_SECS)? {
            config.cycle.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_TTL_SECS)? {
            config.cycle.ttl = Duration::from_secs(secs);
        }
        if let Some(limit) = parse_var::<usize, _>(&lookup, ENV_SEND_BATCH_LIMIT)? {
            config.cycle.send_batch_limit = limit;
        }
        if let Some(limit) = parse_var::<usize, _>(&lookup, ENV_CONFIRM_BATCH_LIMIT)? {
            config.cycle.confirm_batch_limit = limit;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_CALLBACK_TIMEOUT_SECS)? {
            config.ledger.callback_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.cycle
            .validate()
            .map_err(|e| FaucetError::Config(e.to_string()))?;
        if self.ledger.callback_timeout == Some(Duration::ZERO) {
            return Err(FaucetError::Config(
                "callback timeout must be non-zero when set".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| FaucetError::Config(format!("{}={:?}: {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use faucet_ledger_store::DEFAULT_CALLBACK_TIMEOUT;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = FaucetConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, FaucetConfig::default());
        assert_eq!(config.ledger.callback_timeout, Some(DEFAULT_CALLBACK_TIMEOUT));
    }

    #[test]
    fn test_env_overrides() {
        let config = FaucetConfig::from_lookup(lookup(&[
            (ENV_CYCLE_INTERVAL_SECS, "30"),
            (ENV_TTL_SECS, "600"),
            (ENV_SEND_BATCH_LIMIT, " 25 "),
            (ENV_CONFIRM_BATCH_LIMIT, "50"),
            (ENV_CALLBACK_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();

        assert_eq!(config.cycle.interval, Duration::from_secs(30));
        assert_eq!(config.cycle.ttl, Duration::from_secs(600));
        assert_eq!(config.cycle.send_batch_limit, 25);
        assert_eq!(config.cycle.confirm_batch_limit, 50);
        assert_eq!(config.ledger.callback_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config =
            FaucetConfig::from_lookup(lookup(&[(ENV_CALLBACK_TIMEOUT_SECS, "0")])).unwrap();
        assert_eq!(config.ledger.callback_timeout, None);
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let err = FaucetConfig::from_lookup(lookup(&[(ENV_TTL_SECS, "three minutes")]))
            .unwrap_err();
        assert!(matches!(err, FaucetError::Config(_)));
        assert!(err.to_string().contains(ENV_TTL_SECS));
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let err =
            FaucetConfig::from_lookup(lookup(&[(ENV_SEND_BATCH_LIMIT, "0")])).unwrap_err();
        assert!(matches!(err, FaucetError::Config(_)));

        let err =
            FaucetConfig::from_lookup(lookup(&[(ENV_CYCLE_INTERVAL_SECS, "0")])).unwrap_err();
        assert!(matches!(err, FaucetError::Config(_)));
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = FaucetConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: FaucetConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
