//! Application configuration.
//!
//! Everything the agent needs is resolved once at startup into an immutable
//! [`Config`]; no other module reads the process environment. The wallet is
//! the only mandatory value — its absence is the single startup-fatal error.

use crate::system;
use thiserror::Error;

pub const DEFAULT_HOST_ID: &str = "gridlink-host";
pub const DEFAULT_COORDINATOR_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_DIFFICULTY: f64 = 5.5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidVar {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Immutable process configuration, fixed for the agent's lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Wallet credential the coordinator credits work to.
    pub wallet: String,
    /// Host identifier the coordinator tracks gate state under.
    pub host_id: String,
    /// Device identifier; defaults to the local machine name.
    pub device_id: String,
    pub coordinator_url: String,
    pub backend_url: String,
    /// Mining difficulty, a finite real number >= 0.
    pub difficulty: f64,
    /// Manual override for the detected GPU model string.
    pub gpu_override: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(None, None)
    }

    /// Resolve from the environment with optional command-line overrides.
    pub fn from_env_with(
        wallet_override: Option<&str>,
        difficulty_override: Option<f64>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|key| match key {
            "GRIDLINK_WALLET" if wallet_override.is_some() => {
                wallet_override.map(str::to_string)
            }
            _ => std::env::var(key).ok(),
        })?;
        if let Some(difficulty) = difficulty_override {
            validate_difficulty("--difficulty", difficulty)?;
            config.difficulty = difficulty;
        }
        Ok(config)
    }

    fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let wallet = get("GRIDLINK_WALLET")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingVar("GRIDLINK_WALLET"))?;

        let host_id =
            get("GRIDLINK_HOST_ID").unwrap_or_else(|| DEFAULT_HOST_ID.to_string());
        let device_id = get("GRIDLINK_DEVICE_ID").unwrap_or_else(system::machine_name);
        let coordinator_url = get("GRIDLINK_COORDINATOR_URL")
            .unwrap_or_else(|| DEFAULT_COORDINATOR_URL.to_string());
        let backend_url =
            get("GRIDLINK_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let difficulty = match get("GRIDLINK_DIFFICULTY") {
            Some(raw) => {
                let parsed = raw.parse::<f64>().map_err(|_| ConfigError::InvalidVar {
                    var: "GRIDLINK_DIFFICULTY",
                    value: raw.clone(),
                    reason: "not a number",
                })?;
                validate_difficulty("GRIDLINK_DIFFICULTY", parsed)?;
                parsed
            }
            None => DEFAULT_DIFFICULTY,
        };

        let gpu_override =
            get("GRIDLINK_GPU_MODEL").filter(|value| !value.trim().is_empty());

        Ok(Config {
            wallet,
            host_id,
            device_id,
            coordinator_url,
            backend_url,
            difficulty,
            gpu_override,
        })
    }
}

fn validate_difficulty(var: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidVar {
            var,
            value: value.to_string(),
            reason: "must be a finite number >= 0",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + '_ {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| vars.get(key).map(|value| value.to_string())
    }

    #[test]
    fn missing_wallet_is_fatal() {
        let result = Config::from_lookup(lookup(&[]));
        assert!(matches!(
            result,
            Err(ConfigError::MissingVar("GRIDLINK_WALLET"))
        ));
    }

    #[test]
    fn blank_wallet_is_fatal() {
        let result = Config::from_lookup(lookup(&[("GRIDLINK_WALLET", "  ")]));
        assert!(result.is_err());
    }

    #[test]
    fn defaults_fill_everything_but_the_wallet() {
        let config = Config::from_lookup(lookup(&[("GRIDLINK_WALLET", "0xabc")])).unwrap();
        assert_eq!(config.wallet, "0xabc");
        assert_eq!(config.host_id, DEFAULT_HOST_ID);
        assert!(!config.device_id.is_empty());
        assert_eq!(config.coordinator_url, DEFAULT_COORDINATOR_URL);
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.difficulty, DEFAULT_DIFFICULTY);
        assert!(config.gpu_override.is_none());
    }

    #[test]
    fn explicit_values_win_over_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("GRIDLINK_WALLET", "0xabc"),
            ("GRIDLINK_HOST_ID", "rack-7"),
            ("GRIDLINK_DEVICE_ID", "gpu-node-3"),
            ("GRIDLINK_COORDINATOR_URL", "http://coordinator:9000"),
            ("GRIDLINK_DIFFICULTY", "3.25"),
            ("GRIDLINK_GPU_MODEL", "NVIDIA RTX 4090"),
        ]))
        .unwrap();
        assert_eq!(config.host_id, "rack-7");
        assert_eq!(config.device_id, "gpu-node-3");
        assert_eq!(config.coordinator_url, "http://coordinator:9000");
        assert_eq!(config.difficulty, 3.25);
        assert_eq!(config.gpu_override.as_deref(), Some("NVIDIA RTX 4090"));
    }

    #[test]
    fn malformed_difficulty_is_rejected() {
        for bad in ["abc", "-1", "NaN", "inf"] {
            let result = Config::from_lookup(lookup(&[
                ("GRIDLINK_WALLET", "0xabc"),
                ("GRIDLINK_DIFFICULTY", bad),
            ]));
            assert!(result.is_err(), "difficulty {:?} should be rejected", bad);
        }
    }
}
