//! Daemon configuration from environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `QUEUELINE_DB_PATH` | `~/.queueline/waitlist.db` |
//! | `QUEUELINE_RPC_HOST` / `QUEUELINE_RPC_PORT` | `127.0.0.1` / `9630` |
//! | `QUEUELINE_LOG_FORMAT` | `pretty` (`json` for production) |
//! | `QUEUELINE_LOG_DIR` | unset (no log file) |
//! | `QUEUELINE_MAX_CAS_ATTEMPTS` / `QUEUELINE_CAS_BACKOFF_MS` | `5` / `5` |
//! | `QUEUELINE_RATE_LIMIT_BURST` / `QUEUELINE_RATE_LIMIT_RATE` | `200` / `100` |
//! | `QUEUELINE_NOTIFIER_CAPACITY` | `256` |

use anyhow::{Context, Result};
use queueline_api_rpc::RpcServerConfig;
use queueline_core::application::EngineConfig;
use queueline_core::port::change_notifier::DEFAULT_CHANNEL_CAPACITY;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_DB_PATH: &str = "~/.queueline/waitlist.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: String,
    pub rpc: RpcServerConfig,
    pub engine: EngineConfig,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
    pub notifier_capacity: usize,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rpc_defaults = RpcServerConfig::default();
        let engine_defaults = EngineConfig::default();

        let db_path = shellexpand::tilde(
            &lookup("QUEUELINE_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
        )
        .into_owned();

        let log_format = match lookup("QUEUELINE_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let config = Self {
            db_path,
            rpc: RpcServerConfig {
                host: lookup("QUEUELINE_RPC_HOST").unwrap_or(rpc_defaults.host),
                port: parse_or(&lookup, "QUEUELINE_RPC_PORT", rpc_defaults.port)?,
                rate_limit_burst: parse_or(
                    &lookup,
                    "QUEUELINE_RATE_LIMIT_BURST",
                    rpc_defaults.rate_limit_burst,
                )?,
                rate_limit_per_sec: parse_or(
                    &lookup,
                    "QUEUELINE_RATE_LIMIT_RATE",
                    rpc_defaults.rate_limit_per_sec,
                )?,
            },
            engine: EngineConfig {
                max_cas_attempts: parse_or(
                    &lookup,
                    "QUEUELINE_MAX_CAS_ATTEMPTS",
                    engine_defaults.max_cas_attempts,
                )?,
                retry_base_delay_ms: parse_or(
                    &lookup,
                    "QUEUELINE_CAS_BACKOFF_MS",
                    engine_defaults.retry_base_delay_ms,
                )?,
            },
            log_format,
            log_dir: lookup("QUEUELINE_LOG_DIR")
                .map(|dir| PathBuf::from(shellexpand::tilde(&dir).into_owned())),
            notifier_capacity: parse_or(
                &lookup,
                "QUEUELINE_NOTIFIER_CAPACITY",
                DEFAULT_CHANNEL_CAPACITY,
            )?,
        };

        config.engine.validate()?;
        Ok(config)
    }
}

/// Parse an optional variable; a set but malformed value is an error
fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<DaemonConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DaemonConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert!(config.db_path.ends_with(".queueline/waitlist.db"));
        assert!(!config.db_path.starts_with('~'));
        assert_eq!(config.rpc.port, 9630);
        assert_eq!(config.rpc.host, "127.0.0.1");
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.log_dir.is_none());
        assert_eq!(config.notifier_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("QUEUELINE_DB_PATH", "/tmp/q.db"),
            ("QUEUELINE_RPC_PORT", "7000"),
            ("QUEUELINE_MAX_CAS_ATTEMPTS", "8"),
            ("QUEUELINE_CAS_BACKOFF_MS", "0"),
            ("QUEUELINE_LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.db_path, "/tmp/q.db");
        assert_eq!(config.rpc.port, 7000);
        assert_eq!(config.engine.max_cas_attempts, 8);
        assert_eq!(config.engine.retry_base_delay_ms, 0);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_malformed_value_is_rejected() {
        let err = config_from(&[("QUEUELINE_RPC_PORT", "ninety")]).unwrap_err();
        assert!(err.to_string().contains("QUEUELINE_RPC_PORT"));
    }

    #[test]
    fn test_zero_cas_attempts_rejected() {
        assert!(config_from(&[("QUEUELINE_MAX_CAS_ATTEMPTS", "0")]).is_err());
    }
}
