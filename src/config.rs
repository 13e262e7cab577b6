//! Runtime configuration — credentials, service endpoint, batch tuning.
//!
//! Everything comes from the environment; the API key is the one hard
//! requirement and is checked before any batch work starts.

use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Ledgerscan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Vision-language model the extraction boundary talks to.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Per-request timeout; a ledger photo is one shot, no retry.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default worker count for batch runs. Each worker drives one concurrent
/// request against the service quota.
pub const DEFAULT_MAX_WORKERS: usize = 4;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Extraction-service configuration read once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_workers: usize,
}

impl ServiceConfig {
    /// Read configuration from the environment. Fails fast when the
    /// credential is absent — no batch work starts without it.
    ///
    /// Recognized variables: `GEMINI_API_KEY` (required), `GEMINI_BASE_URL`,
    /// `GEMINI_MODEL`, `GEMINI_TIMEOUT_SECS`, `LEDGERSCAN_MAX_WORKERS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = match std::env::var("GEMINI_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "GEMINI_TIMEOUT_SECS",
                value: raw,
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let max_workers = match std::env::var("LEDGERSCAN_MAX_WORKERS") {
            Ok(raw) => match raw.parse() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "LEDGERSCAN_MAX_WORKERS",
                        value: raw,
                    })
                }
            },
            Err(_) => DEFAULT_MAX_WORKERS,
        };

        Ok(Self {
            api_key,
            base_url,
            model,
            timeout_secs,
            max_workers,
        })
    }
}

/// Get the application data directory
/// ~/Ledgerscan/ on all platforms (user-visible, clerks open it directly)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Where CSV exports land by default
pub fn exports_dir() -> PathBuf {
    app_data_dir().join("exports")
}

/// Default location of the session-history database
pub fn sessions_db_path() -> PathBuf {
    app_data_dir().join("sessions.db")
}

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> &'static str {
    "info,ledgerscan=debug"
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Env-var tests run under one lock so parallel tests don't interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [
            "GEMINI_API_KEY",
            "GEMINI_BASE_URL",
            "GEMINI_MODEL",
            "GEMINI_TIMEOUT_SECS",
            "LEDGERSCAN_MAX_WORKERS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        assert!(matches!(ServiceConfig::from_env(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn blank_api_key_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "   ");
        assert!(matches!(ServiceConfig::from_env(), Err(ConfigError::MissingApiKey)));
        clear_env();
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "test-key");
        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.max_workers, DEFAULT_MAX_WORKERS);
        clear_env();
    }

    #[test]
    fn overrides_are_honored() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "k");
        std::env::set_var("GEMINI_BASE_URL", "http://localhost:9000");
        std::env::set_var("GEMINI_MODEL", "gemini-2.5-pro");
        std::env::set_var("GEMINI_TIMEOUT_SECS", "30");
        std::env::set_var("LEDGERSCAN_MAX_WORKERS", "6");
        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_workers, 6);
        clear_env();
    }

    #[test]
    fn garbage_numeric_overrides_are_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "k");
        std::env::set_var("GEMINI_TIMEOUT_SECS", "soon");
        assert!(matches!(
            ServiceConfig::from_env(),
            Err(ConfigError::Invalid { name: "GEMINI_TIMEOUT_SECS", .. })
        ));
        clear_env();

        std::env::set_var("GEMINI_API_KEY", "k");
        std::env::set_var("LEDGERSCAN_MAX_WORKERS", "0");
        assert!(matches!(
            ServiceConfig::from_env(),
            Err(ConfigError::Invalid { name: "LEDGERSCAN_MAX_WORKERS", .. })
        ));
        clear_env();
    }

    #[test]
    fn data_dirs_nest_under_home() {
        let home = dirs::home_dir().unwrap();
        assert!(app_data_dir().starts_with(&home));
        assert!(exports_dir().starts_with(app_data_dir()));
        assert!(sessions_db_path().starts_with(app_data_dir()));
        assert!(sessions_db_path().ends_with("sessions.db"));
    }
}
