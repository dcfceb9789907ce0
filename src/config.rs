//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Detector service configuration.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Directory holding the four exported model artifacts.
    pub model_dir: PathBuf,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// HTTP port.
    pub port: u16,
    /// Upper bound on a single classification request.
    pub request_timeout: Duration,
    /// Longest accepted message, in characters.
    pub max_input_chars: usize,
    /// Whether to run the terminal REPL alongside the server.
    pub cli_enabled: bool,
    /// When set, logs are also written to daily-rotated files here.
    pub log_dir: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./models"),
            bind_addr: "0.0.0.0".to_string(),
            port: 8501,
            request_timeout: Duration::from_millis(2000),
            max_input_chars: 10_000,
            cli_enabled: true,
            log_dir: None,
        }
    }
}

impl DetectorConfig {
    /// Build configuration from `SPAM_DETECTOR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let model_dir = lookup("SPAM_DETECTOR_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_dir);
        let bind_addr = lookup("SPAM_DETECTOR_BIND").unwrap_or(defaults.bind_addr);
        let port = parse_var(&lookup, "SPAM_DETECTOR_PORT")?.unwrap_or(defaults.port);
        let request_timeout = parse_var::<u64, _>(&lookup, "SPAM_DETECTOR_REQUEST_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);
        let max_input_chars = parse_var(&lookup, "SPAM_DETECTOR_MAX_INPUT_CHARS")?
            .unwrap_or(defaults.max_input_chars);
        let cli_enabled = match lookup("SPAM_DETECTOR_CLI") {
            Some(v) => parse_flag("SPAM_DETECTOR_CLI", &v)?,
            None => defaults.cli_enabled,
        };
        let log_dir = lookup("SPAM_DETECTOR_LOG_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "SPAM_DETECTOR_REQUEST_TIMEOUT_MS".into(),
                message: "must be greater than zero".into(),
            });
        }

        Ok(Self {
            model_dir,
            bind_addr,
            port,
            request_timeout,
            max_input_chars,
            cli_enabled,
            log_dir,
        })
    }

    /// `host:port` string for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
