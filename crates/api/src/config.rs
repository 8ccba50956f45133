use std::env;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 15 * 60;
const DEFAULT_RATE_LIMIT_MAX: usize = 200;
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024;
const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5000",
    "http://127.0.0.1:5000",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
    #[error("{name} is empty")]
    Empty { name: &'static str },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub max_body_bytes: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            rate_limit_window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECONDS),
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            allowed_origins: default_origins(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source. Values that fail to
    /// parse fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = lookup("SMARTPAY_BIND")
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let rate_limit_window = Duration::from_secs(
            lookup("SMARTPAY_RATE_LIMIT_WINDOW_SECONDS")
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECONDS),
        );
        let rate_limit_max = lookup("SMARTPAY_RATE_LIMIT_MAX")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_MAX);
        let max_body_bytes = lookup("SMARTPAY_MAX_BODY_BYTES")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        let allowed_origins = lookup("SMARTPAY_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(default_origins);

        let config = Self {
            bind,
            rate_limit_window,
            rate_limit_max,
            max_body_bytes,
            allowed_origins,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.is_empty() {
            return Err(ConfigError::Empty {
                name: "SMARTPAY_BIND",
            });
        }
        if self.rate_limit_window.is_zero() {
            return Err(ConfigError::Zero {
                name: "SMARTPAY_RATE_LIMIT_WINDOW_SECONDS",
            });
        }
        if self.rate_limit_max == 0 {
            return Err(ConfigError::Zero {
                name: "SMARTPAY_RATE_LIMIT_MAX",
            });
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Zero {
                name: "SMARTPAY_MAX_BODY_BYTES",
            });
        }
        Ok(())
    }
}

fn default_origins() -> Vec<String> {
    DEFAULT_ALLOWED_ORIGINS
        .iter()
        .map(|value| value.to_string())
        .collect()
}
