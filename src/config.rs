use std::env;
use std::time::Duration;

use log::info;

use crate::error::ConfigError;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Endpoints and transport settings, built once at startup.
#[derive(Debug, Clone)]
pub struct NestConfig {
    /// Login endpoint (`nesturl`).
    pub login_url: String,
    /// Path segment placed between the transport URL and the user id.
    pub rest_path: String,
    pub http_timeout: Duration,
}

impl NestConfig {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `new` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar(key))
        };

        let login_url = required("NEST_URL")?;
        let rest_path = required("NEST_REST_PATH")?;

        let http_timeout = match lookup("NEST_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        name: "NEST_HTTP_TIMEOUT_SECS",
                        value: raw.clone(),
                    })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        info!("Login URL: {}", login_url);
        info!("REST path: {}", rest_path);
        info!("HTTP timeout: {}s", http_timeout.as_secs());

        Ok(NestConfig {
            login_url,
            rest_path,
            http_timeout,
        })
    }
}
