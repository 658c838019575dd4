use chrono::{FixedOffset, Offset, Utc};

/// Application-level constants
pub const APP_NAME: &str = "CareFlow";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_BACKEND_URL: &str = "CAREFLOW_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "CAREFLOW_ANON_KEY";
pub const ENV_SITE_ORIGIN: &str = "CAREFLOW_SITE_ORIGIN";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "CAREFLOW_HTTP_TIMEOUT_SECS";
pub const ENV_UTC_OFFSET_MINUTES: &str = "CAREFLOW_UTC_OFFSET_MINUTES";

const DEFAULT_SITE_ORIGIN: &str = "http://localhost:5173";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "careflow_lib=info,warn"
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Connection settings for the hosted backend plus client-side conventions.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the hosted backend (auth and REST live under it).
    pub backend_url: String,
    /// Public API key sent as `apikey` on every request.
    pub anon_key: String,
    /// Origin used to build OAuth / email redirect targets.
    pub site_origin: String,
    /// Request timeout. `None` leaves the HTTP client default in place.
    pub http_timeout_secs: Option<u64>,
    /// Offset applied to naive date/time inputs (datetime-local fields).
    pub utc_offset: FixedOffset,
}

impl ClientConfig {
    pub fn new(backend_url: &str, anon_key: &str) -> Self {
        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            http_timeout_secs: None,
            utc_offset: Utc.fix(),
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend_url = non_empty(ENV_BACKEND_URL)
            .map(|v| v.trim().to_string())
            .ok_or(ConfigError::Missing(ENV_BACKEND_URL))?;
        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                key: ENV_BACKEND_URL,
                value: backend_url,
            });
        }
        let anon_key = non_empty(ENV_ANON_KEY).ok_or(ConfigError::Missing(ENV_ANON_KEY))?;

        let mut config = Self::new(&backend_url, anon_key.trim());

        if let Some(origin) = non_empty(ENV_SITE_ORIGIN) {
            config.site_origin = origin.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = non_empty(ENV_HTTP_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::Invalid {
                    key: ENV_HTTP_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
            config.http_timeout_secs = Some(secs);
        }

        if let Some(raw) = non_empty(ENV_UTC_OFFSET_MINUTES) {
            config.utc_offset = raw
                .trim()
                .parse::<i32>()
                .ok()
                .and_then(|minutes| minutes.checked_mul(60))
                .and_then(FixedOffset::east_opt)
                .ok_or(ConfigError::Invalid {
                    key: ENV_UTC_OFFSET_MINUTES,
                    value: raw.clone(),
                })?;
        }

        Ok(config)
    }

    /// `{site_origin}{path}` for redirect targets.
    pub fn redirect_to(&self, path: &str) -> String {
        format!("{}{}", self.site_origin, path)
    }
}
