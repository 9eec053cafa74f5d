use std::time::Duration;

use nexora_core::image::MAX_DIMENSION;

/// Default delay between two status reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
/// Default wall-clock budget for polling a task.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Timeout for the multipart upload that creates a task.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for a single status read.
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// Enhancement client configuration.
///
/// Built once (usually via [`EnhanceConfig::from_env`]) and handed to
/// [`Enhancer::from_config`](crate::pipeline::Enhancer::from_config).
/// Nothing downstream reads the environment.
#[derive(Debug, Clone)]
pub struct EnhanceConfig {
    /// Credential sent as `X-API-KEY` to the upscaler.
    pub api_key: String,
    /// Upscaler base URL, without trailing slash.
    pub base_url: String,
    /// Nexora backend base URL, without trailing slash.
    pub backend_url: String,
    /// Delay between status reads (default: 2000 ms).
    pub poll_interval: Duration,
    /// Overall polling budget (default: 120 s).
    pub timeout: Duration,
    /// Upload request timeout (30 s).
    pub upload_timeout: Duration,
    /// Status request timeout (10 s).
    pub status_timeout: Duration,
    /// Images larger than this on either side are resized (default: 4096).
    pub max_dimension: u32,
}

impl EnhanceConfig {
    /// Configuration with default timings for the given endpoints.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        backend_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: trim_base_url(base_url.into()),
            backend_url: trim_base_url(backend_url.into()),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            upload_timeout: UPLOAD_TIMEOUT,
            status_timeout: STATUS_TIMEOUT,
            max_dimension: MAX_DIMENSION,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `ENHANCE_API_KEY`          | yes      | --      |
    /// | `ENHANCE_BASE_URL`         | yes      | --      |
    /// | `BACKEND_URL`              | yes      | --      |
    /// | `ENHANCE_POLL_INTERVAL_MS` | no       | `2000`  |
    /// | `ENHANCE_TIMEOUT_SECS`     | no       | `120`   |
    /// | `ENHANCE_MAX_DIMENSION`    | no       | `4096`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through
    /// `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let mut config = Self::new(
            require("ENHANCE_API_KEY")?,
            require("ENHANCE_BASE_URL")?,
            require("BACKEND_URL")?,
        );

        if let Some(ms) = parse_optional::<u64>(&lookup, "ENHANCE_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_optional::<u64>(&lookup, "ENHANCE_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(max) = parse_optional::<u32>(&lookup, "ENHANCE_MAX_DIMENSION")? {
            if max == 0 {
                return Err(ConfigError::Invalid {
                    key: "ENHANCE_MAX_DIMENSION",
                    value: max.to_string(),
                });
            }
            config.max_dimension = max;
        }

        Ok(config)
    }
}

fn parse_optional<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn trim_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Errors raised while loading [`EnhanceConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Required environment variable '{0}' is not set")]
    Missing(&'static str),

    #[error("Environment variable '{key}' has an invalid value: '{value}'")]
    Invalid { key: &'static str, value: String },
}
