//! Harness configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use shrinkix_client::{ClientBuildError, ShrinkixClient};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_API_KEY: &str = "sk_test_placeholder";
pub const DEFAULT_TEST_IMAGE: &str = "test_quality_90.jpg";
pub const DEFAULT_SECONDARY_IMAGE: &str = "test_quality_10.jpg";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable names.
pub mod vars {
    pub const SERVER_URL: &str = "SERVER_URL";
    pub const API_KEY: &str = "SHRINKIX_API_KEY";
    pub const TEST_IMAGE: &str = "TEST_IMAGE";
    pub const TEST_IMAGE_SECONDARY: &str = "TEST_IMAGE_SECONDARY";
    pub const OUTPUT_DIR: &str = "OUTPUT_DIR";
    pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got `{value}`")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    ZeroTimeout { var: &'static str },

    #[error("cannot build client: {0}")]
    Client(#[from] ClientBuildError),
}

/// Everything a conformance run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub server_url: String,
    pub api_key: String,
    /// Image used by every single-file scenario and as the first batch file.
    pub test_image: PathBuf,
    /// Second file of the batch scenario.
    pub secondary_image: PathBuf,
    /// Where successful payloads are written, if anywhere.
    pub output_dir: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            test_image: PathBuf::from(DEFAULT_TEST_IMAGE),
            secondary_image: PathBuf::from(DEFAULT_SECONDARY_IMAGE),
            output_dir: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl HarnessConfig {
    /// Read the process environment. The first CLI argument, when present,
    /// takes precedence over `SERVER_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), std::env::args().nth(1))
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, server_arg: Option<String>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let server_url = server_arg
            .filter(|v| !v.trim().is_empty())
            .or_else(|| get(vars::SERVER_URL))
            .unwrap_or(defaults.server_url);

        let request_timeout = match get(vars::REQUEST_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                    var: vars::REQUEST_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::ZeroTimeout {
                        var: vars::REQUEST_TIMEOUT_SECS,
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        Ok(Self {
            server_url,
            api_key: get(vars::API_KEY).unwrap_or(defaults.api_key),
            test_image: get(vars::TEST_IMAGE)
                .map(PathBuf::from)
                .unwrap_or(defaults.test_image),
            secondary_image: get(vars::TEST_IMAGE_SECONDARY)
                .map(PathBuf::from)
                .unwrap_or(defaults.secondary_image),
            output_dir: get(vars::OUTPUT_DIR).map(PathBuf::from),
            request_timeout,
        })
    }

    pub fn client(&self) -> Result<ShrinkixClient, ConfigError> {
        Ok(ShrinkixClient::builder(self.server_url.as_str())
            .api_key(self.api_key.as_str())
            .timeout(self.request_timeout)
            .build()?)
    }
}
