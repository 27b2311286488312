// src/settings.rs
//! Process settings, read from the environment.
//!
//! Variables may also come from a `.env` file, which `main` loads before
//! calling [`Settings::from_env`]. Variable names are the upper-cased field
//! names (`SCHEMES_DIR`, `LISTEN_ADDR`, ...).
//!
//! `SCHEMES_DIR` and `DEFAULT_SCHEME_URLS` have no default. The URLs must
//! serve `scheme.json` descriptions in this crate's format; they are only
//! fetched when the scheme directory holds no usable scheme, and startup
//! fails if none of them can be installed then.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Scheme storage directory (required)
    pub schemes_dir: PathBuf,
    pub listen_addr: SocketAddr,
    pub refresh_interval_minutes: u64,
    pub max_body_bytes: usize,
    pub request_timeout_secs: u64,
    pub download_timeout_secs: u64,
    /// Base URLs of the schemes installed into an empty directory (required)
    pub default_scheme_urls: Vec<String>,
}

impl Settings {
    /// Loads and validates settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default())
    }

    fn load(environment: Environment) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("listen_addr", "0.0.0.0:8080")?
            .set_default("refresh_interval_minutes", 15)?
            .set_default("max_body_bytes", 1_048_576)?
            .set_default("request_timeout_secs", 30)?
            .set_default("download_timeout_secs", 30)?
            .add_source(
                environment
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("default_scheme_urls"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_minutes == 0 {
            return Err(ConfigError::Message(
                "REFRESH_INTERVAL_MINUTES must be greater than zero".into(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Message("MAX_BODY_BYTES must be greater than zero".into()));
        }
        if self.request_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err(ConfigError::Message("timeouts must be greater than zero".into()));
        }
        if self.default_scheme_urls.iter().all(|url| url.trim().is_empty()) {
            return Err(ConfigError::Message("DEFAULT_SCHEME_URLS must not be empty".into()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Configured default scheme URLs, blanks removed.
    pub fn scheme_urls(&self) -> Vec<String> {
        self.default_scheme_urls
            .iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect()
    }
}
