//! Configuration management for Chaser-Harness

use crate::locator::Surface;
use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Harness configuration. Read once at test start and never mutated.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default wait budget on a web surface in milliseconds
    pub web_timeout_ms: u64,

    /// Default wait budget on a mobile surface in milliseconds
    pub mobile_timeout_ms: u64,

    /// Delay between poll ticks in milliseconds
    pub poll_interval_ms: u64,

    /// Bound on a single driver round-trip in milliseconds
    pub call_timeout_ms: u64,

    /// Surface under test
    pub surface: Surface,

    /// WebDriver endpoint (Selenium or Appium)
    pub webdriver_url: String,

    /// Existing WebDriver session to attach to
    pub session_id: Option<String>,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web_timeout_ms: 60_000,
            mobile_timeout_ms: 30_000,
            poll_interval_ms: 250,
            call_timeout_ms: 30_000,
            surface: Surface::Web,
            webdriver_url: "http://localhost:4444".to_string(),
            session_id: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(timeout) = env::var("HARNESS_WEB_TIMEOUT") {
            config.web_timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid HARNESS_WEB_TIMEOUT"))?;
        }

        if let Ok(timeout) = env::var("HARNESS_MOBILE_TIMEOUT") {
            config.mobile_timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid HARNESS_MOBILE_TIMEOUT"))?;
        }

        if let Ok(interval) = env::var("HARNESS_POLL_INTERVAL") {
            config.poll_interval_ms = interval
                .parse()
                .map_err(|_| Error::configuration("Invalid HARNESS_POLL_INTERVAL"))?;
        }

        if let Ok(timeout) = env::var("HARNESS_CALL_TIMEOUT") {
            config.call_timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid HARNESS_CALL_TIMEOUT"))?;
        }

        if let Ok(surface) = env::var("HARNESS_SURFACE") {
            config.surface = surface.parse()?;
        }

        if let Ok(url) = env::var("HARNESS_WEBDRIVER_URL") {
            config.webdriver_url = url;
        }

        if let Ok(session_id) = env::var("HARNESS_SESSION_ID") {
            config.session_id = Some(session_id);
        }

        if let Ok(log_level) = env::var("HARNESS_LOG_LEVEL") {
            config.log_level = log_level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values no wait could run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::configuration("poll_interval_ms must be greater than zero"));
        }
        if self.call_timeout_ms == 0 {
            return Err(Error::configuration("call_timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    /// Default wait budget for a surface
    pub fn default_timeout(&self, surface: Surface) -> Duration {
        match surface {
            Surface::Web => Duration::from_millis(self.web_timeout_ms),
            Surface::Mobile => Duration::from_millis(self.mobile_timeout_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}
