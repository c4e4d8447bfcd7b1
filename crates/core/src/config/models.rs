//! Configuration model used by the rest of the client.
//!
//! This module provides the `AppConfig` structure that wraps the parsed
//! `ClientConfig` together with where it came from, and exposes the
//! millisecond settings as `Duration`s.

use od_protocol::config_models::ClientConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Resolved application configuration.
///
/// # Example
///
/// ```rust,no_run
/// use od_core::config::loader::load_config;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("."))?;
/// println!("API at {}", config.settings.api.base_url);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Settings after file, environment and flag overrides.
    pub settings: ClientConfig,

    /// The `config.toml` that was read, if one existed.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings.pipeline.poll_interval_ms)
    }

    pub fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.chat.typing_timeout_ms)
    }
}
