//! Configuration file loader for the `.opsdesk/` directory.
//!
//! Settings are resolved in three layers, later layers winning:
//! - `.opsdesk/config.toml`
//! - `OPSDESK_*` environment variables
//! - command line flags (applied by the caller)

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use od_protocol::config_models::ClientConfig;
use std::path::Path;

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".opsdesk";

/// Environment variable overriding `api.base-url`.
pub const ENV_API_URL: &str = "OPSDESK_API_URL";
/// Environment variable overriding `realtime.url`.
pub const ENV_REALTIME_URL: &str = "OPSDESK_REALTIME_URL";
/// Environment variable overriding `api.auth-token`.
pub const ENV_AUTH_TOKEN: &str = "OPSDESK_AUTH_TOKEN";

/// Loads configuration from `<root>/.opsdesk/config.toml` and the process
/// environment.
///
/// If the directory or file is missing, defaults are used rather than
/// returning an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file is not valid TOML or has wrongly typed values
/// - A resolved value is unusable (see [`validate`])
pub fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let mut config = load_file(root)?;
    apply_env_overrides(&mut config.settings, |key| std::env::var(key).ok());
    validate(&config.settings)?;
    Ok(config)
}

/// Reads `config.toml` without applying overrides.
pub fn load_file(root: &Path) -> ConfigResult<AppConfig> {
    let config_path = root.join(CONFIG_DIR).join("config.toml");

    if !config_path.exists() {
        return Ok(AppConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let settings: ClientConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    Ok(AppConfig {
        settings,
        source: Some(config_path),
    })
}

/// Applies `OPSDESK_*` overrides using `lookup` to read variables.
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(settings: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = read(ENV_API_URL) {
        settings.api.base_url = url;
    }
    if let Some(url) = read(ENV_REALTIME_URL) {
        settings.realtime.url = url;
    }
    if let Some(token) = read(ENV_AUTH_TOKEN) {
        settings.api.auth_token = Some(token);
    }
}

/// Checks values the client cannot run with.
pub fn validate(settings: &ClientConfig) -> ConfigResult<()> {
    let base_url = settings.api.base_url.as_str();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid("api.base-url", "must be an http(s) URL"));
    }

    let realtime_url = settings.realtime.url.as_str();
    if !(realtime_url.starts_with("ws://") || realtime_url.starts_with("wss://")) {
        return Err(invalid("realtime.url", "must be a ws(s) URL"));
    }

    if settings.pipeline.poll_interval_ms == 0 {
        return Err(invalid("pipeline.poll-interval-ms", "must be greater than 0"));
    }
    if settings.chat.typing_timeout_ms == 0 {
        return Err(invalid("chat.typing-timeout-ms", "must be greater than 0"));
    }
    if settings.api.request_timeout_ms == 0 {
        return Err(invalid("api.request-timeout-ms", "must be greater than 0"));
    }
    if settings.realtime.reconnect_delay_ms == 0 {
        return Err(invalid("realtime.reconnect-delay-ms", "must be greater than 0"));
    }

    Ok(())
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidConfig {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
