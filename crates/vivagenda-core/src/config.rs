use std::path::PathBuf;

use crate::app_config::{AppConfig, Credentials};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected true/false, got \"{other}\""),
            }),
        }
    };

    let credentials = Credentials {
        user: require("VIVVER_USER")?,
        password: require("VIVVER_PASS")?,
    };

    let base_url = or_default("VIVAGENDA_BASE_URL", "https://itabira-mg.vivver.com");
    let gadget_id = parse_u32("VIVAGENDA_GADGET_ID", "225")?;
    let page_length = parse_u32("VIVAGENDA_PAGE_LENGTH", "10000")?;
    let request_timeout_secs = parse_u64("VIVAGENDA_REQUEST_TIMEOUT_SECS", "15")?;
    let user_agent = or_default("VIVAGENDA_USER_AGENT", "vivagenda/0.1 (schedule-sync)");
    let max_attempts = parse_u32("VIVAGENDA_MAX_ATTEMPTS", "3")?;
    let backoff_base_secs = parse_u64("VIVAGENDA_BACKOFF_BASE_SECS", "5")?;
    let accept_invalid_certs = parse_bool("VIVAGENDA_ACCEPT_INVALID_CERTS", "false")?;
    let cache_ttl_mins = parse_u64("VIVAGENDA_CACHE_TTL_MINS", "10")?;
    let cache_path = PathBuf::from(or_default("VIVAGENDA_CACHE_PATH", ".vivagenda-cache.json"));
    let log_level = or_default("VIVAGENDA_LOG_LEVEL", "info");

    if max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "VIVAGENDA_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        credentials,
        base_url,
        gadget_id,
        page_length,
        request_timeout_secs,
        user_agent,
        max_attempts,
        backoff_base_secs,
        accept_invalid_certs,
        cache_ttl_mins,
        cache_path,
        log_level,
    })
}
