use thiserror::Error;

mod app_config;
mod config;
mod records;

pub use app_config::{AppConfig, Credentials};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{AgendaRecord, AgendaTable, CANONICAL_COLUMNS, MIN_ROW_WIDTH};

/// Errors raised while loading application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
