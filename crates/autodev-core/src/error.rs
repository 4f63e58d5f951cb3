use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported config key: {0}")]
    UnsupportedConfigKey(String),

    #[error("Unsupported config value: {value} for key: {key}")]
    UnsupportedConfigValue { key: String, value: String },

    #[error("Unsupported metric key {0}")]
    UnsupportedMetric(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
