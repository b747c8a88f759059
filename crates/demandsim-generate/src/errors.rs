use thiserror::Error;

use demandsim_config::ConfigError;

use crate::checks::AuditReport;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("no holiday provider for country '{0}'")]
    UnknownCountry(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("output audit failed with {} violation(s)", .0.violations.len())]
    AuditFailed(AuditReport),
}
