use std::path::Path;

use serde_json::Value;

use crate::errors::{ConfigError, Result};
use crate::validate::{ValidatedWorld, validate_world};

/// Supported world document encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Parse and validate a world document.
///
/// TOML documents must quote dates (`start_date = "2024-01-01"`); both
/// encodings go through the same JSON Schema and semantic checks.
pub fn parse_world(contents: &str, format: ConfigFormat) -> Result<ValidatedWorld> {
    let value: Value = match format {
        ConfigFormat::Json => serde_json::from_str(contents)?,
        ConfigFormat::Toml => toml::from_str(contents)?,
    };
    validate_world(&value).map_err(ConfigError::Invalid)
}

/// Read, parse and validate a world document from disk.
pub fn load_world(path: &Path) -> Result<ValidatedWorld> {
    let format = ConfigFormat::from_path(path)?;
    let contents = std::fs::read_to_string(path)?;
    parse_world(&contents, format)
}
