//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod parse;
pub mod validate;

use std::fs;
use std::path::{Path, PathBuf};

use statex_core::{ExtractionError, ParseRequest, StatexConfig};
use tracing::debug;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("statex")
        .join("config.json")
}

/// Load the configuration from an explicit path, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<StatexConfig> {
    if let Some(path) = config_path {
        return Ok(StatexConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(StatexConfig::from_file(&default_path)?)
    } else {
        Ok(StatexConfig::default())
    }
}

/// Whether the file can be turned into a parse request.
pub fn is_supported(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext.to_lowercase().as_str(), "txt" | "json")
}

/// Read a `.txt` file of OCR text or a `.json` parse request.
pub fn read_request(path: &Path) -> anyhow::Result<ParseRequest> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let content = fs::read_to_string(path)?;
    match extension.as_str() {
        "txt" => Ok(ParseRequest::new(content)),
        "json" => Ok(ParseRequest::from_json(&content)?),
        _ => Err(ExtractionError::InvalidRequest(format!(
            "unsupported file format: {}",
            extension
        ))
        .into()),
    }
}
