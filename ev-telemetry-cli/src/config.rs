//! Configuration loading and parsing
//!
//! The optional config file mirrors the command-line flags; explicit flags
//! win over file values.

use anyhow::{Context, Result};
use ev_telemetry_decoder::{DecoderConfig, SourceHint};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub decoder: DecoderSection,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// File of hex-encoded frames, one per line
    pub file: Option<PathBuf>,
    /// Envelope convention of the feed
    #[serde(default)]
    pub source: SourceHint,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DecoderSection {
    #[serde(flatten)]
    pub decoder: DecoderConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Destination for JSON records (stdout when absent)
    pub file: Option<PathBuf>,
}

/// Load and parse a TOML configuration file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let config: AppConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse config file {:?}", path))?;
    Ok(config)
}
