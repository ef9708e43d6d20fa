//! Downscale configuration module.
//!
//! Handles loading, validating, and merging `downscale.toml`. Settings come
//! in layers, each merged key by key over the one below:
//!
//! 1. stock defaults
//! 2. the config file
//! 3. command-line flags ([`ConfigOverrides`])
//!
//! Validation runs once, on the merged result, so a bad value is rejected
//! whichever layer it came from.
//!
//! ## Config File Location
//!
//! `downscale.toml` is read from the working directory, or from the path
//! given with `--config`. A missing default file is not an error; a missing
//! explicit file is.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [compress]
//! max_dimension = 1920      # Longest side of the output, in pixels
//! quality = 0.8             # JPEG quality (0.0-1.0)
//!
//! [upload]
//! allowed_extensions = ["png", "jpg", "jpeg", "gif", "bmp", "webp"]
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{CompressOptions, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "downscale.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `downscale.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownscaleConfig {
    /// Output size bound and JPEG quality.
    pub compress: CompressConfig,
    /// Which files are accepted as upload candidates.
    pub upload: UploadConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl DownscaleConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compress.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "compress.max_dimension must be greater than 0".into(),
            ));
        }
        if !Quality::new(self.compress.quality).is_in_range() {
            return Err(ConfigError::Validation(
                "compress.quality must be between 0.0 and 1.0".into(),
            ));
        }
        if self.upload.allowed_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "upload.allowed_extensions must not be empty".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Output size bound and encoding quality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    /// Longest side allowed in the output, in pixels.
    pub max_dimension: u32,
    /// JPEG quality as a fraction, 0.0 to 1.0.
    pub quality: f32,
}

impl Default for CompressConfig {
    fn default() -> Self {
        let options = CompressOptions::default();
        Self {
            max_dimension: options.max_dimension,
            quality: options.quality.value(),
        }
    }
}

impl CompressConfig {
    pub fn to_options(&self) -> CompressOptions {
        CompressOptions::new(self.max_dimension, self.quality)
    }
}

/// Upload acceptance rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Lowercase file extensions accepted for upload.
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: crate::upload::DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel compression workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(DownscaleConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Settings given on the command line; the top layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub max_dimension: Option<u32>,
    pub quality: Option<f32>,
}

impl ConfigOverrides {
    /// The overrides as a TOML layer holding only the keys that were set.
    pub fn to_toml(&self) -> Option<toml::Value> {
        let mut compress = toml::Table::new();
        if let Some(max) = self.max_dimension {
            compress.insert("max_dimension".into(), toml::Value::Integer(max.into()));
        }
        if let Some(quality) = self.quality {
            compress.insert("quality".into(), toml::Value::Float(quality.into()));
        }
        if compress.is_empty() {
            return None;
        }
        let mut root = toml::Table::new();
        root.insert("compress".into(), toml::Value::Table(compress));
        Some(toml::Value::Table(root))
    }
}

/// Read and parse a config file that must exist.
pub fn read_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    read_config_file(path).map(Some)
}

/// Merge `layers` in order onto the stock defaults, then deserialize and validate.
pub fn resolve_config(
    layers: impl IntoIterator<Item = toml::Value>,
) -> Result<DownscaleConfig, ConfigError> {
    let merged = layers.into_iter().fold(stock_defaults_value(), merge_toml);
    let config: DownscaleConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Build the effective config.
///
/// The file layer is `explicit` when given (it must exist), otherwise
/// `downscale.toml` in `dir` if present. `overrides` go on top.
pub fn load_config(
    dir: &Path,
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<DownscaleConfig, ConfigError> {
    let file = match explicit {
        Some(path) => Some(read_config_file(path)?),
        None => load_raw_config(&dir.join(CONFIG_FILE_NAME))?,
    };
    resolve_config(file.into_iter().chain(overrides.to_toml()))
}

/// Returns a fully-commented stock `downscale.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Downscale Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as downscale.toml in the working directory, or pass
# --config <path>. Command-line flags override values set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Compression
# ---------------------------------------------------------------------------
[compress]
# Longest side of the output in pixels. Smaller images are re-encoded at
# their natural size; nothing is upscaled.
max_dimension = 1920

# JPEG quality from 0.0 (smallest) to 1.0 (best). The encoder works on a
# 1-100 scale: the value is multiplied by 100 and rounded, with 0.0 mapping
# to 1.
quality = 0.8

# ---------------------------------------------------------------------------
# Upload
# ---------------------------------------------------------------------------
[upload]
# File extensions picked up when a directory is given as input.
allowed_extensions = ["png", "jpg", "jpeg", "gif", "bmp", "webp"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of images compressed in parallel.
# Omit to use all CPU cores. Values above the core count are clamped.
# max_processes = 4
"##
}
