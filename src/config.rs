//! Annotation configuration module.
//!
//! Handles loading, validating, and merging a `plotmark.toml` file. Stock
//! defaults are the base layer; a user file only needs the keys it wants to
//! override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [style]
//! stroke_color = "#ff0000"  # Outline color (#rgb, #rrggbb or #rrggbbaa)
//! stroke_width = 1          # Outline thickness in pixels, drawn inward
//! label_color = "#ff0000"   # Label text color
//! label_size = 14.0         # Label font height in pixels
//! label_offset = [2, 2]     # Label position relative to the top-left corner
//! # label_background = "#ffffff"  # Optional box behind each label
//!
//! [encode]
//! jpeg_quality = 75         # JPEG re-encode quality (1-100)
//!
//! [fetch]
//! timeout_secs = 30         # Upper bound for URL sources
//! user_agent = "plotmark/x.y.z"
//!
//! [notify]
//! api_base = "https://notify-api.line.me"
//! timeout_secs = 30
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{LABEL_SIZE_RANGE, PlotStyle, Quality, STROKE_WIDTH_RANGE};
use crate::source::DEFAULT_USER_AGENT;
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotateConfig {
    /// Outline and label appearance.
    pub style: StyleConfig,
    /// Re-encoding settings.
    pub encode: EncodeConfig,
    /// URL source settings.
    pub fetch: FetchConfig,
    /// LINE Notify client settings.
    pub notify: NotifyConfig,
}

impl AnnotateConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.style.resolve()?;
        if !(1..=100).contains(&self.encode.jpeg_quality) {
            return Err(ConfigError::Validation(
                "encode.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.notify.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "notify.timeout_secs must be greater than 0".into(),
            ));
        }
        if !(self.notify.api_base.starts_with("http://")
            || self.notify.api_base.starts_with("https://"))
        {
            return Err(ConfigError::Validation(
                "notify.api_base must be an http(s) URL".into(),
            ));
        }
        Ok(())
    }
}

/// Outline and label appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    pub stroke_color: String,
    /// Outline thickness in pixels (1-32).
    pub stroke_width: u32,
    pub label_color: String,
    /// Font height in pixels (4.0-256.0).
    pub label_size: f32,
    /// `[dx, dy]` from the rectangle's top-left corner to the label's.
    pub label_offset: [i32; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_background: Option<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            stroke_color: "#ff0000".to_string(),
            stroke_width: 1,
            label_color: "#ff0000".to_string(),
            label_size: 14.0,
            label_offset: [2, 2],
            label_background: None,
        }
    }
}

impl StyleConfig {
    /// Parse colors and check ranges, producing the draw-time style.
    pub fn resolve(&self) -> Result<PlotStyle, ConfigError> {
        if !STROKE_WIDTH_RANGE.contains(&self.stroke_width) {
            return Err(ConfigError::Validation(
                "style.stroke_width must be 1-32".into(),
            ));
        }
        if !LABEL_SIZE_RANGE.contains(&self.label_size) {
            return Err(ConfigError::Validation(
                "style.label_size must be 4.0-256.0".into(),
            ));
        }
        let label_background = self
            .label_background
            .as_deref()
            .map(|c| color_field("style.label_background", c))
            .transpose()?;

        Ok(PlotStyle {
            stroke_color: color_field("style.stroke_color", &self.stroke_color)?,
            stroke_width: self.stroke_width,
            label_color: color_field("style.label_color", &self.label_color)?,
            label_size: self.label_size,
            label_offset: (self.label_offset[0], self.label_offset[1]),
            label_background,
        })
    }
}

fn color_field(key: &str, value: &str) -> Result<Rgba<u8>, ConfigError> {
    parse_hex_color(value).ok_or_else(|| {
        ConfigError::Validation(format!(
            "{key} must be a hex color like #f00, #ff0000 or #ff000080, got {value:?}"
        ))
    })
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional).
pub fn parse_hex_color(value: &str) -> Option<Rgba<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => {
            let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);
            Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, 255]))
        }
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

/// Re-encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodeConfig {
    /// JPEG quality (1 = worst, 100 = best). PNG output is lossless.
    pub jpeg_quality: u32,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: u32::from(Quality::default().value()),
        }
    }
}

impl EncodeConfig {
    pub fn quality(&self) -> Quality {
        Quality::new(self.jpeg_quality)
    }
}

/// URL source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Whole-request timeout for URL sources, in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// LINE Notify client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// Scheme and host of the API, without a trailing path.
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_base: "https://notify-api.line.me".to_string(),
            timeout_secs: 30,
        }
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(AnnotateConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AnnotateConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AnnotateConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Parse a config from TOML text, on top of stock defaults.
pub fn parse_config(content: &str) -> Result<AnnotateConfig, ConfigError> {
    let value: toml::Value = toml::from_str(content)?;
    resolve_config(Some(value))
}

/// Load config from the TOML file at `path`.
///
/// A missing file yields the stock defaults. A file that exists but contains
/// invalid TOML, unknown keys or out-of-range values is an error.
pub fn load_config(path: &Path) -> Result<AnnotateConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock config file with all keys and explanations.
pub fn stock_config_toml() -> &'static str {
    r##"# plotmark configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Outline and label appearance
# ---------------------------------------------------------------------------
[style]
# Outline color: #rgb, #rrggbb or #rrggbbaa.
stroke_color = "#ff0000"

# Outline thickness in pixels (1-32), drawn on the inside of the rectangle.
stroke_width = 1

# Label text color.
label_color = "#ff0000"

# Label font height in pixels (4.0-256.0).
label_size = 14.0

# Label position as [dx, dy] from the rectangle's top-left corner.
label_offset = [2, 2]

# Fill a box behind each label. Omit for no background.
# label_background = "#ffffff"

# ---------------------------------------------------------------------------
# Re-encoding
# ---------------------------------------------------------------------------
[encode]
# JPEG quality (1 = worst, 100 = best). PNG output is always lossless.
jpeg_quality = 75

# ---------------------------------------------------------------------------
# URL sources
# ---------------------------------------------------------------------------
[fetch]
# Whole-request timeout in seconds.
timeout_secs = 30

# User-Agent header sent with every request.
# user_agent = "plotmark/<version>"

# ---------------------------------------------------------------------------
# LINE Notify client
# ---------------------------------------------------------------------------
[notify]
api_base = "https://notify-api.line.me"
timeout_secs = 30
"##
}
