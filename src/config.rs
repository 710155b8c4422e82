//! Explorer configuration.
//!
//! Every field has a default matching the stock views, so a config file
//! only needs to name what it changes:
//!
//! ```json
//! { "top_donors": 15, "play_interval_ms": 500 }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Drawing area of the two-column network views, inside the margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 540.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Donors kept by the top-N cut.
    pub top_donors: usize,
    /// Recipients kept by the top-N cut.
    pub top_recipients: usize,
    /// Purposes kept by the purpose refinement.
    pub top_purposes: usize,
    /// Percentiles clamping the network edge scales.
    pub low_quantile: f64,
    pub high_quantile: f64,
    /// Stroke width ranges, in pixels.
    pub network_width: (f64, f64),
    pub purpose_width: (f64, f64),
    pub year_width: (f64, f64),
    /// Sub-range of the blues ramp used for edge colour.
    pub color_range: (f64, f64),
    /// Opacity range of the strip-chart cells.
    pub strip_opacity: (f64, f64),
    pub base_opacity: f64,
    pub purpose_base_opacity: f64,
    pub highlight_opacity: f64,
    /// Smallest pie share that still gets a percentage label.
    pub label_threshold: f64,
    pub play_interval_ms: u64,
    pub canvas: Canvas,
    pub band_padding: f64,
    pub year_band_padding: f64,
    pub node_radius: f64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            top_donors: 20,
            top_recipients: 10,
            top_purposes: 5,
            low_quantile: 0.1,
            high_quantile: 0.9,
            network_width: (1.5, 5.0),
            purpose_width: (1.5, 6.0),
            year_width: (0.0, 15.0),
            color_range: (0.35, 0.95),
            strip_opacity: (0.1, 1.0),
            base_opacity: 0.75,
            purpose_base_opacity: 0.70,
            highlight_opacity: 0.98,
            label_threshold: 0.05,
            play_interval_ms: 800,
            canvas: Canvas::default(),
            band_padding: 0.2,
            year_band_padding: 0.4,
            node_radius: 7.0,
        }
    }
}

fn check_range(name: &str, (lo, hi): (f64, f64), bounds: (f64, f64)) -> Result<(), ConfigError> {
    if lo.is_finite() && hi.is_finite() && bounds.0 <= lo && lo <= hi && hi <= bounds.1 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must satisfy {} <= lo <= hi <= {}, got ({}, {})",
            name, bounds.0, bounds.1, lo, hi
        )))
    }
}

fn check_unit(name: &str, v: f64) -> Result<(), ConfigError> {
    check_range(name, (v, v), (0.0, 1.0))
}

impl ExplorerConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_donors == 0 || self.top_recipients == 0 || self.top_purposes == 0 {
            return Err(ConfigError::Invalid("top-N sizes must be positive".into()));
        }
        check_range(
            "quantiles",
            (self.low_quantile, self.high_quantile),
            (0.0, 1.0),
        )?;
        if self.low_quantile >= self.high_quantile {
            return Err(ConfigError::Invalid(format!(
                "low_quantile {} must be below high_quantile {}",
                self.low_quantile, self.high_quantile
            )));
        }
        check_range("network_width", self.network_width, (0.0, f64::MAX))?;
        check_range("purpose_width", self.purpose_width, (0.0, f64::MAX))?;
        check_range("year_width", self.year_width, (0.0, f64::MAX))?;
        check_range("color_range", self.color_range, (0.0, 1.0))?;
        check_range("strip_opacity", self.strip_opacity, (0.0, 1.0))?;
        check_unit("base_opacity", self.base_opacity)?;
        check_unit("purpose_base_opacity", self.purpose_base_opacity)?;
        check_unit("highlight_opacity", self.highlight_opacity)?;
        check_unit("label_threshold", self.label_threshold)?;
        check_unit("band_padding", self.band_padding)?;
        check_unit("year_band_padding", self.year_band_padding)?;
        if self.play_interval_ms == 0 {
            return Err(ConfigError::Invalid("play_interval_ms must be positive".into()));
        }
        let Canvas { width, height } = self.canvas;
        if width.is_nan() || height.is_nan() || width <= 0.0 || height <= 0.0 {
            return Err(ConfigError::Invalid("canvas must have a positive size".into()));
        }
        if self.node_radius.is_nan() || self.node_radius < 0.0 {
            return Err(ConfigError::Invalid("node_radius must not be negative".into()));
        }
        Ok(())
    }

    pub fn play_interval(&self) -> Duration {
        Duration::from_millis(self.play_interval_ms)
    }
}
