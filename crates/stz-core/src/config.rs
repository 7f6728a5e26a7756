//! Detector and decomposition configuration
//!
//! All structs deserialize from partial JSON (`#[serde(default)]`), so a config
//! file only needs the fields it overrides. `validate` is the single gate that
//! turns bad parameters into a [`ConfigError`] before any data is processed.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of the STL decomposition engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StlConfig {
    /// Seasonal period in samples
    pub period: usize,
    /// LOESS span (odd) used to smooth each cycle-subseries
    pub seasonal_span: usize,
    /// Trend bandwidth as a fraction of the window; `None` uses Cleveland's rule
    pub lo_frac: Option<f64>,
    /// Interpolation distance as a fraction of the series length
    pub lo_delta: f64,
    /// Upper bound on refinement passes
    pub max_iterations: usize,
    /// Early-stop threshold on the relative change between passes
    pub tolerance: f64,
    /// Recompute bisquare robustness weights between passes
    pub robust: bool,
}

impl Default for StlConfig {
    fn default() -> Self {
        Self {
            period: 100,
            seasonal_span: 7,
            lo_frac: None,
            lo_delta: 0.01,
            max_iterations: 3,
            tolerance: 1e-3,
            robust: false,
        }
    }
}

impl StlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period < 2 {
            return Err(ConfigError::InvalidPeriod(self.period));
        }
        if self.seasonal_span < 3 || self.seasonal_span % 2 == 0 {
            return Err(ConfigError::InvalidSeasonalSpan(self.seasonal_span));
        }
        if let Some(frac) = self.lo_frac {
            if !(frac > 0.0 && frac <= 1.0) {
                return Err(ConfigError::InvalidFraction(frac));
            }
        }
        if !(self.lo_delta >= 0.0 && self.lo_delta < 1.0) {
            return Err(ConfigError::InvalidDelta(self.lo_delta));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidIterations);
        }
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// Configuration of the online detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of recent samples decomposed per evaluation
    pub window_size: usize,
    /// |z| above this value is anomalous
    pub z_threshold: f64,
    /// Evaluate a full window only every N-th push (1 = every push)
    pub recompute_every: usize,
    /// Residual std at or below this value is treated as degenerate
    pub min_residual_std: f64,
    pub decomposition: StlConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        presets::live()
    }
}

impl DetectorConfig {
    pub fn period(&self) -> usize {
        self.decomposition.period
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.decomposition.validate()?;

        let period = self.decomposition.period;
        if self.window_size < period * 2 {
            return Err(ConfigError::WindowTooSmall {
                window_size: self.window_size,
                period,
            });
        }
        if !(self.z_threshold > 0.0 && self.z_threshold.is_finite()) {
            return Err(ConfigError::InvalidThreshold(self.z_threshold));
        }
        if self.recompute_every == 0 {
            return Err(ConfigError::InvalidDecimation);
        }
        if !(self.min_residual_std >= 0.0 && self.min_residual_std.is_finite()) {
            return Err(ConfigError::InvalidTolerance(self.min_residual_std));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DetectorConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json_str(&raw)
    }

    pub fn with_window(mut self, window_size: usize, period: usize) -> Self {
        self.window_size = window_size;
        self.decomposition.period = period;
        self
    }

    pub fn with_threshold(mut self, z_threshold: f64) -> Self {
        self.z_threshold = z_threshold;
        self
    }
}

/// Named configurations
///
/// Each preset corresponds to one of the detector flavours the system grew
/// over time; they differ only in defaults.
pub mod presets {
    use super::*;

    /// Per-point streaming detection (200-sample window, 3-sigma)
    pub fn live() -> DetectorConfig {
        DetectorConfig {
            window_size: 200,
            z_threshold: 3.0,
            recompute_every: 1,
            min_residual_std: 1e-8,
            decomposition: StlConfig::default(),
        }
    }

    /// Whole-stream scanning with a long window
    pub fn batch() -> DetectorConfig {
        DetectorConfig {
            window_size: 1000,
            decomposition: StlConfig {
                period: 200,
                ..StlConfig::default()
            },
            ..live()
        }
    }

    /// 2-sigma threshold, more detections and more false positives
    pub fn sensitive() -> DetectorConfig {
        DetectorConfig {
            z_threshold: 2.0,
            ..live()
        }
    }

    /// Robust STL: outliers inside the window are down-weighted
    pub fn robust() -> DetectorConfig {
        let mut config = live();
        config.decomposition.robust = true;
        config.decomposition.max_iterations = 4;
        config
    }

    pub fn names() -> &'static [&'static str] {
        &["live", "batch", "sensitive", "robust"]
    }

    pub fn by_name(name: &str) -> Option<DetectorConfig> {
        match name {
            "live" => Some(live()),
            "batch" => Some(batch()),
            "sensitive" => Some(sensitive()),
            "robust" => Some(robust()),
            _ => None,
        }
    }
}
