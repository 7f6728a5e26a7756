//! Whole-series detection with a rolling residual z-score
//!
//! Decomposes the full series once, then scores each residual against the
//! mean and sample standard deviation of a centered rolling window around it.
//! Useful for retrospective analysis where every point is available up front.

use crate::config::StlConfig;
use crate::error::{ConfigError, Error};
use crate::stl::{Decomposition, StlDecomposer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Width of the centered rolling window over the residual
    pub rolling_window: usize,
    /// |z| above this value is anomalous
    pub sigma: f64,
    pub decomposition: StlConfig,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            rolling_window: 10,
            sigma: 2.0,
            decomposition: StlConfig {
                period: 10,
                ..StlConfig::default()
            },
        }
    }
}

impl OfflineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.decomposition.validate()?;
        if self.rolling_window < 2 {
            return Err(ConfigError::InvalidRollingWindow(self.rolling_window));
        }
        if !(self.sigma > 0.0 && self.sigma.is_finite()) {
            return Err(ConfigError::InvalidThreshold(self.sigma));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineReport {
    /// One flag per input position
    pub anomalies: Vec<bool>,
    /// Rolling z-score; `None` where the rolling std is undefined or zero
    pub scores: Vec<Option<f64>>,
    pub decomposition: Decomposition,
}

impl OfflineReport {
    pub fn indices(&self) -> Vec<usize> {
        self.anomalies
            .iter()
            .enumerate()
            .filter_map(|(i, &flag)| flag.then_some(i))
            .collect()
    }
}

pub fn detect_offline(values: &[f64], config: &OfflineConfig) -> Result<OfflineReport, Error> {
    config.validate()?;

    let decomposition = StlDecomposer::new(config.decomposition.clone())?.decompose(values)?;
    let scores = rolling_zscores(&decomposition.residual, config.rolling_window);
    let anomalies = scores
        .iter()
        .map(|z| z.is_some_and(|z| z.abs() > config.sigma))
        .collect();

    Ok(OfflineReport {
        anomalies,
        scores,
        decomposition,
    })
}

/// Centered rolling z-score with `min_periods = 1`.
///
/// The window around position `i` spans `[i - w/2, i + (w-1)/2]`, clipped to
/// the series. Standard deviation uses `n - 1` in the denominator.
pub fn rolling_zscores(residual: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = residual.len();
    let before = window / 2;
    let after = window.saturating_sub(1) / 2;

    (0..n)
        .map(|i| {
            let start = i.saturating_sub(before);
            let end = (i + after).min(n.saturating_sub(1));
            let slice = &residual[start..=end];
            if slice.len() < 2 {
                return None;
            }

            let count = slice.len() as f64;
            let mean = slice.iter().sum::<f64>() / count;
            let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1.0);
            let std = var.sqrt();
            if !(std > f64::EPSILON * mean.abs().max(1.0)) {
                return None;
            }

            Some((residual[i] - mean) / std)
        })
        .collect()
}
