//! Deterministic signal components
//!
//! The noiseless part of every generated series: a slow trend plus a single
//! sinusoidal season.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrendShape {
    /// `amplitude * ln(1 + amplitude / scale * t)`
    Logarithmic { amplitude: f64, scale: f64 },
    /// `slope * t`
    Linear { slope: f64 },
    Flat,
}

impl TrendShape {
    pub fn value_at(&self, t: f64) -> f64 {
        match *self {
            Self::Logarithmic { amplitude, scale } => amplitude * (amplitude / scale * t).ln_1p(),
            Self::Linear { slope } => slope * t,
            Self::Flat => 0.0,
        }
    }
}

/// Trend plus sinusoidal season, without noise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub trend: TrendShape,
    pub seasonal_amplitude: f64,
    pub period: usize,
}

impl Baseline {
    pub fn seasonal_at(&self, t: f64) -> f64 {
        if self.period == 0 {
            return 0.0;
        }
        self.seasonal_amplitude * (2.0 * PI * t / self.period as f64).sin()
    }

    pub fn value_at(&self, t: f64) -> f64 {
        self.trend.value_at(t) + self.seasonal_at(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_shapes() {
        let log = TrendShape::Logarithmic {
            amplitude: 10.0,
            scale: 200.0,
        };
        assert_eq!(log.value_at(0.0), 0.0);
        assert!((log.value_at(20.0) - 10.0 * 2f64.ln()).abs() < 1e-12);

        assert_eq!(TrendShape::Linear { slope: 0.5 }.value_at(8.0), 4.0);
        assert_eq!(TrendShape::Flat.value_at(1e6), 0.0);
    }

    #[test]
    fn test_seasonal_repeats_every_period() {
        let baseline = Baseline {
            trend: TrendShape::Flat,
            seasonal_amplitude: 3.0,
            period: 25,
        };
        for t in 0..25 {
            let t = t as f64;
            assert!((baseline.value_at(t) - baseline.value_at(t + 25.0)).abs() < 1e-9);
        }
        assert!((baseline.seasonal_at(6.25) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_trend_serde_tag() {
        let json = serde_json::to_string(&TrendShape::Linear { slope: 0.01 }).unwrap();
        assert_eq!(json, r#"{"kind":"linear","slope":0.01}"#);

        let back: TrendShape = serde_json::from_str(r#"{"kind":"flat"}"#).unwrap();
        assert_eq!(back, TrendShape::Flat);
    }
}
