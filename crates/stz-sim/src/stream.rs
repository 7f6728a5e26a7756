//! Endless sample source for feeding a live detector
//!
//! Unlike the batch generator, anomalies are decided per sample: each point
//! is displaced with a fixed probability, by a random magnitude and sign.

use crate::generator::GeneratorError;
use crate::signal::{Baseline, TrendShape};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub trend: TrendShape,
    pub seasonal_amplitude: f64,
    pub period: usize,
    pub noise_std: f64,
    /// Chance that any single point is displaced
    pub anomaly_probability: f64,
    /// Displacement magnitude is drawn uniformly from `[min, max]`
    pub magnitude_range: (f64, f64),
    pub seed: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            trend: TrendShape::Linear { slope: 0.01 },
            seasonal_amplitude: 10.0,
            period: 100,
            noise_std: 2.0,
            anomaly_probability: 0.05,
            magnitude_range: (20.0, 40.0),
            seed: None,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if !(0.0..=1.0).contains(&self.anomaly_probability) {
            return Err(GeneratorError::InvalidFraction(self.anomaly_probability));
        }
        if self.period == 0 {
            return Err(GeneratorError::InvalidPeriod(self.period));
        }
        if !(self.noise_std >= 0.0 && self.noise_std.is_finite()) {
            return Err(GeneratorError::InvalidNoise(self.noise_std));
        }
        if let TrendShape::Logarithmic { scale, .. } = self.trend {
            if !(scale > 0.0) {
                return Err(GeneratorError::InvalidScale(scale));
            }
        }
        let (lo, hi) = self.magnitude_range;
        if !(lo.is_finite() && hi.is_finite() && lo >= 0.0 && lo <= hi) {
            return Err(GeneratorError::InvalidMagnitude(lo));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamPoint {
    pub index: u64,
    pub value: f64,
    pub is_anomaly: bool,
}

pub struct StreamSource {
    config: StreamConfig,
    baseline: Baseline,
    noise: Option<Normal<f64>>,
    rng: StdRng,
    next_index: u64,
}

impl StreamSource {
    pub fn new(config: StreamConfig) -> Result<Self, GeneratorError> {
        config.validate()?;
        let noise = if config.noise_std > 0.0 {
            Some(
                Normal::new(0.0, config.noise_std)
                    .map_err(|_| GeneratorError::InvalidNoise(config.noise_std))?,
            )
        } else {
            None
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let baseline = Baseline {
            trend: config.trend,
            seasonal_amplitude: config.seasonal_amplitude,
            period: config.period,
        };

        Ok(Self {
            config,
            baseline,
            noise,
            rng,
            next_index: 0,
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

impl Iterator for StreamSource {
    type Item = StreamPoint;

    fn next(&mut self) -> Option<StreamPoint> {
        let index = self.next_index;
        self.next_index += 1;

        let mut value = self.baseline.value_at(index as f64);
        if let Some(noise) = &self.noise {
            value += noise.sample(&mut self.rng);
        }

        let is_anomaly = self.rng.random_bool(self.config.anomaly_probability);
        if is_anomaly {
            let (lo, hi) = self.config.magnitude_range;
            let magnitude = self.rng.random_range(lo..=hi);
            let sign = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
            value += sign * magnitude;
            trace!(index, value, "Injected stream anomaly.");
        }

        Some(StreamPoint {
            index,
            value,
            is_anomaly,
        })
    }
}
