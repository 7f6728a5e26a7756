//! Synthetic seasonal series with injected anomalies
//!
//! Produces `trend + seasonal + noise` and displaces a chosen fraction of
//! samples by a fixed offset. The displaced positions are returned alongside
//! the values as ground truth for scoring a detector.

use crate::ground_truth::GroundTruth;
use crate::signal::{Baseline, TrendShape};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorError {
    /// Anomaly fraction outside `[0, 1]`
    InvalidFraction(f64),
    InvalidPeriod(usize),
    /// Noise standard deviation negative or not finite
    InvalidNoise(f64),
    /// Logarithmic trend time-scale must be positive
    InvalidScale(f64),
    InvalidMagnitude(f64),
}

impl std::fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFraction(p) => {
                write!(f, "Anomaly fraction must be in [0, 1], got {}", p)
            }
            Self::InvalidPeriod(p) => write!(f, "Seasonal period must be >= 1, got {}", p),
            Self::InvalidNoise(s) => {
                write!(f, "Noise std must be finite and >= 0, got {}", s)
            }
            Self::InvalidScale(s) => write!(f, "Trend scale must be > 0, got {}", s),
            Self::InvalidMagnitude(m) => {
                write!(f, "Anomaly magnitude must be finite, got {}", m)
            }
        }
    }
}

impl std::error::Error for GeneratorError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of samples
    pub num: usize,
    /// Fraction of samples to displace
    pub anomaly_fraction: f64,
    pub trend: TrendShape,
    pub seasonal_amplitude: f64,
    pub period: usize,
    pub noise_std: f64,
    /// Absolute offset applied to each injected sample
    pub anomaly_magnitude: f64,
    /// Leading samples never displaced; defaults to two periods, never less
    /// than one
    pub warmup: Option<usize>,
    /// Fixed seed for reproducible output; OS entropy when unset
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num: 1000,
            anomaly_fraction: 0.02,
            trend: TrendShape::Logarithmic {
                amplitude: 10.0,
                scale: 200.0,
            },
            seasonal_amplitude: 10.0,
            period: 100,
            noise_std: 1.0,
            anomaly_magnitude: 15.0,
            warmup: None,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if !(0.0..=1.0).contains(&self.anomaly_fraction) {
            return Err(GeneratorError::InvalidFraction(self.anomaly_fraction));
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
        if !self.anomaly_magnitude.is_finite() {
            return Err(GeneratorError::InvalidMagnitude(self.anomaly_magnitude));
        }
        Ok(())
    }

    /// First index eligible for injection
    pub fn effective_warmup(&self) -> usize {
        self.warmup
            .unwrap_or(2 * self.period)
            .max(self.period)
    }

    pub fn baseline(&self) -> Baseline {
        Baseline {
            trend: self.trend,
            seasonal_amplitude: self.seasonal_amplitude,
            period: self.period,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_fraction(mut self, anomaly_fraction: f64) -> Self {
        self.anomaly_fraction = anomaly_fraction;
        self
    }
}

/// A generated series and the positions that were displaced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSeries {
    pub values: Vec<f64>,
    pub ground_truth: GroundTruth,
}

impl GeneratedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct SeriesGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl SeriesGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Draw a fresh series. Successive calls on one generator continue the
    /// same random stream.
    pub fn generate(&mut self) -> GeneratedSeries {
        let mut values = self.clean_series();
        let indices = self.pick_indices();

        // Signs are read from the undisplaced series
        let displaced: Vec<(usize, f64)> = indices
            .iter()
            .map(|&i| {
                let rising = i == 0 || values[i] - values[i - 1] >= 0.0;
                let sign = if rising { 1.0 } else { -1.0 };
                (i, sign * self.config.anomaly_magnitude)
            })
            .collect();
        for (i, offset) in displaced {
            values[i] += offset;
        }

        debug!(
            num = values.len(),
            injected = indices.len(),
            "Generated series."
        );

        GeneratedSeries {
            values,
            ground_truth: indices.into_iter().collect(),
        }
    }

    fn clean_series(&mut self) -> Vec<f64> {
        let baseline = self.config.baseline();
        let noise = (self.config.noise_std > 0.0)
            .then(|| Normal::new(0.0, self.config.noise_std).ok())
            .flatten();

        (0..self.config.num)
            .map(|t| {
                let base = baseline.value_at(t as f64);
                match &noise {
                    Some(dist) => base + dist.sample(&mut self.rng),
                    None => base,
                }
            })
            .collect()
    }

    fn pick_indices(&mut self) -> Vec<usize> {
        let num = self.config.num;
        let warmup = self.config.effective_warmup();
        let requested = (self.config.anomaly_fraction * num as f64).round() as usize;

        let mut candidates: Vec<usize> = (warmup.min(num)..num).collect();
        let count = if requested > candidates.len() {
            warn!(
                requested,
                available = candidates.len(),
                warmup,
                "Not enough samples after warmup, injecting fewer anomalies."
            );
            candidates.len()
        } else {
            requested
        };

        candidates.shuffle(&mut self.rng);
        candidates.truncate(count);
        candidates
    }
}

/// One-shot convenience over `SeriesGenerator`
pub fn generate(config: GeneratorConfig) -> Result<GeneratedSeries, GeneratorError> {
    Ok(SeriesGenerator::new(config)?.generate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> GeneratorConfig {
        GeneratorConfig::default().with_seed(7)
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let a = generate(seeded()).unwrap();
        let b = generate(seeded()).unwrap();
        assert_eq!(a, b);

        let c = generate(GeneratorConfig::default().with_seed(8)).unwrap();
        assert_ne!(a.values, c.values);
    }

    #[test]
    fn test_injection_count_and_range() {
        let series = generate(seeded()).unwrap();
        assert_eq!(series.len(), 1000);
        assert_eq!(series.ground_truth.len(), 20);
        assert!(series.ground_truth.iter().all(|i| (200..1000).contains(&i)));
    }

    #[test]
    fn test_count_is_rounded() {
        let config = GeneratorConfig {
            num: 450,
            anomaly_fraction: 0.015,
            ..seeded()
        };
        // 6.75 rounds to 7
        assert_eq!(generate(config).unwrap().ground_truth.len(), 7);
    }

    #[test]
    fn test_sign_follows_local_direction() {
        let config = GeneratorConfig {
            noise_std: 0.0,
            ..seeded()
        };
        let clean = generate(config.clone().with_fraction(0.0)).unwrap();
        let series = generate(config).unwrap();
        assert!(clean.ground_truth.is_empty());

        for i in series.ground_truth.iter() {
            let offset = series.values[i] - clean.values[i];
            let rising = clean.values[i] - clean.values[i - 1] >= 0.0;
            let expected = if rising { 15.0 } else { -15.0 };
            assert!((offset - expected).abs() < 1e-9);
        }

        // Everything outside the ground truth is untouched
        for i in (0..series.len()).filter(|i| !series.ground_truth.contains(*i)) {
            assert_eq!(series.values[i], clean.values[i]);
        }
    }

    #[test]
    fn test_clamps_when_range_is_short() {
        let config = GeneratorConfig {
            num: 210,
            anomaly_fraction: 0.5,
            ..seeded()
        };
        let series = generate(config).unwrap();
        assert_eq!(series.ground_truth.to_vec(), (200..210).collect::<Vec<_>>());
    }

    #[test]
    fn test_warmup_never_below_one_period() {
        let config = GeneratorConfig {
            warmup: Some(10),
            ..GeneratorConfig::default()
        };
        assert_eq!(config.effective_warmup(), 100);
        assert_eq!(GeneratorConfig::default().effective_warmup(), 200);
    }

    #[test]
    fn test_validation() {
        let bad_fraction = GeneratorConfig {
            anomaly_fraction: 1.5,
            ..GeneratorConfig::default()
        };
        assert_eq!(
            SeriesGenerator::new(bad_fraction).err(),
            Some(GeneratorError::InvalidFraction(1.5))
        );

        let bad_noise = GeneratorConfig {
            noise_std: -1.0,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            generate(bad_noise),
            Err(GeneratorError::InvalidNoise(_))
        ));

        let bad_scale = GeneratorConfig {
            trend: TrendShape::Logarithmic {
                amplitude: 10.0,
                scale: 0.0,
            },
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            generate(bad_scale),
            Err(GeneratorError::InvalidScale(_))
        ));

        let bad_period = GeneratorConfig {
            period: 0,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            generate(bad_period),
            Err(GeneratorError::InvalidPeriod(0))
        ));
    }
}
