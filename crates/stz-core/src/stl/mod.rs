//! Seasonal-Trend decomposition using LOESS (STL)
//!
//! Splits a window of equally spaced values into trend, seasonal and residual
//! components. The seasonal and trend estimates are refined jointly over a
//! bounded number of passes:
//!
//! 1. Cycle-subseries smoothing of the detrended series (one subseries per
//!    phase `position mod period`), extended one cycle at each end.
//! 2. Low-pass filtering of that cycle series (MA(period), MA(period), MA(3),
//!    LOESS) and subtraction, which keeps trend leakage out of the seasonal.
//! 3. LOESS smoothing of the deseasonalized series for the trend.
//! 4. Residual = value - trend - seasonal.
//!
//! Cost is O(n x passes x span) per call; the online detector pays it on every
//! evaluated sample.

pub mod loess;

use crate::config::StlConfig;
use crate::error::{ConfigError, DecompositionError};
use loess::{Degree, Loess, bisquare_weights, moving_average};
use serde::{Deserialize, Serialize};

/// Additive decomposition of one window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decomposition {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    /// Refinement passes actually run
    pub passes: usize,
    /// Whether the pass-to-pass change fell below the tolerance
    pub converged: bool,
}

impl Decomposition {
    pub fn len(&self) -> usize {
        self.residual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residual.is_empty()
    }

    pub fn last_residual(&self) -> Option<f64> {
        self.residual.last().copied()
    }

    /// trend + seasonal + residual at position `i`
    pub fn reconstruct(&self, i: usize) -> Option<f64> {
        Some(*self.trend.get(i)? + *self.seasonal.get(i)? + *self.residual.get(i)?)
    }
}

#[derive(Debug, Clone)]
pub struct StlDecomposer {
    config: StlConfig,
}

impl StlDecomposer {
    pub fn new(config: StlConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StlConfig {
        &self.config
    }

    /// Span of the trend smoother for a series of length `n`
    pub fn trend_span(&self, n: usize) -> usize {
        match self.config.lo_frac {
            Some(frac) => odd_at_least((frac * n as f64).ceil() as usize),
            None => {
                let period = self.config.period as f64;
                let ns = self.config.seasonal_span as f64;
                odd_at_least((1.5 * period / (1.0 - 1.5 / ns)).ceil() as usize)
            }
        }
    }

    /// Span of the low-pass smoother
    pub fn lowpass_span(&self) -> usize {
        odd_at_least(self.config.period)
    }

    fn jump(&self, n: usize) -> usize {
        ((self.config.lo_delta * n as f64).ceil() as usize).max(1)
    }

    pub fn decompose(&self, values: &[f64]) -> Result<Decomposition, DecompositionError> {
        let n = values.len();
        let period = self.config.period;

        if n < period * 2 {
            return Err(DecompositionError::WindowTooShort { len: n, period });
        }
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(DecompositionError::NonFiniteInput { position });
        }

        let seasonal_smoother = Loess::new(self.config.seasonal_span, Degree::Constant);
        let lowpass_smoother = Loess::new(self.lowpass_span(), Degree::Linear).with_jump(self.jump(n));
        let trend_smoother = Loess::new(self.trend_span(n), Degree::Linear).with_jump(self.jump(n));

        let (lo, hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = hi - lo;

        let mut trend = vec![0.0; n];
        let mut seasonal = vec![0.0; n];
        let mut robustness: Option<Vec<f64>> = None;
        let mut passes = 0;
        let mut converged = false;

        for pass in 1..=self.config.max_iterations {
            let detrended: Vec<f64> = values.iter().zip(&trend).map(|(v, t)| v - t).collect();
            let cycle = cycle_subseries(&detrended, period, robustness.as_deref(), &seasonal_smoother);
            let lowpass = low_pass(&cycle, period, &lowpass_smoother);

            let next_seasonal: Vec<f64> = (0..n).map(|i| cycle[period + i] - lowpass[i]).collect();
            let deseasonalized: Vec<f64> = values
                .iter()
                .zip(&next_seasonal)
                .map(|(v, s)| v - s)
                .collect();
            let next_trend = trend_smoother.smooth(&deseasonalized, robustness.as_deref());

            if next_seasonal.iter().chain(&next_trend).any(|v| !v.is_finite()) {
                return Err(DecompositionError::Diverged { pass });
            }

            let change = next_seasonal
                .iter()
                .zip(&seasonal)
                .chain(next_trend.iter().zip(&trend))
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);

            seasonal = next_seasonal;
            trend = next_trend;
            passes = pass;

            let relative = if range > 0.0 { change / range } else { change };
            if pass > 1 && relative <= self.config.tolerance {
                converged = true;
                break;
            }

            if self.config.robust && pass < self.config.max_iterations {
                let residual = residual_of(values, &trend, &seasonal);
                robustness = Some(bisquare_weights(&residual));
            }
        }

        let residual = residual_of(values, &trend, &seasonal);

        Ok(Decomposition {
            trend,
            seasonal,
            residual,
            passes,
            converged,
        })
    }
}

fn residual_of(values: &[f64], trend: &[f64], seasonal: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(trend)
        .zip(seasonal)
        .map(|((v, t), s)| v - t - s)
        .collect()
}

fn odd_at_least(v: usize) -> usize {
    let v = v.max(3);
    if v % 2 == 0 { v + 1 } else { v }
}

/// Smooth each phase subseries and extend it by one cycle on both sides.
///
/// Output has `n + 2 * period` entries; entry `period + i` lines up with
/// input position `i`.
fn cycle_subseries(
    detrended: &[f64],
    period: usize,
    robustness: Option<&[f64]>,
    smoother: &Loess,
) -> Vec<f64> {
    let n = detrended.len();
    let mut cycle = vec![0.0; n + 2 * period];
    let mut sub = Vec::with_capacity(n / period + 1);
    let mut sub_weights = Vec::with_capacity(n / period + 1);

    for phase in 0..period {
        sub.clear();
        sub.extend(detrended.iter().skip(phase).step_by(period).copied());
        let weights = match robustness {
            Some(rw) => {
                sub_weights.clear();
                sub_weights.extend(rw.iter().skip(phase).step_by(period).copied());
                Some(sub_weights.as_slice())
            }
            None => None,
        };

        let m = sub.len();
        for k in 0..m + 2 {
            let x = k as f64 - 1.0;
            let fallback = sub[k.saturating_sub(1).min(m - 1)];
            cycle[k * period + phase] = smoother.fit_at(&sub, weights, x).unwrap_or(fallback);
        }
    }

    cycle
}

/// MA(period) -> MA(period) -> MA(3) -> LOESS; returns `n` values
fn low_pass(cycle: &[f64], period: usize, smoother: &Loess) -> Vec<f64> {
    let first = moving_average(cycle, period);
    let second = moving_average(&first, period);
    let third = moving_average(&second, 3);
    smoother.smooth(&third, None)
}
