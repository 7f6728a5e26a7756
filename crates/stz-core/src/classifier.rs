use serde::{Deserialize, Serialize};

/// Outcome of scoring the newest residual
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Signed z-score of the last residual
    pub score: f64,
    pub is_anomaly: bool,
}

/// Z-score test of the most recent residual against the whole window
#[derive(Debug, Clone, Copy)]
pub struct ResidualClassifier {
    z_threshold: f64,
    min_std: f64,
}

impl ResidualClassifier {
    pub fn new(z_threshold: f64, min_std: f64) -> Self {
        Self {
            z_threshold,
            min_std: min_std.max(0.0),
        }
    }

    pub fn z_threshold(&self) -> f64 {
        self.z_threshold
    }

    /// Score the last residual.
    ///
    /// `scale` is the magnitude of the decomposed values; `min_std` is taken
    /// relative to `max(1, |scale|)` so rounding noise on large readings is
    /// not mistaken for variation. Returns `None` for an empty or degenerate
    /// (near-constant) residual sequence; no score is meaningful there.
    pub fn classify(&self, residual: &[f64], scale: f64) -> Option<Classification> {
        let last = *residual.last()?;
        let (mean, std) = mean_std(residual);

        let floor = self.min_std * scale.abs().max(1.0);
        if !(std > floor) || !std.is_finite() {
            return None;
        }

        let score = (last - mean) / std;
        Some(Classification {
            score,
            is_anomaly: score.abs() > self.z_threshold,
        })
    }
}

/// Population mean and standard deviation
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
