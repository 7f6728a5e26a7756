//! LOESS smoothing over equally spaced positions
//!
//! Tricube distance weights, optional robustness weights, local constant or
//! local linear fits. Positions are `0..n`; fits may be requested slightly
//! outside that range for extrapolation.

/// Degree of the local polynomial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degree {
    Constant,
    Linear,
}

#[derive(Debug, Clone, Copy)]
pub struct Loess {
    span: usize,
    degree: Degree,
    jump: usize,
}

impl Loess {
    pub fn new(span: usize, degree: Degree) -> Self {
        Self {
            span: span.max(1),
            degree,
            jump: 1,
        }
    }

    /// Fit every `jump` positions and interpolate linearly in between
    pub fn with_jump(mut self, jump: usize) -> Self {
        self.jump = jump.max(1);
        self
    }

    pub fn span(&self) -> usize {
        self.span
    }

    /// Local fit at position `x` from the `span` nearest observations.
    ///
    /// Returns `None` when every observation in the neighbourhood has zero
    /// weight.
    pub fn fit_at(&self, y: &[f64], robustness: Option<&[f64]>, x: f64) -> Option<f64> {
        let n = y.len();
        if n == 0 {
            return None;
        }

        let q = self.span.min(n);
        let ideal_left = (x - (q as f64 - 1.0) / 2.0).round();
        let left = if ideal_left <= 0.0 {
            0
        } else {
            (ideal_left as usize).min(n - q)
        };
        let right = left + q - 1;

        let mut h = (x - left as f64).max(right as f64 - x);
        if self.span > n {
            h += ((self.span - n) / 2) as f64;
        }
        let h_inner = 0.001 * h;
        let h_outer = 0.999 * h;

        let mut weights = Vec::with_capacity(q);
        let mut total = 0.0;
        for j in left..=right {
            let r = (j as f64 - x).abs();
            let mut w = if r <= h_inner {
                1.0
            } else if r <= h_outer {
                let u = r / h;
                let t = 1.0 - u * u * u;
                t * t * t
            } else {
                0.0
            };
            if let Some(rw) = robustness {
                w *= rw[j];
            }
            total += w;
            weights.push(w);
        }

        if total <= 0.0 {
            return None;
        }
        for w in weights.iter_mut() {
            *w /= total;
        }

        if self.degree == Degree::Linear && h > 0.0 {
            let center: f64 = weights
                .iter()
                .enumerate()
                .map(|(k, w)| w * (left + k) as f64)
                .sum();
            let spread: f64 = weights
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let d = (left + k) as f64 - center;
                    w * d * d
                })
                .sum();

            // Skip the slope term when the neighbourhood is effectively a point
            if spread.sqrt() > 0.001 * (n - 1) as f64 {
                let slope = (x - center) / spread;
                for (k, w) in weights.iter_mut().enumerate() {
                    *w *= slope * ((left + k) as f64 - center) + 1.0;
                }
            }
        }

        Some(
            weights
                .iter()
                .zip(&y[left..=right])
                .map(|(w, v)| w * v)
                .sum(),
        )
    }

    /// Smooth a whole series, one fitted value per position
    pub fn smooth(&self, y: &[f64], robustness: Option<&[f64]>) -> Vec<f64> {
        let n = y.len();
        if n == 0 {
            return Vec::new();
        }

        let last = n - 1;
        let jump = self.jump.min(last.max(1));
        let mut out = vec![0.0; n];
        let mut prev: Option<usize> = None;

        let positions = (0..n)
            .step_by(jump)
            .chain((last % jump != 0).then_some(last));

        for pos in positions {
            out[pos] = self.fit_at(y, robustness, pos as f64).unwrap_or(y[pos]);

            if let Some(p) = prev {
                let gap = pos - p;
                if gap > 1 {
                    let step = (out[pos] - out[p]) / gap as f64;
                    for k in 1..gap {
                        out[p + k] = out[p] + step * k as f64;
                    }
                }
            }
            prev = Some(pos);
        }

        out
    }
}

/// Bisquare robustness weights from residuals (scale = 6 x median |r|)
pub fn bisquare_weights(residual: &[f64]) -> Vec<f64> {
    let n = residual.len();
    if n == 0 {
        return Vec::new();
    }

    let mut abs: Vec<f64> = residual.iter().map(|r| r.abs()).collect();
    abs.sort_by(|a, b| a.total_cmp(b));
    let median = if n % 2 == 1 {
        abs[n / 2]
    } else {
        (abs[n / 2 - 1] + abs[n / 2]) / 2.0
    };

    let scale = 6.0 * median;
    if !(scale > 0.0 && scale.is_finite()) {
        return vec![1.0; n];
    }

    residual
        .iter()
        .map(|r| {
            let u = r.abs() / scale;
            if u <= 0.001 {
                1.0
            } else if u <= 0.999 {
                let t = 1.0 - u * u;
                t * t
            } else {
                0.0
            }
        })
        .collect()
}

/// Trailing moving average; output has `len(values) - width + 1` entries
pub fn moving_average(values: &[f64], width: usize) -> Vec<f64> {
    let width = width.max(1);
    if values.len() < width {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(values.len() - width + 1);
    let mut sum: f64 = values[..width].iter().sum();
    out.push(sum / width as f64);
    for i in width..values.len() {
        sum += values[i] - values[i - width];
        out.push(sum / width as f64);
    }
    out
}
