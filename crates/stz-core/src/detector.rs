//! Online STL + Z-Score detector
//!
//! Per incoming sample:
//! 1. Push into the sliding window.
//! 2. Window not full -> no decision.
//! 3. Window full -> decompose, score the newest residual.
//! 4. Anomalous -> emit an event and remove the sample from the window
//!    (suppression), so it cannot bias later decompositions.
//!
//! The window is decomposed on sample-index time: a slot freed by
//! suppression is refilled by interpolating its neighbours, so seasonal
//! phase stays tied to `Sample::index` rather than to window position.
//!
//! Decomposition failures and degenerate residuals are absorbed: the sample
//! gets no decision and the stream continues. Non-finite samples are not
//! removed, so a NaN stays in the window and every evaluation answers
//! `Skipped(Decomposition)` until it is evicted `window_size` pushes later.
//!
//! Every evaluation recomputes the decomposition over the whole window, so
//! the per-sample cost is O(window_size x passes). `recompute_every` trades
//! detection coverage for throughput: samples that land between evaluations
//! are never scored.

use crate::classifier::ResidualClassifier;
use crate::config::DetectorConfig;
use crate::error::ConfigError;
use crate::stl::StlDecomposer;
use crate::window::{Sample, SlidingWindow};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Emitted once per detected anomaly, never mutated afterwards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub index: u64,
    pub value: f64,
    pub score: f64,
}

/// Why a full window produced no decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Residual variance too small to score against
    DegenerateResidual,
    /// Decomposition failed for this window
    Decomposition,
    /// Between two scheduled evaluations
    Decimated,
}

/// Result of processing one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    /// Window still filling
    Filling,
    Skipped(SkipReason),
    Normal { score: f64 },
    Anomaly(AnomalyEvent),
}

impl Verdict {
    pub fn is_anomaly(&self) -> bool {
        matches!(self, Self::Anomaly(_))
    }

    /// Z-score when the sample was evaluated
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Normal { score } => Some(*score),
            Self::Anomaly(event) => Some(event.score),
            Self::Filling | Self::Skipped(_) => None,
        }
    }

    pub fn event(&self) -> Option<&AnomalyEvent> {
        match self {
            Self::Anomaly(event) => Some(event),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorState {
    Filling,
    Ready,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorStats {
    pub processed: u64,
    pub evaluated: u64,
    pub anomalies: u64,
    pub skipped_degenerate: u64,
    pub skipped_decimated: u64,
    pub decomposition_failures: u64,
}

pub struct OnlineDetector {
    config: DetectorConfig,
    window: SlidingWindow,
    decomposer: StlDecomposer,
    classifier: ResidualClassifier,
    state: DetectorState,
    events: Vec<AnomalyEvent>,
    stats: DetectorStats,
    next_index: u64,
    pushes_since_ready: u64,
}

impl OnlineDetector {
    /// Validate `config` and build a detector in the `Filling` state
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let decomposer = StlDecomposer::new(config.decomposition.clone())?;
        let classifier = ResidualClassifier::new(config.z_threshold, config.min_residual_std);

        Ok(Self {
            window: SlidingWindow::new(config.window_size),
            decomposer,
            classifier,
            state: DetectorState::Filling,
            events: Vec::new(),
            stats: DetectorStats::default(),
            next_index: 0,
            pushes_since_ready: 0,
            config,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn stats(&self) -> DetectorStats {
        self.stats
    }

    /// Anomalies emitted so far, in arrival order
    pub fn events(&self) -> &[AnomalyEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<AnomalyEvent> {
        std::mem::take(&mut self.events)
    }

    /// Process a bare value, assigning the next sequence index
    pub fn process_value(&mut self, value: f64) -> Verdict {
        let sample = Sample::new(self.next_index, value);
        self.process(sample)
    }

    pub fn process(&mut self, sample: Sample) -> Verdict {
        self.stats.processed += 1;
        self.next_index = sample.index.saturating_add(1);

        self.window.push(sample);
        if !self.window.is_full() {
            return Verdict::Filling;
        }

        if self.state == DetectorState::Filling {
            debug!(index = sample.index, "Window full, detector ready.");
            self.state = DetectorState::Ready;
        }

        let due = self.pushes_since_ready % self.config.recompute_every as u64 == 0;
        self.pushes_since_ready += 1;
        if !due {
            self.stats.skipped_decimated += 1;
            return Verdict::Skipped(SkipReason::Decimated);
        }

        self.evaluate(sample)
    }

    fn evaluate(&mut self, sample: Sample) -> Verdict {
        let values = self.window.timeline();

        let decomposition = match self.decomposer.decompose(&values) {
            Ok(d) => d,
            Err(e) => {
                self.stats.decomposition_failures += 1;
                warn!(index = sample.index, error = %e, "Decomposition failed, skipping sample.");
                return Verdict::Skipped(SkipReason::Decomposition);
            }
        };

        let scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let Some(classification) = self.classifier.classify(&decomposition.residual, scale) else {
            self.stats.skipped_degenerate += 1;
            return Verdict::Skipped(SkipReason::DegenerateResidual);
        };
        self.stats.evaluated += 1;

        if !classification.is_anomaly {
            return Verdict::Normal {
                score: classification.score,
            };
        }

        // Keep the contaminated point out of future decompositions
        self.window.pop_last();

        let event = AnomalyEvent {
            index: sample.index,
            value: sample.value,
            score: classification.score,
        };
        self.events.push(event);
        self.stats.anomalies += 1;
        debug!(
            index = event.index,
            value = event.value,
            score = event.score,
            "Anomaly detected."
        );

        Verdict::Anomaly(event)
    }

    /// Drop all buffered samples and events; back to `Filling`
    pub fn reset(&mut self) {
        self.window.clear();
        self.events.clear();
        self.stats = DetectorStats::default();
        self.state = DetectorState::Filling;
        self.next_index = 0;
        self.pushes_since_ready = 0;
    }
}

/// Summary of a whole-series scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub indices: Vec<u64>,
    pub scores: Vec<f64>,
    pub count: usize,
    pub stats: DetectorStats,
}

/// Run a fresh detector over `values` (sample index = position)
pub fn scan(values: &[f64], config: DetectorConfig) -> Result<ScanReport, ConfigError> {
    let mut detector = OnlineDetector::new(config)?;
    for &value in values {
        detector.process_value(value);
    }

    let events = detector.take_events();
    Ok(ScanReport {
        indices: events.iter().map(|e| e.index).collect(),
        scores: events.iter().map(|e| e.score).collect(),
        count: events.len(),
        stats: detector.stats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StlConfig, presets};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    fn small_config() -> DetectorConfig {
        DetectorConfig {
            window_size: 60,
            z_threshold: 3.0,
            recompute_every: 1,
            min_residual_std: 1e-8,
            decomposition: StlConfig {
                period: 20,
                ..StlConfig::default()
            },
        }
    }

    fn noisy_seasonal(n: usize, period: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 0.5).unwrap();
        (0..n)
            .map(|t| {
                let t = t as f64;
                0.02 * t
                    + 5.0 * (2.0 * std::f64::consts::PI * t / period as f64).sin()
                    + noise.sample(&mut rng)
            })
            .collect()
    }

    #[test]
    fn test_filling_then_ready() {
        let mut detector = OnlineDetector::new(small_config()).unwrap();
        let values = noisy_seasonal(61, 20, 1);

        for &v in &values[..59] {
            assert_eq!(detector.process_value(v), Verdict::Filling);
            assert_eq!(detector.state(), DetectorState::Filling);
        }

        let verdict = detector.process_value(values[59]);
        assert!(verdict.score().is_some());
        assert_eq!(detector.state(), DetectorState::Ready);
        assert_eq!(detector.stats().evaluated, 1);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = OnlineDetector::new(presets::live().with_window(50, 30));
        assert!(matches!(
            result,
            Err(ConfigError::WindowTooSmall {
                window_size: 50,
                period: 30
            })
        ));
    }

    #[test]
    fn test_spike_is_flagged_and_suppressed() {
        let mut detector = OnlineDetector::new(small_config()).unwrap();
        let values = noisy_seasonal(120, 20, 2);

        for &v in &values[..100] {
            detector.process_value(v);
        }
        let before = detector.events().len();

        let verdict = detector.process_value(values[100] + 30.0);
        assert!(verdict.is_anomaly(), "spike not flagged: {:?}", verdict);
        assert_eq!(detector.events().len(), before + 1);
        assert_eq!(detector.events().last().map(|e| e.index), Some(100));

        // Suppression removed the spike from the window
        assert_eq!(detector.window().len(), 59);
        assert!(detector.window().iter().all(|s| s.index != 100));

        // Next sample refills the window
        detector.process_value(values[101]);
        assert!(detector.window().is_full());
    }

    #[test]
    fn test_constant_stream_never_flags() {
        let mut detector = OnlineDetector::new(small_config()).unwrap();
        for _ in 0..200 {
            let verdict = detector.process_value(4.2);
            assert!(!verdict.is_anomaly());
        }

        let stats = detector.stats();
        assert_eq!(stats.anomalies, 0);
        assert_eq!(stats.skipped_degenerate, 141);
        assert_eq!(stats.decomposition_failures, 0);
    }

    #[test]
    fn test_decomposition_failure_leaves_window_untouched() {
        let mut detector = OnlineDetector::new(small_config()).unwrap();
        for &v in &noisy_seasonal(60, 20, 3) {
            detector.process_value(v);
        }

        let verdict = detector.process_value(f64::NAN);
        assert_eq!(verdict, Verdict::Skipped(SkipReason::Decomposition));
        assert_eq!(detector.stats().decomposition_failures, 1);
        assert!(detector.window().is_full());
        assert!(detector.window().last().map(|s| s.value.is_nan()).unwrap_or(false));

        // The stream keeps going; the NaN only ages out of the window
        let verdict = detector.process_value(1.0);
        assert_eq!(verdict, Verdict::Skipped(SkipReason::Decomposition));

        let rest = noisy_seasonal(121, 20, 3);
        for &v in &rest[62..120] {
            let verdict = detector.process_value(v);
            assert_eq!(verdict, Verdict::Skipped(SkipReason::Decomposition));
        }
        assert_eq!(detector.stats().decomposition_failures, 60);

        // Index 120 evicts the NaN pushed at 60
        let verdict = detector.process_value(rest[120]);
        assert!(verdict.score().is_some(), "not scored: {:?}", verdict);
        assert!(detector.window().iter().all(|s| s.value.is_finite()));
    }

    #[test]
    fn test_large_constant_stream_is_degenerate() {
        for level in [3.3e7, 1e9 + 0.37, 7.77e12] {
            let mut detector = OnlineDetector::new(small_config()).unwrap();
            for _ in 0..200 {
                let verdict = detector.process_value(level);
                assert!(
                    matches!(
                        verdict,
                        Verdict::Filling | Verdict::Skipped(SkipReason::DegenerateResidual)
                    ),
                    "level {}: {:?}",
                    level,
                    verdict
                );
            }
            assert_eq!(detector.stats().skipped_degenerate, 141);
            assert_eq!(detector.stats().evaluated, 0);
        }
    }

    #[test]
    fn test_suppression_keeps_seasonal_phase() {
        let mut values = noisy_seasonal(400, 20, 8);
        values[100] += 30.0;

        let mut detector = OnlineDetector::new(small_config()).unwrap();
        let mut flagged = Vec::new();
        for (i, &v) in values.iter().enumerate() {
            let verdict = detector.process(Sample::new(i as u64, v));
            if let Some(event) = verdict.event() {
                flagged.push(event.index);
            }
            if i == 100 {
                assert_eq!(detector.window().len(), 59);
            }
            // Decomposition input spans every index from head to tail
            let window = detector.window();
            if let (Some(head), Some(tail)) = (window.iter().next(), window.last()) {
                let span = (tail.index - head.index + 1) as usize;
                assert_eq!(window.timeline().len(), span);
            }
        }

        assert!(flagged.contains(&100), "spike missed: {:?}", flagged);
        let others = flagged.iter().filter(|&&i| i != 100).count();
        assert!(others <= 4, "flags after suppression: {:?}", flagged);
    }

    #[test]
    fn test_decimation_skips_between_evaluations() {
        let config = DetectorConfig {
            recompute_every: 5,
            ..small_config()
        };
        let mut detector = OnlineDetector::new(config).unwrap();
        let values = noisy_seasonal(160, 20, 4);

        let mut verdicts = Vec::new();
        for &v in &values {
            verdicts.push(detector.process_value(v));
        }

        // 101 full-window pushes, every 5th evaluated
        let stats = detector.stats();
        assert_eq!(stats.skipped_decimated, 80);
        assert_eq!(verdicts[60], Verdict::Skipped(SkipReason::Decimated));
        assert!(verdicts[64].score().is_some());
    }

    #[test]
    fn test_back_to_back_anomalies_within_period() {
        let mut detector = OnlineDetector::new(small_config()).unwrap();
        let mut values = noisy_seasonal(140, 20, 5);
        values[100] += 25.0;
        values[108] -= 25.0;

        let mut flagged = Vec::new();
        for &v in &values {
            let verdict = detector.process_value(v);
            assert!(detector.window().len() <= detector.window().capacity());
            if let Some(event) = verdict.event() {
                flagged.push(event.index);
            }
        }

        assert!(flagged.contains(&100), "first anomaly missed: {:?}", flagged);
        assert!(flagged.contains(&108), "second anomaly missed: {:?}", flagged);
    }

    #[test]
    fn test_reset_returns_to_filling() {
        let mut detector = OnlineDetector::new(small_config()).unwrap();
        for &v in &noisy_seasonal(80, 20, 6) {
            detector.process_value(v);
        }
        assert_eq!(detector.state(), DetectorState::Ready);

        detector.reset();
        assert_eq!(detector.state(), DetectorState::Filling);
        assert!(detector.window().is_empty());
        assert_eq!(detector.stats(), DetectorStats::default());
        assert_eq!(detector.process_value(1.0), Verdict::Filling);
    }

    #[test]
    fn test_scan_matches_streaming() {
        let mut values = noisy_seasonal(150, 20, 7);
        values[90] += 30.0;

        let report = scan(&values, small_config()).unwrap();
        assert_eq!(report.count, report.indices.len());
        assert_eq!(report.scores.len(), report.count);
        assert!(report.indices.contains(&90));

        let mut detector = OnlineDetector::new(small_config()).unwrap();
        let streamed: Vec<u64> = values
            .iter()
            .filter_map(|&v| detector.process_value(v).event().map(|e| e.index))
            .collect();
        assert_eq!(streamed, report.indices);
    }
}
