//! Benchmark Suite for STZ Detection
//!
//! Drives the online detector over generated series with known anomalies:
//! - TP / FP / FN / TN tally per sample against ground truth
//! - Precision, Recall, F1-Score
//! - Latency measurements (p50, p95, p99)
//! - Throughput (samples per second)

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use stz_core::{
    ConfigError, DecompositionError, DetectorConfig, DetectorStats, OfflineConfig,
    OnlineDetector, Sample, detect_offline,
};
use stz_sim::{GeneratedSeries, GeneratorConfig, GeneratorError, GroundTruth, SeriesGenerator};

/// Benchmark configuration
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub name: String,
    pub detector: DetectorConfig,
    pub generator: GeneratorConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            name: "Default Benchmark".to_string(),
            detector: DetectorConfig::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BenchError {
    Config(ConfigError),
    Generator(GeneratorError),
    Decomposition(DecompositionError),
}

impl std::fmt::Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Invalid detector configuration: {}", e),
            Self::Generator(e) => write!(f, "Invalid generator configuration: {}", e),
            Self::Decomposition(e) => write!(f, "Offline decomposition failed: {}", e),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Generator(e) => Some(e),
            Self::Decomposition(e) => Some(e),
        }
    }
}

impl From<ConfigError> for BenchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<GeneratorError> for BenchError {
    fn from(e: GeneratorError) -> Self {
        Self::Generator(e)
    }
}

impl From<stz_core::Error> for BenchError {
    fn from(e: stz_core::Error) -> Self {
        match e {
            stz_core::Error::Config(c) => Self::Config(c),
            stz_core::Error::Decomposition(d) => Self::Decomposition(d),
        }
    }
}

/// Per-sample confusion counts plus the positions behind each class
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ClassificationTally {
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub true_negatives: u64,
    pub tp_indices: Vec<usize>,
    pub fp_indices: Vec<usize>,
    pub fn_indices: Vec<usize>,
}

impl ClassificationTally {
    pub fn record(&mut self, index: usize, is_ground_truth: bool, detected: bool) {
        match (detected, is_ground_truth) {
            (true, true) => {
                self.true_positives += 1;
                self.tp_indices.push(index);
            }
            (true, false) => {
                self.false_positives += 1;
                self.fp_indices.push(index);
            }
            (false, true) => {
                self.false_negatives += 1;
                self.fn_indices.push(index);
            }
            (false, false) => self.true_negatives += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }

    pub fn detections(&self) -> u64 {
        self.true_positives + self.false_positives
    }

    /// (precision, recall, f1)
    pub fn metrics(&self) -> (f64, f64, f64) {
        calculate_metrics(
            self.true_positives,
            self.false_positives,
            self.false_negatives,
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LatencyMetrics {
    pub p50_micros: f64,
    pub p95_micros: f64,
    pub p99_micros: f64,
    pub avg_micros: f64,
}

impl LatencyMetrics {
    pub fn from_nanos(latencies: &[u64]) -> Self {
        if latencies.is_empty() {
            return Self::default();
        }

        let mut sorted = latencies.to_vec();
        sorted.sort_unstable();

        let len = sorted.len();
        let micros = |ns: u64| ns as f64 / 1_000.0;
        let avg = sorted.iter().sum::<u64>() as f64 / len as f64 / 1_000.0;

        Self {
            p50_micros: micros(sorted[len / 2]),
            p95_micros: micros(sorted[len * 95 / 100]),
            p99_micros: micros(sorted[len * 99 / 100]),
            avg_micros: avg,
        }
    }
}

/// Outcome of one detector pass over one generated series
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EvaluationReport {
    pub config: String,
    pub total_samples: usize,
    pub injected: usize,
    pub tally: ClassificationTally,
    pub detected_indices: Vec<usize>,
    pub detected_scores: Vec<f64>,
    pub ground_truth: Vec<usize>,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub detector_stats: DetectorStats,
    pub latency_micros: LatencyMetrics,
    pub throughput_sps: f64,
}

/// One row of a threshold sweep
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SweepPoint {
    pub z_threshold: f64,
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Main benchmark runner with ground truth tracking
pub struct BenchmarkRunner {
    verbose: bool,
    latencies: Vec<u64>,
}

impl BenchmarkRunner {
    pub fn new() -> Self {
        Self {
            verbose: false,
            latencies: Vec::new(),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Generate the configured series and score the detector on it
    pub fn run(&mut self, config: &BenchmarkConfig) -> Result<EvaluationReport, BenchError> {
        // Fail on the detector before spending time generating data
        config.detector.validate()?;
        let series = SeriesGenerator::new(config.generator.clone())?.generate();

        if self.verbose {
            println!("╔══════════════════════════════════════════════════════════════╗");
            println!("║           STZ Benchmark Suite - Ground Truth Mode            ║");
            println!("╠══════════════════════════════════════════════════════════════╣");
            println!("║ Config: {:52} ║", config.name);
            println!(
                "║ Window: {:>6} | Period: {:>5} | z: {:>5.2} {:>17} ║",
                config.detector.window_size,
                config.detector.period(),
                config.detector.z_threshold,
                ""
            );
            println!(
                "║ Samples: {:>6} | Injected: {:>5} {:>28} ║",
                series.len(),
                series.ground_truth.len(),
                ""
            );
            println!("╚══════════════════════════════════════════════════════════════╝");
        }

        self.evaluate(&config.name, &series, config.detector.clone())
    }

    /// Score a fresh detector against an existing series
    pub fn evaluate(
        &mut self,
        name: &str,
        series: &GeneratedSeries,
        detector_config: DetectorConfig,
    ) -> Result<EvaluationReport, BenchError> {
        let mut detector = OnlineDetector::new(detector_config)?;
        self.latencies.clear();
        self.latencies.reserve(series.len());

        let mut tally = ClassificationTally::default();
        let mut detected_indices = Vec::new();
        let mut detected_scores = Vec::new();

        let start_time = Instant::now();
        for (i, &value) in series.values.iter().enumerate() {
            let started = Instant::now();
            let verdict = detector.process(Sample::new(i as u64, value));
            self.latencies.push(started.elapsed().as_nanos() as u64);

            let detected = verdict.is_anomaly();
            if let Some(event) = verdict.event() {
                detected_indices.push(i);
                detected_scores.push(event.score);
            }
            tally.record(i, series.ground_truth.contains(i), detected);
        }
        let elapsed = start_time.elapsed();

        if self.verbose {
            println!(
                "\n✅ {} evaluated {} samples in {:.2}s",
                name,
                series.len(),
                elapsed.as_secs_f64()
            );
        }

        Ok(self.build_report(
            name,
            series,
            tally,
            detected_indices,
            detected_scores,
            detector.stats(),
            elapsed,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_report(
        &self,
        name: &str,
        series: &GeneratedSeries,
        tally: ClassificationTally,
        detected_indices: Vec<usize>,
        detected_scores: Vec<f64>,
        detector_stats: DetectorStats,
        elapsed: Duration,
    ) -> EvaluationReport {
        let (precision, recall, f1) = tally.metrics();
        let seconds = elapsed.as_secs_f64();

        EvaluationReport {
            config: name.to_string(),
            total_samples: series.len(),
            injected: series.ground_truth.len(),
            tally,
            detected_indices,
            detected_scores,
            ground_truth: series.ground_truth.to_vec(),
            precision,
            recall,
            f1_score: f1,
            detector_stats,
            latency_micros: LatencyMetrics::from_nanos(&self.latencies),
            throughput_sps: if seconds > 0.0 {
                series.len() as f64 / seconds
            } else {
                0.0
            },
        }
    }

    pub fn print_results(&self, results: &EvaluationReport) {
        let tally = &results.tally;
        let stats = &results.detector_stats;

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    BENCHMARK RESULTS                         ║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ Configuration: {:45} ║", results.config);
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ OVERALL METRICS                                              ║");
        println!("╠──────────────────────────────────────────────────────────────╣");
        println!(
            "║ Total Samples:      {:>10}                               ║",
            results.total_samples
        );
        println!(
            "║ Injected:           {:>10}                               ║",
            results.injected
        );
        println!(
            "║ Detections:         {:>10}                               ║",
            tally.detections()
        );
        println!(
            "║ Throughput:         {:>10.0} samples/s                     ║",
            results.throughput_sps
        );
        println!("╠──────────────────────────────────────────────────────────────╣");
        println!("║ ACCURACY                                                     ║");
        println!("╠──────────────────────────────────────────────────────────────╣");
        println!(
            "║ True Positives:     {:>10}                               ║",
            tally.true_positives
        );
        println!(
            "║ False Positives:    {:>10}                               ║",
            tally.false_positives
        );
        println!(
            "║ True Negatives:     {:>10}                               ║",
            tally.true_negatives
        );
        println!(
            "║ False Negatives:    {:>10}                               ║",
            tally.false_negatives
        );
        println!("║                                                              ║");
        println!(
            "║ Precision:          {:>10.2}%                              ║",
            results.precision * 100.0
        );
        println!(
            "║ Recall:             {:>10.2}%                              ║",
            results.recall * 100.0
        );
        println!(
            "║ F1-Score:           {:>10.3}                               ║",
            results.f1_score
        );
        println!("╠──────────────────────────────────────────────────────────────╣");
        println!("║ DETECTOR                                                     ║");
        println!("╠──────────────────────────────────────────────────────────────╣");
        println!(
            "║ Evaluated:          {:>10}                               ║",
            stats.evaluated
        );
        println!(
            "║ Degenerate skips:   {:>10}                               ║",
            stats.skipped_degenerate
        );
        println!(
            "║ Decimated skips:    {:>10}                               ║",
            stats.skipped_decimated
        );
        println!(
            "║ Decomp. failures:   {:>10}                               ║",
            stats.decomposition_failures
        );
        println!("╠──────────────────────────────────────────────────────────────╣");
        println!("║ LATENCY (microseconds)                                       ║");
        println!("╠──────────────────────────────────────────────────────────────╣");
        println!(
            "║ Average:            {:>10.2} µs                            ║",
            results.latency_micros.avg_micros
        );
        println!(
            "║ P50:                {:>10.2} µs                            ║",
            results.latency_micros.p50_micros
        );
        println!(
            "║ P95:                {:>10.2} µs                            ║",
            results.latency_micros.p95_micros
        );
        println!(
            "║ P99:                {:>10.2} µs                            ║",
            results.latency_micros.p99_micros
        );
        println!("╚══════════════════════════════════════════════════════════════╝");
    }

    pub fn export_json(&self, results: &EvaluationReport) -> String {
        serde_json::to_string_pretty(results).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for BenchmarkRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculate precision, recall, f1 from confusion matrix values
pub fn calculate_metrics(tp: u64, fp: u64, fn_: u64) -> (f64, f64, f64) {
    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    (precision, recall, f1)
}

/// Re-run the detector on one series at each threshold
pub fn threshold_sweep(
    series: &GeneratedSeries,
    base: &DetectorConfig,
    thresholds: &[f64],
) -> Result<Vec<SweepPoint>, BenchError> {
    let mut runner = BenchmarkRunner::new();
    thresholds
        .iter()
        .map(|&z| {
            let report = runner.evaluate("sweep", series, base.clone().with_threshold(z))?;
            Ok(SweepPoint {
                z_threshold: z,
                true_positives: report.tally.true_positives,
                false_positives: report.tally.false_positives,
                false_negatives: report.tally.false_negatives,
                precision: report.precision,
                recall: report.recall,
                f1_score: report.f1_score,
            })
        })
        .collect()
}

/// Tally the whole-series rolling detector against ground truth
pub fn evaluate_offline(
    series: &GeneratedSeries,
    config: &OfflineConfig,
) -> Result<ClassificationTally, BenchError> {
    let report = detect_offline(&series.values, config)?;
    Ok(tally_flags(&report.anomalies, &series.ground_truth))
}

pub fn tally_flags(flags: &[bool], truth: &GroundTruth) -> ClassificationTally {
    let mut tally = ClassificationTally::default();
    for (i, &flag) in flags.iter().enumerate() {
        tally.record(i, truth.contains(i), flag);
    }
    tally
}

/// Predefined benchmark scenarios
pub mod scenarios {
    use super::*;
    use stz_core::presets;

    /// 1000 samples, 2% injected, window 200 over a 100-sample season
    pub fn baseline() -> BenchmarkConfig {
        BenchmarkConfig {
            name: "Baseline - Log Trend, Period 100".to_string(),
            detector: presets::live(),
            generator: GeneratorConfig::default().with_seed(42),
        }
    }

    /// Long season with the large batch window
    pub fn long_window() -> BenchmarkConfig {
        BenchmarkConfig {
            name: "Long Window - Period 200".to_string(),
            detector: presets::batch(),
            generator: GeneratorConfig {
                num: 3000,
                anomaly_fraction: 0.01,
                ..stz_sim::presets::logarithmic_growth().with_seed(42)
            },
        }
    }

    /// Noisier linear drift scored with the sensitive preset
    pub fn linear_drift() -> BenchmarkConfig {
        BenchmarkConfig {
            name: "Linear Drift - Sensitive".to_string(),
            detector: presets::sensitive(),
            generator: stz_sim::presets::linear_drift().with_seed(42),
        }
    }

    /// Noiseless sine; any detection is a false positive
    pub fn clean_sine() -> BenchmarkConfig {
        BenchmarkConfig {
            name: "Clean Sine - No Anomalies".to_string(),
            detector: presets::live(),
            generator: stz_sim::presets::pure_sine().with_seed(42),
        }
    }

    pub fn all() -> Vec<BenchmarkConfig> {
        vec![baseline(), long_window(), linear_drift(), clean_sine()]
    }

    pub fn by_name(name: &str) -> Option<BenchmarkConfig> {
        match name {
            "baseline" => Some(baseline()),
            "long_window" | "long" => Some(long_window()),
            "linear_drift" | "drift" => Some(linear_drift()),
            "clean_sine" | "sine" => Some(clean_sine()),
            _ => None,
        }
    }

    pub fn list() -> Vec<(&'static str, &'static str)> {
        vec![
            ("baseline", "Log trend, period 100, window 200, 2% injected"),
            ("long_window", "Log trend, period 200, window 1000, 1% injected"),
            ("linear_drift", "Linear drift, noise 2, z 2"),
            ("clean_sine", "Noiseless sine, nothing injected"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_metrics() {
        let (p, r, f) = calculate_metrics(8, 2, 8);
        assert!((p - 0.8).abs() < 1e-12);
        assert!((r - 0.5).abs() < 1e-12);
        assert!((f - 2.0 * 0.4 / 1.3).abs() < 1e-12);

        assert_eq!(calculate_metrics(0, 0, 0), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_tally_records_every_class() {
        let mut tally = ClassificationTally::default();
        tally.record(0, true, true);
        tally.record(1, false, true);
        tally.record(2, true, false);
        tally.record(3, false, false);
        tally.record(4, false, false);

        assert_eq!(tally.tp_indices, vec![0]);
        assert_eq!(tally.fp_indices, vec![1]);
        assert_eq!(tally.fn_indices, vec![2]);
        assert_eq!(tally.true_negatives, 2);
        assert_eq!(tally.total(), 5);
        assert_eq!(tally.detections(), 2);
    }

    #[test]
    fn test_tally_flags() {
        let truth: GroundTruth = [1, 3].into_iter().collect();
        let tally = tally_flags(&[false, true, true, false], &truth);
        assert_eq!(tally.true_positives, 1);
        assert_eq!(tally.false_positives, 1);
        assert_eq!(tally.false_negatives, 1);
        assert_eq!(tally.true_negatives, 1);
    }

    #[test]
    fn test_latency_percentiles() {
        let nanos: Vec<u64> = (1..=100).map(|i| i * 1_000).collect();
        let metrics = LatencyMetrics::from_nanos(&nanos);
        assert_eq!(metrics.p50_micros, 51.0);
        assert_eq!(metrics.p95_micros, 96.0);
        assert_eq!(metrics.p99_micros, 100.0);
        assert!((metrics.avg_micros - 50.5).abs() < 1e-9);

        assert_eq!(LatencyMetrics::from_nanos(&[]).p99_micros, 0.0);
    }

    #[test]
    fn test_scenarios_are_valid() {
        for config in scenarios::all() {
            assert!(config.detector.validate().is_ok(), "{}", config.name);
            assert!(config.generator.validate().is_ok(), "{}", config.name);
            assert!(config.generator.num > config.detector.window_size);
        }
        for (name, _) in scenarios::list() {
            assert!(scenarios::by_name(name).is_some());
        }
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: BenchmarkConfig =
            serde_json::from_str(r#"{ "name": "custom", "generator": { "num": 600 } }"#).unwrap();
        assert_eq!(config.name, "custom");
        assert_eq!(config.generator.num, 600);
        assert_eq!(config.detector, DetectorConfig::default());
    }
}
