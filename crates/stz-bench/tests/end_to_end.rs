use stz_bench::{BenchmarkConfig, BenchmarkRunner, evaluate_offline, scenarios, threshold_sweep};
use stz_core::{
    ConfigError, DetectorConfig, DetectorWorker, OfflineConfig, OnlineDetector, Sample, Verdict,
    presets, scan,
};
use stz_sim::{GeneratorConfig, SeriesGenerator, TrendShape, presets as sim_presets};

#[test]
fn test_baseline_detects_injected_anomalies() {
    // 1000 samples, 2% injected, window 200, period 100
    let config = scenarios::baseline();
    assert_eq!(config.generator.num, 1000);
    assert_eq!(config.detector.window_size, 200);
    assert_eq!(config.detector.period(), 100);

    let report = BenchmarkRunner::new().run(&config).unwrap();

    assert_eq!(report.injected, 20);
    assert!(report.tally.true_positives > 0, "no injected anomaly found");
    assert!(
        report.tally.false_positives < 5 * report.injected as u64,
        "too many false positives: {}",
        report.tally.false_positives
    );
    assert_eq!(report.tally.total(), 1000);
    assert_eq!(report.detected_indices.len(), report.detected_scores.len());
    assert_eq!(report.detector_stats.processed, 1000);
    assert!(report.detected_scores.iter().all(|z| z.abs() > 3.0));
}

#[test]
fn test_window_shorter_than_two_periods_is_rejected() {
    let detector = presets::live().with_window(50, 30);
    assert_eq!(
        OnlineDetector::new(detector.clone()).err(),
        Some(ConfigError::WindowTooSmall {
            window_size: 50,
            period: 30
        })
    );

    let config = BenchmarkConfig {
        detector,
        ..scenarios::baseline()
    };
    assert!(BenchmarkRunner::new().run(&config).is_err());
}

#[test]
fn test_clean_sine_yields_no_events() {
    let config = scenarios::clean_sine();
    let series = SeriesGenerator::new(config.generator.clone())
        .unwrap()
        .generate();
    assert_eq!(series.len(), 500);
    assert!(series.ground_truth.is_empty());

    let mut detector = OnlineDetector::new(presets::live()).unwrap();
    for &value in &series.values {
        let verdict = detector.process_value(value);
        assert!(!verdict.is_anomaly());
    }
    assert!(detector.events().is_empty());
    assert_eq!(detector.stats().decomposition_failures, 0);
}

#[test]
fn test_higher_threshold_never_flags_more() {
    let thresholds: Vec<f64> = (0..=12).map(|k| 2.0 + 0.25 * k as f64).collect();

    for seed in [1, 2, 3, 7, 42] {
        let series = SeriesGenerator::new(GeneratorConfig::default().with_seed(seed))
            .unwrap()
            .generate();

        let points = threshold_sweep(&series, &presets::live(), &thresholds).unwrap();
        let flagged: Vec<u64> = points
            .iter()
            .map(|p| p.true_positives + p.false_positives)
            .collect();

        for pair in flagged.windows(2) {
            assert!(
                pair[0] >= pair[1],
                "seed {}: flag counts rose with the threshold: {:?}",
                seed,
                flagged
            );
        }
    }
}

#[test]
fn test_clean_noisy_series_stays_quiet() {
    for seed in [1, 3, 7, 42, 99] {
        let config = GeneratorConfig::default().with_seed(seed).with_fraction(0.0);
        let series = SeriesGenerator::new(config).unwrap().generate();
        assert!(series.ground_truth.is_empty());

        let report = scan(&series.values, presets::live()).unwrap();
        // 800 scored samples at |z| > 3
        assert!(
            report.count <= 10,
            "seed {}: {} flags on a clean series: {:?}",
            seed,
            report.count,
            report.indices
        );
    }
}

#[test]
fn test_seeded_runs_are_identical() {
    let config = scenarios::baseline();
    let a = BenchmarkRunner::new().run(&config).unwrap();
    let b = BenchmarkRunner::new().run(&config).unwrap();

    assert_eq!(a.ground_truth, b.ground_truth);
    assert_eq!(a.detected_indices, b.detected_indices);
    assert_eq!(a.tally, b.tally);
}

#[test]
fn test_back_to_back_anomalies_within_one_period() {
    let clean = SeriesGenerator::new(GeneratorConfig {
        num: 700,
        anomaly_fraction: 0.0,
        trend: TrendShape::Linear { slope: 0.01 },
        noise_std: 0.5,
        seed: Some(5),
        ..GeneratorConfig::default()
    })
    .unwrap()
    .generate();

    let mut values = clean.values.clone();
    values[500] += 25.0;
    values[530] += 25.0;

    let mut detector = OnlineDetector::new(presets::live()).unwrap();
    let mut verdicts = Vec::with_capacity(values.len());
    for (i, &value) in values.iter().enumerate() {
        let verdict = detector.process(Sample::new(i as u64, value));
        assert!(detector.window().len() <= detector.window().capacity());
        if verdict.is_anomaly() {
            assert_eq!(detector.window().len(), detector.window().capacity() - 1);
        }
        verdicts.push(verdict);
    }

    // Both points are scored even though the first one shortened the window
    for i in [500, 530] {
        assert!(
            matches!(verdicts[i], Verdict::Normal { .. } | Verdict::Anomaly(_)),
            "sample {} was not evaluated: {:?}",
            i,
            verdicts[i]
        );
        assert!(verdicts[i].is_anomaly(), "sample {} missed", i);
    }
}

#[test]
fn test_worker_and_scan_agree_with_harness() {
    let config = scenarios::baseline();
    let series = SeriesGenerator::new(config.generator.clone())
        .unwrap()
        .generate();
    let report = BenchmarkRunner::new()
        .evaluate("harness", &series, config.detector.clone())
        .unwrap();

    let scanned = scan(&series.values, config.detector.clone()).unwrap();
    let scanned: Vec<usize> = scanned.indices.iter().map(|&i| i as usize).collect();
    assert_eq!(scanned, report.detected_indices);

    let worker =
        DetectorWorker::spawn(OnlineDetector::new(config.detector.clone()).unwrap(), 64).unwrap();
    for (i, &value) in series.values.iter().enumerate() {
        worker.submit(Sample::new(i as u64, value)).unwrap();
    }
    let (detector, _) = worker.shutdown().unwrap();
    let offloaded: Vec<usize> = detector.events().iter().map(|e| e.index as usize).collect();
    assert_eq!(offloaded, report.detected_indices);
}

#[test]
fn test_offline_detector_finds_injected_points() {
    let generator = GeneratorConfig {
        anomaly_magnitude: 25.0,
        ..sim_presets::linear_drift().with_seed(9)
    };
    let series = SeriesGenerator::new(generator).unwrap().generate();

    let mut config = OfflineConfig::default();
    config.decomposition.period = 100;
    let tally = evaluate_offline(&series, &config).unwrap();

    assert_eq!(tally.total(), series.len() as u64);
    assert!(tally.true_positives > series.ground_truth.len() as u64 / 2);
}

#[test]
fn test_detector_config_round_trips_through_json() {
    let config = presets::robust();
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(DetectorConfig::from_json_str(&json).unwrap(), config);
}
