//! stz-bench - Benchmark Suite for STZ Detection
//!
//! Usage:
//!   stz-bench run baseline               # Score one scenario
//!   stz-bench run --config bench.json    # Score a custom configuration
//!   stz-bench run-all                    # Run every scenario
//!   stz-bench sweep baseline             # Precision/recall across thresholds
//!   stz-bench generate logarithmic_growth --format csv
//!   stz-bench stream --count 2000        # Live source through the worker thread
//!   stz-bench offline baseline           # Whole-series rolling detector
//!   stz-bench list                       # Scenarios and presets

use clap::{Parser, Subcommand};
use std::error::Error;
use stz_bench::{
    BenchmarkConfig, BenchmarkRunner, EvaluationReport, evaluate_offline, scenarios,
    threshold_sweep,
};
use stz_core::{
    DetectorConfig, DetectorWorker, OfflineConfig, OnlineDetector, Outcome, Sample, presets,
};
use stz_sim::{GeneratedSeries, SeriesGenerator, StreamConfig, StreamSource};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "stz-bench")]
#[command(about = "Benchmark suite for STL residual anomaly detection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file for results
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single benchmark scenario
    Run {
        /// Scenario name (see `list`)
        #[arg(default_value = "baseline")]
        scenario: String,

        /// Benchmark configuration file (JSON), replaces the scenario
        #[arg(short, long)]
        config: Option<String>,

        /// Detector configuration file (JSON)
        #[arg(long)]
        detector: Option<String>,

        /// Detector preset override
        #[arg(short, long)]
        preset: Option<String>,

        /// Generator seed override
        #[arg(short, long)]
        seed: Option<u64>,

        /// Z-score threshold override
        #[arg(short, long)]
        z: Option<f64>,
    },

    /// Run all benchmark scenarios
    RunAll {
        /// Export format
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Evaluate one series at several thresholds
    Sweep {
        #[arg(default_value = "baseline")]
        scenario: String,

        /// Comma separated thresholds
        #[arg(
            short,
            long,
            value_delimiter = ',',
            default_values_t = [1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 5.0]
        )]
        thresholds: Vec<f64>,
    },

    /// Generate a series with ground truth
    Generate {
        /// Generator preset
        #[arg(default_value = "logarithmic_growth")]
        preset: String,

        #[arg(short, long)]
        num: Option<usize>,

        /// Fraction of samples to displace
        #[arg(short = 'p', long)]
        fraction: Option<f64>,

        #[arg(short, long)]
        seed: Option<u64>,

        /// json or csv
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Feed an endless source through a detector worker thread
    Stream {
        /// Number of samples to draw
        #[arg(short, long, default_value = "2000")]
        count: usize,

        /// Worker queue capacity
        #[arg(short, long, default_value = "256")]
        queue: usize,

        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Score the whole-series rolling z-score detector
    Offline {
        #[arg(default_value = "baseline")]
        scenario: String,

        /// Rolling window over the residual
        #[arg(short, long, default_value = "10")]
        window: usize,

        #[arg(long, default_value = "2.0")]
        sigma: f64,
    },

    /// List scenarios and presets
    List,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            config,
            detector,
            preset,
            seed,
            z,
        } => {
            let mut bench = match config {
                Some(path) => load_benchmark_config(&path)?,
                None => lookup_scenario(&scenario)?,
            };
            if let Some(path) = detector {
                bench.detector = DetectorConfig::from_json_file(&path)?;
            }
            if let Some(name) = preset {
                bench.detector =
                    presets::by_name(&name).ok_or_else(|| format!("Unknown preset '{}'", name))?;
            }
            if let Some(seed) = seed {
                bench.generator.seed = Some(seed);
            }
            if let Some(z) = z {
                bench.detector.z_threshold = z;
            }
            run_single_benchmark(&bench, cli.output, cli.verbose)
        }
        Commands::RunAll { format } => run_all_benchmarks(&format, cli.output, cli.verbose),
        Commands::Sweep {
            scenario,
            thresholds,
        } => run_sweep(&scenario, &thresholds, cli.output),
        Commands::Generate {
            preset,
            num,
            fraction,
            seed,
            format,
        } => generate_series(&preset, num, fraction, seed, &format, cli.output),
        Commands::Stream { count, queue, seed } => run_stream(count, queue, seed),
        Commands::Offline {
            scenario,
            window,
            sigma,
        } => run_offline(&scenario, window, sigma, cli.output),
        Commands::List => {
            list_everything();
            Ok(())
        }
    }
}

fn lookup_scenario(name: &str) -> Result<BenchmarkConfig, Box<dyn Error>> {
    scenarios::by_name(name).ok_or_else(|| format!("Unknown scenario '{}'", name).into())
}

fn load_benchmark_config(path: &str) -> Result<BenchmarkConfig, Box<dyn Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_or_print(content: &str, output: Option<String>) -> Result<(), Box<dyn Error>> {
    match output {
        Some(output_file) => {
            std::fs::write(&output_file, content)?;
            println!("\nResults saved to: {}", output_file);
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn run_single_benchmark(
    config: &BenchmarkConfig,
    output: Option<String>,
    verbose: bool,
) -> Result<(), Box<dyn Error>> {
    println!("Running benchmark: {}\n", config.name);

    let mut runner = BenchmarkRunner::new().with_verbose(verbose);
    let results = runner.run(config)?;
    runner.print_results(&results);

    if let Some(output_file) = output {
        std::fs::write(&output_file, runner.export_json(&results))?;
        println!("\nResults saved to: {}", output_file);
    }
    Ok(())
}

fn run_all_benchmarks(
    format: &str,
    output: Option<String>,
    verbose: bool,
) -> Result<(), Box<dyn Error>> {
    println!("Running all benchmarks...\n");

    let mut all_results: Vec<EvaluationReport> = Vec::new();
    for config in scenarios::all() {
        if verbose {
            println!("Running: {}", config.name);
        }

        let mut runner = BenchmarkRunner::new().with_verbose(verbose);
        let results = runner.run(&config)?;

        if verbose {
            runner.print_results(&results);
            println!();
        }
        all_results.push(results);
    }

    let json = serde_json::to_string_pretty(&all_results)?;
    match (output, format) {
        (Some(output_file), _) => {
            std::fs::write(&output_file, json)?;
            println!("Results saved to: {}", output_file);
        }
        (None, "json") => println!("{}", json),
        (None, _) => {
            println!("{:30} {:>6} {:>6} {:>6} {:>8}", "Scenario", "TP", "FP", "FN", "F1");
            for r in &all_results {
                println!(
                    "{:30} {:>6} {:>6} {:>6} {:>8.3}",
                    r.config,
                    r.tally.true_positives,
                    r.tally.false_positives,
                    r.tally.false_negatives,
                    r.f1_score
                );
            }
        }
    }
    Ok(())
}

fn run_sweep(
    scenario: &str,
    thresholds: &[f64],
    output: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let config = lookup_scenario(scenario)?;
    let series = SeriesGenerator::new(config.generator.clone())?.generate();

    println!(
        "Sweeping {} thresholds on '{}' ({} samples, {} injected)\n",
        thresholds.len(),
        config.name,
        series.len(),
        series.ground_truth.len()
    );

    let points = threshold_sweep(&series, &config.detector, thresholds)?;

    println!(
        "{:>6} {:>6} {:>6} {:>6} {:>10} {:>10} {:>8}",
        "z", "TP", "FP", "FN", "Precision", "Recall", "F1"
    );
    for p in &points {
        println!(
            "{:>6.2} {:>6} {:>6} {:>6} {:>9.1}% {:>9.1}% {:>8.3}",
            p.z_threshold,
            p.true_positives,
            p.false_positives,
            p.false_negatives,
            p.precision * 100.0,
            p.recall * 100.0,
            p.f1_score
        );
    }

    if let Some(output_file) = output {
        std::fs::write(&output_file, serde_json::to_string_pretty(&points)?)?;
        println!("\nResults saved to: {}", output_file);
    }
    Ok(())
}

fn generate_series(
    preset: &str,
    num: Option<usize>,
    fraction: Option<f64>,
    seed: Option<u64>,
    format: &str,
    output: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut config = stz_sim::create_preset(preset)
        .ok_or_else(|| format!("Unknown generator preset '{}'", preset))?;
    if let Some(num) = num {
        config.num = num;
    }
    if let Some(fraction) = fraction {
        config.anomaly_fraction = fraction;
    }
    config.seed = seed.or(config.seed);

    let series = SeriesGenerator::new(config)?.generate();
    info!(
        samples = series.len(),
        injected = series.ground_truth.len(),
        "Series generated."
    );

    let content = match format {
        "csv" => generate_csv(&series),
        "json" => serde_json::to_string_pretty(&series)?,
        other => return Err(format!("Unsupported format: {}", other).into()),
    };
    write_or_print(&content, output)
}

fn generate_csv(series: &GeneratedSeries) -> String {
    let mut csv = String::from("index,value,is_anomaly\n");
    for (i, value) in series.values.iter().enumerate() {
        csv.push_str(&format!(
            "{},{:.6},{}\n",
            i,
            value,
            series.ground_truth.contains(i)
        ));
    }
    csv
}

fn run_stream(count: usize, queue: usize, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    let source = StreamSource::new(StreamConfig {
        seed,
        ..StreamConfig::default()
    })?;
    let detector = OnlineDetector::new(presets::live())?;
    let worker = DetectorWorker::spawn(detector, queue)?;

    println!("Streaming {} samples through the detector worker...\n", count);

    let mut injected = Vec::new();
    for point in source.take(count) {
        if point.is_anomaly {
            injected.push(point.index);
        }
        worker.submit(Sample::new(point.index, point.value))?;

        worker.results().try_iter().for_each(|o| print_event(&o));
    }

    let (detector, remaining) = worker.shutdown()?;
    remaining.iter().for_each(print_event);

    let detected: Vec<u64> = detector.events().iter().map(|e| e.index).collect();
    let hits = detected.iter().filter(|i| injected.contains(i)).count();
    let stats = detector.stats();
    println!(
        "\n✅ {} processed | {} injected | {} detected | {} matched",
        stats.processed,
        injected.len(),
        detected.len(),
        hits
    );
    if stats.decomposition_failures > 0 {
        warn!(
            failures = stats.decomposition_failures,
            "Some windows could not be decomposed."
        );
    }
    Ok(())
}

fn print_event(outcome: &Outcome) {
    if let Some(event) = outcome.verdict.event() {
        println!(
            "  ⚠ anomaly at {:>6}  value {:>9.3}  z {:>7.2}",
            event.index, event.value, event.score
        );
    }
}

fn run_offline(
    scenario: &str,
    window: usize,
    sigma: f64,
    output: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let bench = lookup_scenario(scenario)?;
    let series = SeriesGenerator::new(bench.generator.clone())?.generate();

    let mut config = OfflineConfig {
        rolling_window: window,
        sigma,
        ..OfflineConfig::default()
    };
    config.decomposition.period = bench.generator.period;

    let tally = evaluate_offline(&series, &config)?;
    let (precision, recall, f1) = tally.metrics();

    println!("Offline rolling z-score on '{}'\n", bench.name);
    println!(
        "  TP {:>5} | FP {:>5} | FN {:>5} | TN {:>6}",
        tally.true_positives, tally.false_positives, tally.false_negatives, tally.true_negatives
    );
    println!(
        "  Precision {:>6.2}% | Recall {:>6.2}% | F1 {:.3}",
        precision * 100.0,
        recall * 100.0,
        f1
    );

    if let Some(output_file) = output {
        std::fs::write(&output_file, serde_json::to_string_pretty(&tally)?)?;
        println!("\nResults saved to: {}", output_file);
    }
    Ok(())
}

fn list_everything() {
    println!("Benchmark scenarios:");
    for (i, (name, desc)) in scenarios::list().iter().enumerate() {
        println!("{:2}. {:20} - {}", i + 1, name, desc);
    }

    println!("\nDetector presets:");
    for name in presets::names() {
        if let Some(config) = presets::by_name(name) {
            println!(
                "    {:12} window {:>5} | period {:>4} | z {:.1} | robust {}",
                name,
                config.window_size,
                config.period(),
                config.z_threshold,
                config.decomposition.robust
            );
        }
    }

    println!("\nGenerator presets:");
    for (name, desc) in stz_sim::list_presets() {
        println!("    {:20} - {}", name, desc);
    }

    println!();
    println!("Use 'stz-bench run <scenario>' to run a benchmark.");
}
