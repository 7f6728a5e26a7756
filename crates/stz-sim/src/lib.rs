//! # stz-sim - Seasonal Series Simulation
//!
//! Synthetic time series with controlled anomaly injection and ground truth
//! tracking, for benchmarking the stz detectors.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        stz-sim                           │
//! │                                                          │
//! │   ┌───────────┐    ┌──────────────────┐                  │
//! │   │  Baseline │───▶│ SeriesGenerator  │──▶ GeneratedSeries│
//! │   │ trend+sin │    │ noise + offsets  │   (values, truth) │
//! │   └───────────┘    └──────────────────┘                  │
//! │         │                                                │
//! │         └─────────▶ StreamSource ──▶ StreamPoint ...     │
//! │                    (endless, per-sample anomalies)       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **No Detection Logic** - the simulator only produces values and ground
//!    truth. Scoring happens in stz-bench.
//!
//! 2. **Reproducible** - a fixed seed pins both the noise and the injected
//!    positions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stz_sim::{SeriesGenerator, presets};
//!
//! let config = presets::logarithmic_growth().with_seed(42);
//! let series = SeriesGenerator::new(config).unwrap().generate();
//! println!("{} samples, {} injected", series.len(), series.ground_truth.len());
//! ```

pub mod generator;
pub mod ground_truth;
pub mod presets;
pub mod signal;
pub mod stream;

pub use generator::{GeneratedSeries, GeneratorConfig, GeneratorError, SeriesGenerator, generate};
pub use ground_truth::GroundTruth;
pub use presets::{create_preset, list_presets};
pub use signal::{Baseline, TrendShape};
pub use stream::{StreamConfig, StreamPoint, StreamSource};
