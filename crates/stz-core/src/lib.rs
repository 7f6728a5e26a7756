//! # stz-core
//!
//! Streaming anomaly detection on seasonal time series.
//!
//! Each incoming value is appended to a fixed-size sliding window. Once the
//! window is full it is split by STL into trend, seasonal and residual
//! components, and the newest residual is scored against the rest of the
//! window. A score beyond the z threshold is reported as an anomaly and the
//! value is dropped from the window so it cannot distort later fits.
//!
//! ```no_run
//! use stz_core::{DetectorConfig, OnlineDetector};
//!
//! let mut detector = OnlineDetector::new(DetectorConfig::default()).unwrap();
//! for value in [1.0, 2.0, 3.0] {
//!     if let Some(event) = detector.process_value(value).event() {
//!         println!("anomaly at {} (z = {:.2})", event.index, event.score);
//!     }
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod detector;
pub mod error;
pub mod offline;
pub mod stl;
pub mod window;
pub mod worker;

pub use classifier::{Classification, ResidualClassifier};
pub use config::{DetectorConfig, StlConfig, presets};
pub use detector::{
    AnomalyEvent, DetectorState, DetectorStats, OnlineDetector, ScanReport, SkipReason, Verdict,
    scan,
};
pub use error::{ConfigError, DecompositionError, Error};
pub use offline::{OfflineConfig, OfflineReport, detect_offline};
pub use stl::{Decomposition, StlDecomposer};
pub use window::{Sample, SlidingWindow};
pub use worker::{DetectorWorker, Outcome, WorkerError};
