//! Error types for stz-core
//!
//! Configuration problems are fatal and surface before any data is processed.
//! Decomposition problems are recoverable: the online detector absorbs them
//! and reports "no decision" for the affected sample.

/// Invalid detector or decomposition parameters
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    WindowTooSmall { window_size: usize, period: usize },
    InvalidThreshold(f64),
    InvalidPeriod(usize),
    InvalidSeasonalSpan(usize),
    InvalidFraction(f64),
    InvalidDelta(f64),
    InvalidIterations,
    InvalidTolerance(f64),
    InvalidDecimation,
    InvalidRollingWindow(usize),
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WindowTooSmall {
                window_size,
                period,
            } => write!(
                f,
                "Window size {} is smaller than two seasonal periods (2 x {} = {})",
                window_size,
                period,
                period * 2
            ),
            Self::InvalidThreshold(z) => write!(f, "Z-score threshold must be > 0, got {}", z),
            Self::InvalidPeriod(p) => write!(f, "Seasonal period must be >= 2, got {}", p),
            Self::InvalidSeasonalSpan(s) => {
                write!(f, "Seasonal span must be odd and >= 3, got {}", s)
            }
            Self::InvalidFraction(v) => write!(f, "lo_frac must be in (0, 1], got {}", v),
            Self::InvalidDelta(v) => write!(f, "lo_delta must be in [0, 1), got {}", v),
            Self::InvalidIterations => write!(f, "max_iterations must be at least 1"),
            Self::InvalidTolerance(v) => write!(f, "Tolerance must be >= 0, got {}", v),
            Self::InvalidDecimation => write!(f, "recompute_every must be at least 1"),
            Self::InvalidRollingWindow(w) => {
                write!(f, "Rolling window must be at least 2, got {}", w)
            }
            Self::Io(e) => write!(f, "Failed to read configuration: {}", e),
            Self::Parse(e) => write!(f, "Failed to parse configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure of a single decomposition call
#[derive(Debug, Clone, PartialEq)]
pub enum DecompositionError {
    /// Fewer than two full seasonal periods of data
    WindowTooShort { len: usize, period: usize },
    /// NaN or infinite value in the input
    NonFiniteInput { position: usize },
    /// A refinement pass produced non-finite components
    Diverged { pass: usize },
}

impl std::fmt::Display for DecompositionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WindowTooShort { len, period } => write!(
                f,
                "Need at least {} samples for period {}, got {}",
                period * 2,
                period,
                len
            ),
            Self::NonFiniteInput { position } => {
                write!(f, "Non-finite value at window position {}", position)
            }
            Self::Diverged { pass } => {
                write!(f, "Decomposition diverged during pass {}", pass)
            }
        }
    }
}

impl std::error::Error for DecompositionError {}

/// Umbrella error for callers that mix configuration and decomposition calls
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Config(ConfigError),
    Decomposition(DecompositionError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Decomposition(e) => write!(f, "Decomposition error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Decomposition(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<DecompositionError> for Error {
    fn from(e: DecompositionError) -> Self {
        Self::Decomposition(e)
    }
}
