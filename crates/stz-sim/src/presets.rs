//! Named generator configurations

use crate::generator::GeneratorConfig;
use crate::signal::TrendShape;

/// Logarithmic growth with a long season and moderate noise
pub fn logarithmic_growth() -> GeneratorConfig {
    GeneratorConfig {
        trend: TrendShape::Logarithmic {
            amplitude: 10.0,
            scale: 200.0,
        },
        seasonal_amplitude: 10.0,
        period: 200,
        noise_std: 1.0,
        anomaly_magnitude: 15.0,
        ..GeneratorConfig::default()
    }
}

/// Slow linear drift under a 100-sample season, noisier
pub fn linear_drift() -> GeneratorConfig {
    GeneratorConfig {
        trend: TrendShape::Linear { slope: 0.01 },
        seasonal_amplitude: 10.0,
        period: 100,
        noise_std: 2.0,
        anomaly_magnitude: 30.0,
        ..GeneratorConfig::default()
    }
}

/// Noiseless sine with nothing injected
pub fn pure_sine() -> GeneratorConfig {
    GeneratorConfig {
        num: 500,
        anomaly_fraction: 0.0,
        trend: TrendShape::Flat,
        seasonal_amplitude: 10.0,
        period: 100,
        noise_std: 0.0,
        ..GeneratorConfig::default()
    }
}

pub fn create_preset(name: &str) -> Option<GeneratorConfig> {
    match name.to_lowercase().as_str() {
        "logarithmic_growth" | "log" => Some(logarithmic_growth()),
        "linear_drift" | "linear" => Some(linear_drift()),
        "pure_sine" | "sine" => Some(pure_sine()),
        _ => None,
    }
}

pub fn list_presets() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "logarithmic_growth",
            "Log trend, period 200, noise 1, offset 15",
        ),
        (
            "linear_drift",
            "Linear trend 0.01/sample, period 100, noise 2, offset 30",
        ),
        ("pure_sine", "Clean sine, period 100, no anomalies"),
    ]
}
