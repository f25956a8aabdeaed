//! Metrics and quality assessment for sensor data
//!
//! This module names the quantities the SCD41 reports and provides quality
//! level assessment used to colour readings on screen.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::WebColors;

/// A quantity reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Co2,
    Temperature,
    Humidity,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Co2, Metric::Temperature, Metric::Humidity];

    /// Position of this metric in per-metric arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Co2 => 0,
            Self::Temperature => 1,
            Self::Humidity => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Co2 => "CO2",
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Co2 => "ppm",
            Self::Temperature => "°C",
            Self::Humidity => "%",
        }
    }
}

/// Quality level assessment for sensor readings
///
/// Provides standardized quality ratings based on configurable thresholds.
/// Used primarily for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityLevel {
    /// Optimal conditions
    Excellent,
    /// Acceptable conditions
    Good,
    /// Sub-optimal conditions
    Poor,
    /// Problematic conditions
    Bad,
}

impl QualityLevel {
    /// Assess quality level for a given sensor reading
    ///
    /// Values are in the same units as the metric (ppm, °C, %RH).
    pub fn assess(metric: Metric, value: f32) -> Self {
        match metric {
            Metric::Co2 => {
                // CO2 thresholds (ppm)
                // Excellent: below 800 (well ventilated)
                // Good: below 1000
                // Poor: below 1500 (ventilation recommended)
                // Bad: anything above
                if value < 800.0 {
                    Self::Excellent
                } else if value < 1000.0 {
                    Self::Good
                } else if value < 1500.0 {
                    Self::Poor
                } else {
                    Self::Bad
                }
            }
            Metric::Temperature => {
                // Temperature quality thresholds (°C)
                // Excellent: 20-24°C (comfortable indoor range)
                // Good: 18-26°C (acceptable range)
                // Poor: 15-28°C (uncomfortable but tolerable)
                if (20.0..=24.0).contains(&value) {
                    Self::Excellent
                } else if (18.0..=26.0).contains(&value) {
                    Self::Good
                } else if (15.0..=28.0).contains(&value) {
                    Self::Poor
                } else {
                    Self::Bad
                }
            }
            Metric::Humidity => {
                // Humidity quality thresholds (%)
                // Excellent: 40-60% (optimal indoor humidity)
                // Good: 30-70% (acceptable range)
                // Poor: 20-80% (uncomfortable but tolerable)
                if (40.0..=60.0).contains(&value) {
                    Self::Excellent
                } else if (30.0..=70.0).contains(&value) {
                    Self::Good
                } else if (20.0..=80.0).contains(&value) {
                    Self::Poor
                } else {
                    Self::Bad
                }
            }
        }
    }

    /// Get the display color for this quality level
    pub const fn color(self) -> Rgb565 {
        match self {
            Self::Excellent => Rgb565::CSS_GREEN,
            Self::Good => Rgb565::CSS_LIGHT_GREEN,
            Self::Poor => Rgb565::CSS_ORANGE,
            Self::Bad => Rgb565::CSS_RED,
        }
    }
}
