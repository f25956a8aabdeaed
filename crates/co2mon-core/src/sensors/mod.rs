//! Sensor abstraction
//!
//! A [`SensorSource`] is started once and then probed periodically with
//! [`SensorSource::try_read`]. Probing never blocks waiting for a fresh
//! measurement: a source with nothing new answers [`SensorError::NotReady`].

pub mod cadence;
#[cfg(feature = "sensor-scd41")]
mod scd41;
mod synthetic;

pub use cadence::MeasurementCadence;
#[cfg(feature = "sensor-scd41")]
pub use scd41::Scd41Source;
pub use synthetic::SyntheticSensor;

use thiserror_no_std::Error;

use crate::metrics::Metric;

/// One measurement of CO2, temperature and relative humidity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub co2_ppm: u16,
    /// Degrees Celsius
    pub temperature: f32,
    /// Percent relative humidity
    pub humidity: f32,
    /// `false` only for the placeholder that fills never-written slots
    pub data_ready: bool,
}

impl Reading {
    /// Zero-valued placeholder used before the first measurement arrives.
    pub const EMPTY: Reading = Reading {
        co2_ppm: 0,
        temperature: 0.0,
        humidity: 0.0,
        data_ready: false,
    };

    pub const fn new(co2_ppm: u16, temperature: f32, humidity: f32) -> Self {
        Self {
            co2_ppm,
            temperature,
            humidity,
            data_ready: true,
        }
    }

    /// Scalar value of one metric.
    pub fn value(&self, metric: Metric) -> f32 {
        match metric {
            Metric::Co2 => self.co2_ppm as f32,
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
        }
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} failed to initialize: {details}")]
    InitializationFailed {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor} failed to {operation}: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor} has no new measurement yet")]
    NotReady { sensor: &'static str },
}

impl SensorError {
    /// `NotReady` is part of normal operation, everything else is a fault.
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady { .. })
    }
}

/// Trait for sensors that produce [`Reading`]s on their own cadence.
pub trait SensorSource {
    /// Put the sensor into continuous measurement mode.
    fn start(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Fetch the next measurement if one is available.
    ///
    /// Returns [`SensorError::NotReady`] when the sensor has produced nothing
    /// since the previous successful read.
    fn try_read(&mut self) -> impl Future<Output = Result<Reading, SensorError>>;
}

impl<S: SensorSource> SensorSource for &mut S {
    fn start(&mut self) -> impl Future<Output = Result<(), SensorError>> {
        (**self).start()
    }

    fn try_read(&mut self) -> impl Future<Output = Result<Reading, SensorError>> {
        (**self).try_read()
    }
}
