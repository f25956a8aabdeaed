//! Application-wide state and error types for co2mon

mod sensor_state;

pub use sensor_state::*;

use thiserror_no_std::Error;

use crate::config::{HISTORY_CAPACITY, MonitorConfig};
use crate::sensors::SensorError;
use crate::ui::{UiLock, Widgets};

/// A bounded lock acquisition gave up.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("timed out waiting for the {resource} lock")]
pub struct LockTimeout {
    pub resource: &'static str,
}

impl LockTimeout {
    pub const fn new(resource: &'static str) -> Self {
        Self { resource }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Initialization failed: {0}")]
    Init(heapless::String<64>),
    #[error("Sensor error: {0}")]
    Sensor(SensorError),
    #[error("Display error: {0}")]
    Display(heapless::String<64>),
}

impl From<SensorError> for AppError {
    fn from(value: SensorError) -> Self {
        match value {
            SensorError::InitializationFailed { sensor, details } => {
                let mut message = heapless::String::new();
                // Truncation on overflow is acceptable for a log message
                let _ = core::fmt::Write::write_fmt(
                    &mut message,
                    format_args!("{}: {}", sensor, details),
                );
                Self::Init(message)
            }
            other => Self::Sensor(other),
        }
    }
}

/// Everything the long-running tasks share.
///
/// Created once by the startup routine (typically in a `StaticCell`) and
/// handed to every task by reference at spawn time.
pub struct MonitorContext<W: Widgets, const N: usize = HISTORY_CAPACITY> {
    pub config: MonitorConfig,
    pub sensor_state: SharedSensorState<N>,
    pub ui: UiLock<W>,
}

impl<W: Widgets, const N: usize> MonitorContext<W, N> {
    pub const fn new(config: MonitorConfig, widgets: W) -> Self {
        Self {
            config,
            sensor_state: SharedSensorState::new(),
            ui: UiLock::new(widgets),
        }
    }
}
