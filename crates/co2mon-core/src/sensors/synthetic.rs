use embassy_time::{Duration, Instant};
use log::{debug, info};
use micromath::F32Ext;

use super::{MeasurementCadence, Reading, SensorError, SensorSource};

const SENSOR_NAME: &str = "synthetic";

/// Generates smooth, deterministic readings on a fixed cadence.
///
/// Behaves like a sensor in periodic mode: one value per period, `NotReady`
/// in between. Used by the desktop simulator and by tests that need a
/// source without hardware.
pub struct SyntheticSensor {
    cadence: MeasurementCadence,
    /// Number of readings produced so far, drives the waveforms.
    produced: u32,
    /// Remaining due reads that should fail as bus errors.
    failures_pending: u8,
    started: bool,
}

impl SyntheticSensor {
    pub const fn new(period: Duration) -> Self {
        Self {
            cadence: MeasurementCadence::new(period),
            produced: 0,
            failures_pending: 0,
            started: false,
        }
    }

    /// Make the next `count` due reads fail with [`SensorError::ReadFailed`].
    pub fn fail_next(&mut self, count: u8) {
        self.failures_pending = count;
    }

    pub fn start_at(&mut self, now: Instant) {
        self.cadence.start(now);
        self.started = true;
        info!("Synthetic sensor started, period {} ms", self.cadence.period().as_millis());
    }

    pub fn try_read_at(&mut self, now: Instant) -> Result<Reading, SensorError> {
        if !self.started {
            return Err(SensorError::ReadFailed {
                sensor: SENSOR_NAME,
                operation: "read measurement",
                details: "periodic measurement not started",
            });
        }

        if !self.cadence.poll(now) {
            return Err(SensorError::NotReady {
                sensor: SENSOR_NAME,
            });
        }

        if self.failures_pending > 0 {
            self.failures_pending -= 1;
            return Err(SensorError::ReadFailed {
                sensor: SENSOR_NAME,
                operation: "read measurement",
                details: "injected bus error",
            });
        }

        let reading = Self::waveform(self.produced, self.cadence.period());
        self.produced = self.produced.wrapping_add(1);
        debug!("Synthetic reading #{}: {:?}", self.produced, reading);
        Ok(reading)
    }

    /// Reading number `index` of a sensor sampling every `period`.
    fn waveform(index: u32, period: Duration) -> Reading {
        let t = index as f32 * period.as_millis() as f32 / 1000.0;

        // CO2: 450–1350 ppm with a slow occupancy cycle
        let co2 = 900.0 + 400.0 * (t / 300.0).sin() + 40.0 * (t / 41.0).sin();

        // Temperature: 20–26 °C sinusoidal with slow drift
        let temperature = 23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos();

        // Humidity: 40–60 % with different period
        let humidity = 50.0 + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos();

        Reading::new(co2 as u16, temperature, humidity)
    }
}

impl SensorSource for SyntheticSensor {
    async fn start(&mut self) -> Result<(), SensorError> {
        self.start_at(Instant::now());
        Ok(())
    }

    async fn try_read(&mut self) -> Result<Reading, SensorError> {
        self.try_read_at(Instant::now())
    }
}
