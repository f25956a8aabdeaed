use core::fmt::Debug;

use embassy_time::{Duration, Instant, with_timeout};
use embedded_hal_async::i2c::I2c;
use libscd::asynchronous::scd4x::Scd4x;
use log::{debug, error, info, warn};

use super::{MeasurementCadence, Reading, SensorError, SensorSource};
use crate::config::{SENSOR_COMMAND_TIMEOUT_MS, SENSOR_MEASUREMENT_PERIOD_MS};

const SENSOR_NAME: &str = "SCD41";

const COMMAND_TIMEOUT: Duration = Duration::from_millis(SENSOR_COMMAND_TIMEOUT_MS);

/// Run one driver command, mapping bus errors and a stalled bus to
/// [`SensorError::ReadFailed`].
async fn command<T, E: Debug>(
    operation: &'static str,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, SensorError> {
    match with_timeout(COMMAND_TIMEOUT, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!("SCD41 {} failed: {:?}", operation, e);
            Err(SensorError::ReadFailed {
                sensor: SENSOR_NAME,
                operation,
                details: "I2C communication error",
            })
        }
        Err(_) => {
            warn!("SCD41 {} timed out", operation);
            Err(SensorError::ReadFailed {
                sensor: SENSOR_NAME,
                operation,
                details: "command timed out",
            })
        }
    }
}

/// SCD41 in periodic measurement mode.
///
/// The sensor publishes one CO2/temperature/humidity triple every 5 seconds.
/// `try_read` asks the bus for the data-ready flag only once a period has
/// elapsed since the last successful read.
pub struct Scd41Source<I> {
    sensor: Scd4x<I, embassy_time::Delay>,
    cadence: MeasurementCadence,
}

impl<I: I2c> Scd41Source<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            sensor: Scd4x::new(i2c, embassy_time::Delay),
            cadence: MeasurementCadence::new(Duration::from_millis(SENSOR_MEASUREMENT_PERIOD_MS)),
        }
    }

    /// [`SensorSource::try_read`] against an explicit clock.
    pub async fn try_read_at(&mut self, now: Instant) -> Result<Reading, SensorError> {
        if !self.cadence.is_due(now) {
            return Err(SensorError::NotReady {
                sensor: SENSOR_NAME,
            });
        }

        let ready = command("check data ready status", self.sensor.data_ready()).await?;

        if !ready {
            // Sensor clock drifts slightly against ours, try again next cycle
            return Err(SensorError::NotReady {
                sensor: SENSOR_NAME,
            });
        }

        let measurement = command("read measurement", self.sensor.read_measurement()).await?;

        self.cadence.consume(now);

        Ok(Reading::new(
            measurement.co2,
            measurement.temperature,
            measurement.humidity,
        ))
    }
}

impl<I: I2c> SensorSource for Scd41Source<I> {
    async fn start(&mut self) -> Result<(), SensorError> {
        // Stop any ongoing measurement first, the sensor ignores most
        // commands while measuring. Fails harmlessly after a cold boot.
        if let Err(e) = self.sensor.stop_periodic_measurement().await {
            debug!("SCD41: stop_periodic_measurement ignored: {:?}", e);
        }

        self.sensor
            .start_periodic_measurement()
            .await
            .map_err(|e| {
                error!("SCD41 start_periodic_measurement failed: {:?}", e);
                SensorError::InitializationFailed {
                    sensor: SENSOR_NAME,
                    details: "Failed to start periodic measurement",
                }
            })?;

        self.cadence.start(Instant::now());
        info!("SCD41: Periodic measurement started");

        Ok(())
    }

    async fn try_read(&mut self) -> Result<Reading, SensorError> {
        self.try_read_at(Instant::now()).await
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::RefCell;
    use embassy_futures::block_on;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, Operation, SevenBitAddress};
    use std::rc::Rc;
    use std::vec::Vec;

    const STOP_PERIODIC: u16 = 0x3f86;
    const START_PERIODIC: u16 = 0x21b1;
    const DATA_READY: u16 = 0xe4b8;
    const READ_MEASUREMENT: u16 = 0xec05;

    const PERIOD: Duration = Duration::from_millis(SENSOR_MEASUREMENT_PERIOD_MS);

    /// Sensirion CRC-8, polynomial 0x31, init 0xff.
    fn crc8(bytes: &[u8]) -> u8 {
        let mut crc = 0xffu8;
        for byte in bytes {
            crc ^= byte;
            for _ in 0..8 {
                crc = if crc & 0x80 != 0 {
                    (crc << 1) ^ 0x31
                } else {
                    crc << 1
                };
            }
        }
        crc
    }

    #[derive(Default)]
    struct BusScript {
        /// Every command word written, in order
        commands: Vec<u16>,
        last_command: Option<u16>,
        data_ready: bool,
        /// Raw CO2, temperature and humidity words
        measurement: [u16; 3],
        failing: Option<u16>,
        stalled: Option<u16>,
    }

    impl BusScript {
        fn response(&self) -> Vec<u16> {
            match self.last_command {
                Some(DATA_READY) => std::vec![if self.data_ready { 0x8006 } else { 0x8000 }],
                Some(READ_MEASUREMENT) => self.measurement.to_vec(),
                _ => Vec::new(),
            }
        }
    }

    /// I2C bus answering SCD41 commands from a shared script.
    #[derive(Clone, Default)]
    struct ScriptedBus {
        script: Rc<RefCell<BusScript>>,
    }

    impl ScriptedBus {
        fn ready_with(co2: u16, temperature_raw: u16, humidity_raw: u16) -> Self {
            let bus = Self::default();
            {
                let mut script = bus.script.borrow_mut();
                script.data_ready = true;
                script.measurement = [co2, temperature_raw, humidity_raw];
            }
            bus
        }

        fn commands(&self) -> Vec<u16> {
            self.script.borrow().commands.clone()
        }

        fn set_data_ready(&self, ready: bool) {
            self.script.borrow_mut().data_ready = ready;
        }

        fn fail_on(&self, command: u16) {
            self.script.borrow_mut().failing = Some(command);
        }

        fn stall_on(&self, command: u16) {
            self.script.borrow_mut().stalled = Some(command);
        }
    }

    impl ErrorType for ScriptedBus {
        type Error = ErrorKind;
    }

    impl I2c for ScriptedBus {
        async fn transaction(
            &mut self,
            _address: SevenBitAddress,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for operation in operations.iter_mut() {
                match operation {
                    Operation::Write(bytes) if bytes.len() >= 2 => {
                        let command = u16::from_be_bytes([bytes[0], bytes[1]]);
                        let (failing, stalled) = {
                            let mut script = self.script.borrow_mut();
                            script.commands.push(command);
                            script.last_command = Some(command);
                            (script.failing, script.stalled)
                        };
                        if stalled == Some(command) {
                            core::future::pending::<()>().await;
                        }
                        if failing == Some(command) {
                            return Err(ErrorKind::Other);
                        }
                    }
                    Operation::Write(_) => {}
                    Operation::Read(buffer) => {
                        let words = self.script.borrow().response();
                        for (chunk, word) in buffer.chunks_mut(3).zip(words) {
                            let bytes = word.to_be_bytes();
                            let crc = crc8(&bytes);
                            for (slot, byte) in chunk.iter_mut().zip([bytes[0], bytes[1], crc]) {
                                *slot = byte;
                            }
                        }
                    }
                }
            }
            Ok(())
        }
    }

    /// 400 ppm, about 25.0 °C and 50.0 %RH
    fn healthy_bus() -> ScriptedBus {
        ScriptedBus::ready_with(400, 0x6667, 0x8000)
    }

    fn started(bus: &ScriptedBus) -> (Scd41Source<ScriptedBus>, Instant) {
        let mut sensor = Scd41Source::new(bus.clone());
        block_on(sensor.start()).unwrap();
        (sensor, Instant::now())
    }

    #[test]
    fn test_crc_matches_datasheet_example() {
        assert_eq!(crc8(&[0xbe, 0xef]), 0x92);
    }

    #[test]
    fn test_start_stops_then_starts_periodic_measurement() {
        let bus = healthy_bus();
        let (_sensor, _) = started(&bus);

        let commands = bus.commands();
        let stop = commands.iter().position(|c| *c == STOP_PERIODIC);
        let start = commands.iter().position(|c| *c == START_PERIODIC);
        assert!(matches!((stop, start), (Some(stop), Some(start)) if stop < start));
    }

    #[test]
    fn test_start_ignores_failed_stop() {
        let bus = healthy_bus();
        bus.fail_on(STOP_PERIODIC);
        let mut sensor = Scd41Source::new(bus.clone());

        assert_eq!(block_on(sensor.start()), Ok(()));
        assert!(bus.commands().contains(&START_PERIODIC));
    }

    #[test]
    fn test_failed_start_is_an_initialization_error() {
        let bus = healthy_bus();
        bus.fail_on(START_PERIODIC);
        let mut sensor = Scd41Source::new(bus.clone());

        assert!(matches!(
            block_on(sensor.start()),
            Err(SensorError::InitializationFailed { sensor: "SCD41", .. })
        ));
    }

    #[test]
    fn test_read_before_period_does_not_touch_bus() {
        let bus = healthy_bus();
        let (mut sensor, started_at) = started(&bus);
        let commands_after_start = bus.commands().len();

        let result = block_on(sensor.try_read_at(started_at));
        assert!(result.unwrap_err().is_not_ready());
        assert_eq!(bus.commands().len(), commands_after_start);
    }

    #[test]
    fn test_read_after_period_decodes_measurement() {
        let bus = healthy_bus();
        let (mut sensor, started_at) = started(&bus);

        let reading = block_on(sensor.try_read_at(started_at + PERIOD)).unwrap();
        assert_eq!(reading.co2_ppm, 400);
        assert!((reading.temperature - 25.0).abs() < 0.05);
        assert!((reading.humidity - 50.0).abs() < 0.05);
        assert!(reading.data_ready);

        let commands = bus.commands();
        assert!(commands.contains(&DATA_READY));
        assert!(commands.contains(&READ_MEASUREMENT));

        // Same period again: answered locally
        let result = block_on(sensor.try_read_at(started_at + PERIOD));
        assert!(result.unwrap_err().is_not_ready());
        assert_eq!(bus.commands().len(), commands.len());
    }

    #[test]
    fn test_data_not_ready_keeps_period_open() {
        let bus = healthy_bus();
        bus.set_data_ready(false);
        let (mut sensor, started_at) = started(&bus);
        let due = started_at + PERIOD;

        let result = block_on(sensor.try_read_at(due));
        assert!(result.unwrap_err().is_not_ready());
        assert!(!bus.commands().contains(&READ_MEASUREMENT));

        bus.set_data_ready(true);
        let reading = block_on(sensor.try_read_at(due + Duration::from_millis(200))).unwrap();
        assert_eq!(reading.co2_ppm, 400);
    }

    #[test]
    fn test_bus_error_is_a_read_failure() {
        let bus = healthy_bus();
        let (mut sensor, started_at) = started(&bus);
        bus.fail_on(READ_MEASUREMENT);

        let err = block_on(sensor.try_read_at(started_at + PERIOD)).unwrap_err();
        assert_eq!(
            err,
            SensorError::ReadFailed {
                sensor: "SCD41",
                operation: "read measurement",
                details: "I2C communication error",
            }
        );
    }

    #[test]
    fn test_stalled_bus_times_out() {
        let bus = healthy_bus();
        let (mut sensor, started_at) = started(&bus);
        bus.stall_on(DATA_READY);

        let err = block_on(sensor.try_read_at(started_at + PERIOD)).unwrap_err();
        assert_eq!(
            err,
            SensorError::ReadFailed {
                sensor: "SCD41",
                operation: "check data ready status",
                details: "command timed out",
            }
        );
    }
}
