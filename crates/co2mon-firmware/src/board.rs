//! Board wiring and peripheral bring-up
//!
//! Pin assignments for the ESP32 dev board:
//!
//! | Function           | Pin    |
//! |--------------------|--------|
//! | SCD41 SDA / SCL    | 21, 22 |
//! | ST7789 MOSI / SCLK | 23, 18 |
//! | ST7789 CS / DC     | 5, 16  |
//! | ST7789 RST         | 17     |
//! | Backlight enable   | 4      |
//! | Power button       | 32     |
//! | Next-screen button | 33     |
//!
//! Buttons are wired to ground with the internal pull-ups enabled.

use co2mon_core::app_state::{AppError, MonitorContext};
use co2mon_core::config::{DISPLAY_SPI_FREQUENCY_MHZ, SENSOR_I2C_FREQUENCY_KHZ};
use co2mon_core::sensors::Scd41Source;
use co2mon_core::ui::DisplayWidgets;
use co2mon_core::ui::layout::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use esp_hal::Async;
use esp_hal::Blocking;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::peripherals::{
    GPIO4, GPIO5, GPIO16, GPIO17, GPIO18, GPIO21, GPIO22, GPIO23, GPIO32, GPIO33, I2C0, SPI2,
};
use esp_hal::spi::Mode;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::Rate;
use log::info;
use mipidsi::interface::SpiInterface;
use mipidsi::models::ST7789;
use mipidsi::options::{ColorInversion, Orientation, Rotation};
use mipidsi::{Builder as MipidsiBuilder, Display};
use static_cell::StaticCell;
use thiserror_no_std::Error;

/// Size of the SPI batching buffer handed to the display interface
const SPI_BUFFER_SIZE: usize = 512;

/// Native panel resolution before rotation
const PANEL_WIDTH: u16 = DISPLAY_HEIGHT_PX as u16;
const PANEL_HEIGHT: u16 = DISPLAY_WIDTH_PX as u16;

pub type SensorI2c = I2c<'static, Async>;
pub type Sensor = Scd41Source<SensorI2c>;

type PanelSpi = ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, NoDelay>;
pub type Panel = Display<SpiInterface<'static, PanelSpi, Output<'static>>, ST7789, Output<'static>>;

pub type Widgets = DisplayWidgets<Panel>;
pub type Context = MonitorContext<Widgets>;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("I2C bus configuration rejected")]
    I2cConfig,
    #[error("SPI bus configuration rejected")]
    SpiConfig,
    #[error("SPI device setup failed")]
    SpiDevice,
    #[error("display controller did not initialize")]
    Display,
}

impl From<BoardError> for AppError {
    fn from(value: BoardError) -> Self {
        let mut message = heapless::String::new();
        let _ = core::fmt::Write::write_fmt(&mut message, format_args!("{}", value));
        match value {
            BoardError::Display => AppError::Display(message),
            _ => AppError::Init(message),
        }
    }
}

/// SCD41 bus wiring
pub struct SensorBus {
    pub i2c: I2C0<'static>,
    pub sda: GPIO21<'static>,
    pub scl: GPIO22<'static>,
}

/// ST7789 wiring
pub struct DisplayBus {
    pub spi: SPI2<'static>,
    pub sck: GPIO18<'static>,
    pub mosi: GPIO23<'static>,
    pub cs: GPIO5<'static>,
    pub dc: GPIO16<'static>,
    pub rst: GPIO17<'static>,
}

/// Buttons and backlight
pub struct ControlPins {
    pub backlight: GPIO4<'static>,
    pub power_button: GPIO32<'static>,
    pub next_button: GPIO33<'static>,
}

/// Sensor bus at 100 kHz in async mode.
pub fn init_sensor_bus(bus: SensorBus) -> Result<SensorI2c, BoardError> {
    let config = I2cConfig::default().with_frequency(Rate::from_khz(SENSOR_I2C_FREQUENCY_KHZ));
    let i2c = I2c::new(bus.i2c, config)
        .map_err(|_| BoardError::I2cConfig)?
        .with_sda(bus.sda)
        .with_scl(bus.scl)
        .into_async();
    info!("I2C bus ready at {} kHz", SENSOR_I2C_FREQUENCY_KHZ);
    Ok(i2c)
}

/// ST7789 over SPI at 40 MHz, rotated to 320x240 landscape.
pub fn init_display(bus: DisplayBus) -> Result<Panel, BoardError> {
    let config = SpiConfig::default()
        .with_frequency(Rate::from_mhz(DISPLAY_SPI_FREQUENCY_MHZ))
        .with_mode(Mode::_0);
    let spi_bus = Spi::new(bus.spi, config)
        .map_err(|_| BoardError::SpiConfig)?
        .with_sck(bus.sck)
        .with_mosi(bus.mosi);

    let cs = Output::new(bus.cs, Level::High, OutputConfig::default());
    let spi_device =
        ExclusiveDevice::new_no_delay(spi_bus, cs).map_err(|_| BoardError::SpiDevice)?;

    let dc = Output::new(bus.dc, Level::Low, OutputConfig::default());
    let rst = Output::new(bus.rst, Level::High, OutputConfig::default());

    static SPI_BUFFER: StaticCell<[u8; SPI_BUFFER_SIZE]> = StaticCell::new();
    let buffer = SPI_BUFFER.init([0u8; SPI_BUFFER_SIZE]);
    let di = SpiInterface::new(spi_device, dc, buffer);

    let mut display = MipidsiBuilder::new(ST7789, di)
        .display_size(PANEL_WIDTH, PANEL_HEIGHT)
        .orientation(Orientation::new().rotate(Rotation::Deg90))
        .invert_colors(ColorInversion::Inverted)
        .reset_pin(rst)
        .init(&mut embassy_time::Delay)
        .map_err(|_| BoardError::Display)?;

    display
        .clear(Rgb565::BLACK)
        .map_err(|_| BoardError::Display)?;

    info!("Display initialized");
    Ok(display)
}

/// Split the control pins into (backlight output, power button, next button).
///
/// The backlight starts low; [`co2mon_core::input::Backlight`] switches it on.
pub fn init_controls(pins: ControlPins) -> (Output<'static>, Input<'static>, Input<'static>) {
    let buttons = InputConfig::default().with_pull(Pull::Up);
    (
        Output::new(pins.backlight, Level::Low, OutputConfig::default()),
        Input::new(pins.power_button, buttons),
        Input::new(pins.next_button, buttons),
    )
}
