#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use co2mon_core::app_state::{AppError, MonitorContext};
use co2mon_core::config::MonitorConfig;
use co2mon_core::input::{Backlight, InputPoller, ScreenSelector};
use co2mon_core::sampling::SamplingLoop;
use co2mon_core::sensors::{Scd41Source, SensorSource};
use co2mon_core::ui::{DisplayWidgets, Screen, Widgets as _};
use co2mon_core::ui_refresh::UiRefreshTimer;
use co2mon_firmware::board::{
    self, Context, ControlPins, DisplayBus, Sensor, SensorBus,
};
use embassy_executor::Spawner;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, Output};
use esp_hal::timer::timg::TimerGroup;
use log::{error, info, warn};
use static_cell::StaticCell;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static CONTEXT: StaticCell<Context> = StaticCell::new();

/// Log a fatal startup error and stop.
fn fatal(err: impl Into<AppError>) -> ! {
    let err = err.into();
    error!("Startup failed: {}", err);
    panic!("{}", err);
}

#[embassy_executor::task]
async fn sampling_task(ctx: &'static Context, sensor: Sensor) {
    SamplingLoop::new(sensor, ctx).run().await
}

#[embassy_executor::task]
async fn ui_refresh_task(ctx: &'static Context) {
    UiRefreshTimer::new(ctx).run().await
}

#[embassy_executor::task]
async fn power_button_task(ctx: &'static Context, pin: Input<'static>, backlight: Output<'static>) {
    let backlight = match Backlight::new(backlight) {
        Ok(backlight) => backlight,
        Err(e) => match e {},
    };
    InputPoller::new(
        pin,
        backlight,
        ctx.config.debounce,
        ctx.config.button_poll_period,
    )
    .run()
    .await
}

#[embassy_executor::task]
async fn next_button_task(ctx: &'static Context, pin: Input<'static>) {
    InputPoller::new(
        pin,
        ScreenSelector::from_context(ctx),
        ctx.config.debounce,
        ctx.config.button_poll_period,
    )
    .run()
    .await
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized");

    let i2c = board::init_sensor_bus(SensorBus {
        i2c: peripherals.I2C0,
        sda: peripherals.GPIO21,
        scl: peripherals.GPIO22,
    })
    .unwrap_or_else(|e| fatal(e));

    let mut sensor = Scd41Source::new(i2c);
    if let Err(e) = sensor.start().await {
        fatal(e);
    }

    let display = board::init_display(DisplayBus {
        spi: peripherals.SPI2,
        sck: peripherals.GPIO18,
        mosi: peripherals.GPIO23,
        cs: peripherals.GPIO5,
        dc: peripherals.GPIO16,
        rst: peripherals.GPIO17,
    })
    .unwrap_or_else(|e| fatal(e));

    let (backlight, power_button, next_button) = board::init_controls(ControlPins {
        backlight: peripherals.GPIO4,
        power_button: peripherals.GPIO32,
        next_button: peripherals.GPIO33,
    });

    let ctx: &'static Context = CONTEXT.init(MonitorContext::new(
        MonitorConfig::default(),
        DisplayWidgets::new(display),
    ));

    if let Some(mut ui) = ctx.ui.try_acquire()
        && let Err(e) = ui.load_screen(Screen::Readings)
    {
        warn!("Initial screen draw failed: {:?}", e);
    }

    spawner.spawn(sampling_task(ctx, sensor)).unwrap();
    spawner.spawn(ui_refresh_task(ctx)).unwrap();
    spawner
        .spawn(power_button_task(ctx, power_button, backlight))
        .unwrap();
    spawner.spawn(next_button_task(ctx, next_button)).unwrap();

    info!("co2mon running");

    loop {
        embassy_time::Timer::after(embassy_time::Duration::from_secs(60)).await;
    }
}
