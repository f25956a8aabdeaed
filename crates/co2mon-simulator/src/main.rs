//! Desktop simulator for the co2mon UI.
//!
//! Runs the same sampling loop, UI refresh timer and button pollers as the
//! firmware, against a synthetic sensor and an SDL2 window provided by
//! `embedded-graphics-simulator`.
//!
//! # Key bindings
//!
//! | Key | Action                          |
//! |-----|---------------------------------|
//! | P   | Power button (toggle backlight) |
//! | N   | Next-screen button              |
//! | Q   | Quit                            |
//!
//! Keys act as the physical buttons: they are pressed while held, so a tap
//! shorter than the debounce window is ignored just like on the device.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::{Duration as StdDuration, Instant as StdInstant};

use embassy_futures::block_on;
use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use log::{info, warn};

use co2mon_core::app_state::MonitorContext;
use co2mon_core::config::MonitorConfig;
use co2mon_core::input::{Backlight, InputPoller, ScreenSelector};
use co2mon_core::sampling::SamplingLoop;
use co2mon_core::sensors::{SensorSource, SyntheticSensor};
use co2mon_core::ui::layout::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use co2mon_core::ui::{DisplayWidgets, Screen, Widgets};
use co2mon_core::ui_refresh::UiRefreshTimer;

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: StdDuration = StdDuration::from_millis(33);

/// Sensor period used by the simulator so charts fill in a minute.
const SIMULATED_SAMPLE_PERIOD: Duration = Duration::from_secs(1);

type SimWidgets = DisplayWidgets<SimulatorDisplay<Rgb565>>;

/// Button level driven by SDL key events. Reads low while the key is held.
#[derive(Clone, Default)]
struct KeyButton {
    held: Rc<Cell<bool>>,
}

impl ErrorType for KeyButton {
    type Error = Infallible;
}

impl InputPin for KeyButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.held.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.held.get())
    }
}

/// Backlight enable line. The window goes dark while it is low.
#[derive(Clone, Default)]
struct SimBacklight {
    on: Rc<Cell<bool>>,
}

impl ErrorType for SimBacklight {
    type Error = Infallible;
}

impl OutputPin for SimBacklight {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.on.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.on.set(true);
        Ok(())
    }
}

/// Fires `action` whenever at least `period` has passed since the last call.
struct Interval {
    period: StdDuration,
    last: StdInstant,
}

impl Interval {
    fn new(period: Duration) -> Self {
        Self {
            period: StdDuration::from_millis(period.as_millis()),
            last: StdInstant::now(),
        }
    }

    fn elapsed(&mut self) -> bool {
        if self.last.elapsed() >= self.period {
            self.last = StdInstant::now();
            true
        } else {
            false
        }
    }
}

fn main() {
    env_logger::init();
    info!("Starting co2mon simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: P=Backlight  N=Next screen  Q=Quit");

    let config = MonitorConfig::default().with_sample_period(SIMULATED_SAMPLE_PERIOD);
    let display = SimulatorDisplay::<Rgb565>::new(Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX));
    let ctx: MonitorContext<SimWidgets> = MonitorContext::new(config, DisplayWidgets::new(display));

    let mut sensor = SyntheticSensor::new(SIMULATED_SAMPLE_PERIOD);
    if let Err(e) = block_on(sensor.start()) {
        log::error!("Sensor start failed: {}", e);
        return;
    }
    let mut sampling = SamplingLoop::new(sensor, &ctx);
    let refresh = UiRefreshTimer::new(&ctx);

    let power_key = KeyButton::default();
    let next_key = KeyButton::default();
    let backlight_line = SimBacklight::default();

    let backlight = match Backlight::new(backlight_line.clone()) {
        Ok(backlight) => backlight,
        Err(e) => match e {},
    };
    let mut power_button = InputPoller::new(
        power_key.clone(),
        backlight,
        config.debounce,
        config.button_poll_period,
    );
    let mut next_button = InputPoller::new(
        next_key.clone(),
        ScreenSelector::from_context(&ctx),
        config.debounce,
        config.button_poll_period,
    );

    if let Some(mut ui) = ctx.ui.try_acquire()
        && let Err(e) = ui.load_screen(Screen::Readings)
    {
        warn!("Initial draw failed: {:?}", e);
    }

    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("co2mon Simulator", &output_settings);
    let dark = SimulatorDisplay::<Rgb565>::new(Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX));

    let mut sample_tick = Interval::new(config.sample_period);
    let mut refresh_tick = Interval::new(config.ui_refresh_period);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    if let Some(ui) = ctx.ui.try_acquire() {
        window.update(ui.display());
    }

    'running: loop {
        let frame_start = StdInstant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::P => power_key.held.set(true),
                    Keycode::N => next_key.held.set(true),
                    _ => {}
                },
                SimulatorEvent::KeyUp { keycode, .. } => match keycode {
                    Keycode::P => power_key.held.set(false),
                    Keycode::N => next_key.held.set(false),
                    _ => {}
                },
                _ => {}
            }
        }

        // One frame is longer than the button poll period, so poll every frame
        let now = Instant::now();
        block_on(power_button.poll_once(now));
        block_on(next_button.poll_once(now));

        if sample_tick.elapsed() {
            block_on(sampling.run_cycle());
        }
        if refresh_tick.elapsed() {
            block_on(refresh.refresh_once());
        }

        if backlight_line.on.get() {
            if let Some(ui) = ctx.ui.try_acquire() {
                window.update(ui.display());
            }
        } else {
            window.update(&dark);
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting");
}
