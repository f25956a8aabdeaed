//! Timing, capacity and behaviour configuration
//!
//! Compile-time constants describe the fixed parts of the design (buffer
//! capacity, bus speeds). [`MonitorConfig`] carries the values the tasks
//! read at runtime so the simulator and tests can shorten or stretch them.

use embassy_time::Duration;

use crate::stats::StatsWindow;

/// Number of readings kept in the history ring buffer.
pub const HISTORY_CAPACITY: usize = 12;

/// The SCD41 produces a new measurement every 5 seconds in periodic mode.
pub const SENSOR_MEASUREMENT_PERIOD_MS: u64 = 5000;

/// I2C bus frequency used for the sensor.
pub const SENSOR_I2C_FREQUENCY_KHZ: u32 = 100;

/// Timeout applied to a single sensor command on the bus.
pub const SENSOR_COMMAND_TIMEOUT_MS: u64 = 1000;

/// SPI pixel clock for the panel.
pub const DISPLAY_SPI_FREQUENCY_MHZ: u32 = 40;

/// Maximum number of screens the next-screen button cycles through.
pub const MAX_SCREENS: usize = 4;

/// Runtime configuration shared by every task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    /// Period of the sampling loop. Must not be shorter than the sensor's own
    /// measurement period.
    pub sample_period: Duration,
    /// Bounded wait used by the sampling loop on the shared state lock.
    pub state_lock_timeout: Duration,
    /// Bounded wait used by the sampling loop on the UI lock when charting.
    pub chart_lock_timeout: Duration,
    /// Period of the label refresh timer.
    pub ui_refresh_period: Duration,
    /// Bounded wait used by the refresh timer on either lock.
    pub ui_refresh_lock_timeout: Duration,
    /// Time a button must stay asserted before a press is confirmed.
    pub debounce: Duration,
    /// Period of each button poller.
    pub button_poll_period: Duration,
    /// Bounded wait used when swapping screens.
    pub screen_swap_lock_timeout: Duration,
    /// Number of screens cycled by the next-screen button (1..=4).
    pub screen_count: usize,
    /// Which history slots take part in min/max statistics.
    pub stats_window: StatsWindow,
}

impl MonitorConfig {
    pub const fn new() -> Self {
        Self {
            sample_period: Duration::from_millis(SENSOR_MEASUREMENT_PERIOD_MS),
            state_lock_timeout: Duration::from_millis(100),
            chart_lock_timeout: Duration::from_millis(100),
            ui_refresh_period: Duration::from_millis(500),
            ui_refresh_lock_timeout: Duration::from_millis(10),
            debounce: Duration::from_millis(50),
            button_poll_period: Duration::from_millis(20),
            screen_swap_lock_timeout: Duration::from_millis(100),
            screen_count: MAX_SCREENS,
            stats_window: StatsWindow::WrittenOnly,
        }
    }

    pub const fn with_sample_period(mut self, period: Duration) -> Self {
        self.sample_period = period;
        self
    }

    /// Set the number of screens, clamped to `1..=MAX_SCREENS`.
    pub const fn with_screen_count(mut self, count: usize) -> Self {
        self.screen_count = if count == 0 {
            1
        } else if count > MAX_SCREENS {
            MAX_SCREENS
        } else {
            count
        };
        self
    }

    pub const fn with_stats_window(mut self, window: StatsWindow) -> Self {
        self.stats_window = window;
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}
