//! Periodic UI refresh
//!
//! Copies the latest reading out of the shared state and pushes formatted
//! text to the three reading labels. Both locks are taken with short bounds
//! and never held together; a refresh that cannot get either lock is skipped
//! and the next tick tries again.

use core::fmt::Write;

use embassy_time::Ticker;
use heapless::String;
use log::{debug, trace};

use crate::app_state::MonitorContext;
use crate::metrics::{Metric, QualityLevel};
use crate::sensors::Reading;
use crate::ui::{LabelId, Widgets};

/// What a single refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// All reading labels were updated
    Updated,
    /// No sample has been recorded yet
    NoData,
    /// A lock was not acquired in time
    Skipped,
}

pub struct UiRefreshTimer<'a, W: Widgets, const N: usize> {
    ctx: &'a MonitorContext<W, N>,
}

impl<'a, W: Widgets, const N: usize> UiRefreshTimer<'a, W, N> {
    pub const fn new(ctx: &'a MonitorContext<W, N>) -> Self {
        Self { ctx }
    }

    pub async fn refresh_once(&self) -> RefreshOutcome {
        let timeout = self.ctx.config.ui_refresh_lock_timeout;

        let Ok(latest) = self.ctx.sensor_state.latest(timeout).await else {
            trace!("UI refresh skipped: sensor state busy");
            return RefreshOutcome::Skipped;
        };
        if !latest.data_ready {
            return RefreshOutcome::NoData;
        }

        let labels = format_reading(&latest);

        let Ok(mut ui) = self.ctx.ui.acquire_exclusive(timeout).await else {
            trace!("UI refresh skipped: UI busy");
            return RefreshOutcome::Skipped;
        };
        for (metric, text) in Metric::ALL.into_iter().zip(labels.iter()) {
            let label = LabelId::Reading(metric);
            let level = QualityLevel::assess(metric, latest.value(metric));
            if let Err(e) = ui
                .set_accent(label, level)
                .and_then(|_| ui.set_text(label, text))
            {
                debug!("Failed to update {:?}: {:?}", label, e);
            }
        }

        RefreshOutcome::Updated
    }

    /// Refresh on a fixed period forever.
    pub async fn run(&self) -> ! {
        let mut ticker = Ticker::every(self.ctx.config.ui_refresh_period);
        loop {
            self.refresh_once().await;
            ticker.next().await;
        }
    }
}

/// Label text for each metric, in [`Metric::ALL`] order.
pub fn format_reading(reading: &Reading) -> [String<16>; 3] {
    let mut co2 = String::new();
    let mut temperature = String::new();
    let mut humidity = String::new();
    // The longest values ("65535 ppm", "-40.0 °C") fit the buffers
    let _ = write!(co2, "{} ppm", reading.co2_ppm);
    let _ = write!(temperature, "{:.1} °C", reading.temperature);
    let _ = write!(humidity, "{:.1} %", reading.humidity);
    [co2, temperature, humidity]
}
