//! Widget capability and screen definitions
//!
//! Tasks never draw directly. They acquire the [`UiLock`], which hands out
//! exclusive access to a [`Widgets`] implementation, perform one short
//! mutation (set a label, append a chart point, swap the screen) and release
//! it. [`DisplayWidgets`] is the implementation that renders to an
//! `embedded-graphics` target; tests substitute a recording fake.

mod chart;
mod display;
#[cfg(test)]
pub(crate) mod fake;
pub mod layout;

pub use chart::Chart;
pub use display::{DisplayWidgets, LABEL_CAPACITY};

use core::fmt::Debug;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{Duration, with_timeout};

use crate::app_state::LockTimeout;
use crate::config::MAX_SCREENS;
use crate::metrics::{Metric, QualityLevel};

/// Text label identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelId {
    /// Latest value of a metric on the readings screen
    Reading(Metric),
    /// Min/max text above a metric's trend chart
    Range(Metric),
}

impl LabelId {
    pub const COUNT: usize = 2 * Metric::ALL.len();

    /// Position of this label in per-label arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Reading(metric) => metric.index(),
            Self::Range(metric) => Metric::ALL.len() + metric.index(),
        }
    }

    /// The screen this label is shown on.
    pub const fn screen(self) -> Screen {
        match self {
            Self::Reading(_) => Screen::Readings,
            Self::Range(metric) => Screen::trend(metric),
        }
    }
}

/// One full-screen page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Readings,
    Co2Trend,
    TemperatureTrend,
    HumidityTrend,
}

impl Screen {
    /// Screens in the order the next-screen button visits them.
    pub const ALL: [Screen; MAX_SCREENS] = [
        Screen::Readings,
        Screen::Co2Trend,
        Screen::TemperatureTrend,
        Screen::HumidityTrend,
    ];

    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % MAX_SCREENS]
    }

    pub const fn trend(metric: Metric) -> Self {
        match metric {
            Metric::Co2 => Self::Co2Trend,
            Metric::Temperature => Self::TemperatureTrend,
            Metric::Humidity => Self::HumidityTrend,
        }
    }

    /// The metric charted on this screen, if any.
    pub const fn trend_metric(self) -> Option<Metric> {
        match self {
            Self::Readings => None,
            Self::Co2Trend => Some(Metric::Co2),
            Self::TemperatureTrend => Some(Metric::Temperature),
            Self::HumidityTrend => Some(Metric::Humidity),
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Readings => "Air Quality",
            Self::Co2Trend => "CO2 History",
            Self::TemperatureTrend => "Temperature History",
            Self::HumidityTrend => "Humidity History",
        }
    }
}

/// Capability interface of the widget toolkit.
///
/// Implementations are only reachable through [`UiLock`], so every call
/// happens with exclusive access.
pub trait Widgets {
    type Error: Debug;

    /// Replace the text of a label.
    fn set_text(&mut self, label: LabelId, text: &str) -> Result<(), Self::Error>;

    /// Colour a label by quality level. Toolkits without colour ignore it.
    fn set_accent(&mut self, _label: LabelId, _level: QualityLevel) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Append one point to a metric's chart series, dropping the oldest
    /// point once the series is full.
    fn append_series(&mut self, series: Metric, value: f32) -> Result<(), Self::Error>;

    /// Make `screen` the active screen and draw it.
    fn load_screen(&mut self, screen: Screen) -> Result<(), Self::Error>;
}

/// The toolkit lock guarding all widget mutation.
pub struct UiLock<W> {
    inner: Mutex<CriticalSectionRawMutex, W>,
}

impl<W> UiLock<W> {
    pub const fn new(widgets: W) -> Self {
        Self {
            inner: Mutex::new(widgets),
        }
    }

    /// Acquire exclusive widget access, giving up after `timeout`.
    ///
    /// Hold the guard only for the mutation itself.
    pub async fn acquire_exclusive(
        &self,
        timeout: Duration,
    ) -> Result<MutexGuard<'_, CriticalSectionRawMutex, W>, LockTimeout> {
        with_timeout(timeout, self.inner.lock())
            .await
            .map_err(|_| LockTimeout::new("ui"))
    }

    /// Acquire without waiting.
    pub fn try_acquire(&self) -> Option<MutexGuard<'_, CriticalSectionRawMutex, W>> {
        self.inner.try_lock().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_indices_cover_all_slots() {
        let mut seen = [false; LabelId::COUNT];
        for metric in Metric::ALL {
            seen[LabelId::Reading(metric).index()] = true;
            seen[LabelId::Range(metric).index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_screen_index_wraps() {
        assert_eq!(Screen::from_index(0), Screen::Readings);
        assert_eq!(Screen::from_index(3), Screen::HumidityTrend);
        assert_eq!(Screen::from_index(4), Screen::Readings);
    }

    #[test]
    fn test_range_labels_live_on_their_trend_screen() {
        for metric in Metric::ALL {
            let screen = LabelId::Range(metric).screen();
            assert_eq!(screen.trend_metric(), Some(metric));
            assert_eq!(LabelId::Reading(metric).screen(), Screen::Readings);
        }
    }
}
