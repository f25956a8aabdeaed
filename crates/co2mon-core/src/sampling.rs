//! Periodic sampling loop
//!
//! Every cycle probes the sensor, records a fresh reading in the shared
//! history, recomputes min/max statistics from a copy taken under the state
//! lock, then forwards the new values to the chart series and range labels
//! under the UI lock. The two locks are never held at the same time.

use core::fmt::Write;

use embassy_time::Ticker;
use heapless::String;
use log::{debug, info, warn};

use crate::app_state::MonitorContext;
use crate::metrics::Metric;
use crate::sensors::{Reading, SensorError, SensorSource};
use crate::stats::{MetricRange, RollingStats};
use crate::ui::{LABEL_CAPACITY, LabelId, Widgets};

/// What a single sampling cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// The reading was stored. `charted` is false if the UI lock timed out.
    Recorded {
        reading: Reading,
        stats: Option<RollingStats>,
        charted: bool,
    },
    /// The sensor had no new measurement
    NotReady,
    /// The sensor could not be read
    ReadFailed(SensorError),
    /// The state lock timed out and the reading was discarded
    Dropped,
}

pub struct SamplingLoop<'a, S, W: Widgets, const N: usize> {
    source: S,
    ctx: &'a MonitorContext<W, N>,
}

impl<'a, S: SensorSource, W: Widgets, const N: usize> SamplingLoop<'a, S, W, N> {
    pub const fn new(source: S, ctx: &'a MonitorContext<W, N>) -> Self {
        Self { source, ctx }
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let reading = match self.source.try_read().await {
            Ok(reading) => reading,
            Err(e) if e.is_not_ready() => {
                debug!("{}", e);
                return CycleOutcome::NotReady;
            }
            Err(e) => {
                warn!("Sensor read error: {}", e);
                return CycleOutcome::ReadFailed(e);
            }
        };

        info!(
            "CO2: {} ppm, Temp: {:.1} °C, Humidity: {:.1} %",
            reading.co2_ppm, reading.temperature, reading.humidity
        );

        let history = match self
            .ctx
            .sensor_state
            .record(reading, self.ctx.config.state_lock_timeout)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!("Dropping sample: {}", e);
                return CycleOutcome::Dropped;
            }
        };

        let stats = history.stats(self.ctx.config.stats_window);
        if let Some(stats) = &stats {
            debug!(
                "Stats over {} samples: CO2 {:.0}..{:.0}, Temp {:.1}..{:.1}",
                stats.count,
                stats.co2().min,
                stats.co2().max,
                stats.temperature().min,
                stats.temperature().max
            );
        }

        let charted = self.forward_to_ui(&reading, stats.as_ref()).await;

        CycleOutcome::Recorded {
            reading,
            stats,
            charted,
        }
    }

    async fn forward_to_ui(&self, reading: &Reading, stats: Option<&RollingStats>) -> bool {
        let Ok(mut ui) = self
            .ctx
            .ui
            .acquire_exclusive(self.ctx.config.chart_lock_timeout)
            .await
        else {
            warn!("UI busy, chart not updated this cycle");
            return false;
        };

        for metric in Metric::ALL {
            if let Err(e) = ui.append_series(metric, reading.value(metric)) {
                warn!("Failed to chart {}: {:?}", metric.label(), e);
            }
            if let Some(stats) = stats {
                let text = format_range(metric, stats.range(metric));
                if let Err(e) = ui.set_text(LabelId::Range(metric), &text) {
                    warn!("Failed to update {} range: {:?}", metric.label(), e);
                }
            }
        }

        true
    }

    /// Sample on a fixed period forever.
    pub async fn run(&mut self) -> ! {
        let mut ticker = Ticker::every(self.ctx.config.sample_period);
        loop {
            self.run_cycle().await;
            ticker.next().await;
        }
    }
}

/// Min/max label text, e.g. `"min 412  max 1034 ppm"`.
pub fn format_range(metric: Metric, range: MetricRange) -> String<LABEL_CAPACITY> {
    let mut text = String::new();
    let _ = match metric {
        Metric::Co2 => write!(
            text,
            "min {:.0}  max {:.0} {}",
            range.min,
            range.max,
            metric.unit()
        ),
        _ => write!(
            text,
            "min {:.1}  max {:.1} {}",
            range.min,
            range.max,
            metric.unit()
        ),
    };
    text
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::config::{HISTORY_CAPACITY, MonitorConfig};
    use crate::stats::StatsWindow;
    use crate::ui::fake::RecordingWidgets;
    use embassy_futures::block_on;
    use embassy_time::Duration;
    use std::collections::VecDeque;
    use std::vec::Vec;

    const TIMEOUT: Duration = Duration::from_millis(100);

    /// Source replaying a fixed list of results.
    struct ScriptedSource {
        results: VecDeque<Result<Reading, SensorError>>,
    }

    impl ScriptedSource {
        fn new(results: impl IntoIterator<Item = Result<Reading, SensorError>>) -> Self {
            Self {
                results: results.into_iter().collect(),
            }
        }

        fn temperatures(values: &[f32]) -> Self {
            Self::new(values.iter().map(|t| Ok(Reading::new(600, *t, 45.0))))
        }
    }

    impl SensorSource for ScriptedSource {
        async fn start(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        async fn try_read(&mut self) -> Result<Reading, SensorError> {
            self.results
                .pop_front()
                .unwrap_or(Err(SensorError::NotReady { sensor: "scripted" }))
        }
    }

    type Context = MonitorContext<RecordingWidgets, HISTORY_CAPACITY>;

    fn context(config: MonitorConfig) -> Context {
        MonitorContext::new(config, RecordingWidgets::new())
    }

    fn read_failure() -> SensorError {
        SensorError::ReadFailed {
            sensor: "scripted",
            operation: "read measurement",
            details: "NACK",
        }
    }

    #[test]
    fn test_cycle_records_and_charts() {
        let ctx = context(MonitorConfig::default());
        let mut sampling = SamplingLoop::new(ScriptedSource::temperatures(&[21.0, 23.5]), &ctx);

        block_on(async {
            sampling.run_cycle().await;
            let outcome = sampling.run_cycle().await;

            let CycleOutcome::Recorded { stats, charted, .. } = outcome else {
                panic!("unexpected {:?}", outcome);
            };
            assert!(charted);
            let stats = stats.unwrap();
            assert_eq!(stats.temperature(), MetricRange { min: 21.0, max: 23.5 });

            let history = ctx.sensor_state.snapshot(TIMEOUT).await.unwrap();
            assert_eq!(history.len(), 2);
            assert_eq!(history.latest().temperature, 23.5);

            let ui = ctx.ui.acquire_exclusive(TIMEOUT).await.unwrap();
            assert_eq!(ui.series(Metric::Temperature), [21.0, 23.5]);
            assert_eq!(ui.series(Metric::Co2), [600.0, 600.0]);
            let last_range = ui
                .texts()
                .into_iter()
                .filter(|(label, _)| *label == LabelId::Range(Metric::Temperature))
                .map(|(_, text)| std::string::String::from(text))
                .last();
            assert_eq!(last_range.as_deref(), Some("min 21.0  max 23.5 °C"));
        });
    }

    #[test]
    fn test_twelve_cycle_scenario() {
        let values = [10.0, 20.0, 5.0, 15.0, 8.0, 12.0, 11.0, 9.0, 14.0, 13.0, 7.0, 6.0, 25.0];
        let ctx = context(MonitorConfig::default());
        let mut sampling = SamplingLoop::new(ScriptedSource::temperatures(&values), &ctx);

        block_on(async {
            let mut last = None;
            for _ in 0..HISTORY_CAPACITY {
                last = Some(sampling.run_cycle().await);
            }
            let Some(CycleOutcome::Recorded { stats: Some(stats), .. }) = last else {
                panic!("unexpected {:?}", last);
            };
            assert_eq!(stats.temperature(), MetricRange { min: 5.0, max: 20.0 });

            let outcome = sampling.run_cycle().await;
            let CycleOutcome::Recorded { stats: Some(stats), .. } = outcome else {
                panic!("unexpected {:?}", outcome);
            };
            assert_eq!(stats.temperature(), MetricRange { min: 5.0, max: 25.0 });
            assert_eq!(stats.count, HISTORY_CAPACITY);
        });
    }

    #[test]
    fn test_not_ready_and_read_failure_skip_cycle() {
        let ctx = context(MonitorConfig::default());
        let source = ScriptedSource::new([
            Err(SensorError::NotReady { sensor: "scripted" }),
            Err(read_failure()),
            Ok(Reading::new(700, 22.0, 40.0)),
        ]);
        let mut sampling = SamplingLoop::new(source, &ctx);

        block_on(async {
            assert_eq!(sampling.run_cycle().await, CycleOutcome::NotReady);
            assert_eq!(
                sampling.run_cycle().await,
                CycleOutcome::ReadFailed(read_failure())
            );
            assert!(ctx.sensor_state.snapshot(TIMEOUT).await.unwrap().is_empty());
            assert!(ctx.ui.acquire_exclusive(TIMEOUT).await.unwrap().calls.is_empty());

            // Retried on the next cycle
            assert!(matches!(
                sampling.run_cycle().await,
                CycleOutcome::Recorded { .. }
            ));
        });
    }

    #[test]
    fn test_state_lock_timeout_drops_sample() {
        let ctx = context(MonitorConfig::default());
        let mut sampling = SamplingLoop::new(ScriptedSource::temperatures(&[19.0]), &ctx);

        block_on(async {
            let guard = ctx.sensor_state.hold().await;
            assert_eq!(sampling.run_cycle().await, CycleOutcome::Dropped);
            drop(guard);

            assert!(ctx.sensor_state.snapshot(TIMEOUT).await.unwrap().is_empty());
            assert!(ctx.ui.acquire_exclusive(TIMEOUT).await.unwrap().calls.is_empty());
        });
    }

    #[test]
    fn test_ui_lock_timeout_still_records() {
        let ctx = context(MonitorConfig::default());
        let mut sampling = SamplingLoop::new(ScriptedSource::temperatures(&[19.0]), &ctx);

        block_on(async {
            let guard = ctx.ui.acquire_exclusive(TIMEOUT).await.unwrap();
            let outcome = sampling.run_cycle().await;
            assert!(matches!(
                outcome,
                CycleOutcome::Recorded { charted: false, .. }
            ));
            assert!(guard.calls.is_empty());
            drop(guard);

            let history = ctx.sensor_state.snapshot(TIMEOUT).await.unwrap();
            assert_eq!(history.latest().temperature, 19.0);
        });
    }

    #[test]
    fn test_all_slots_window_includes_placeholders() {
        let config = MonitorConfig::default().with_stats_window(StatsWindow::AllSlots);
        let ctx = context(config);
        let mut sampling = SamplingLoop::new(ScriptedSource::temperatures(&[19.0, 21.0]), &ctx);

        block_on(async {
            sampling.run_cycle().await;
            let outcome = sampling.run_cycle().await;
            let CycleOutcome::Recorded { stats: Some(stats), .. } = outcome else {
                panic!("unexpected {:?}", outcome);
            };
            assert_eq!(stats.temperature().min, 0.0);
            assert_eq!(stats.count, HISTORY_CAPACITY);
        });
    }

    #[test]
    fn test_format_range() {
        let co2 = format_range(Metric::Co2, MetricRange { min: 412.0, max: 1034.0 });
        assert_eq!(co2.as_str(), "min 412  max 1034 ppm");
        let humidity = format_range(Metric::Humidity, MetricRange { min: 38.0, max: 61.5 });
        assert_eq!(humidity.as_str(), "min 38.0  max 61.5 %");
    }

    #[test]
    fn test_charted_series_follow_history_order() {
        let values: Vec<f32> = (0..(HISTORY_CAPACITY + 2)).map(|i| i as f32).collect();
        let ctx = context(MonitorConfig::default());
        let mut sampling = SamplingLoop::new(ScriptedSource::temperatures(&values), &ctx);

        block_on(async {
            for _ in 0..values.len() {
                sampling.run_cycle().await;
            }
            let ui = ctx.ui.acquire_exclusive(TIMEOUT).await.unwrap();
            assert_eq!(ui.series(Metric::Temperature), values);

            let history = ctx.sensor_state.snapshot(TIMEOUT).await.unwrap();
            let kept: Vec<f32> = history.chronological().map(|r| r.temperature).collect();
            assert_eq!(kept, values[2..]);
        });
    }
}
