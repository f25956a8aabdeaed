//! Rolling min/max statistics over the reading history

use crate::metrics::Metric;
use crate::sensors::Reading;

/// Which history slots take part in a statistics pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsWindow {
    /// Only slots that have been written since boot.
    #[default]
    WrittenOnly,
    /// Every slot of the ring, including zero-valued ones that were never
    /// written. Until the ring wraps once this biases minima toward zero.
    AllSlots,
}

/// Extremes of one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    pub min: f32,
    pub max: f32,
}

impl MetricRange {
    const fn of(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    fn include(&mut self, value: f32) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

/// Min/max of every metric over a set of readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingStats {
    ranges: [MetricRange; 3],
    /// Number of readings scanned
    pub count: usize,
}

impl RollingStats {
    /// Scan `readings` once and return the extremes of every metric, or
    /// `None` if there is nothing to scan.
    pub fn compute<'a, I>(readings: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let mut iter = readings.into_iter();
        let first = iter.next()?;

        let mut stats = Self {
            ranges: Metric::ALL.map(|metric| MetricRange::of(first.value(metric))),
            count: 1,
        };

        for reading in iter {
            for metric in Metric::ALL {
                stats.ranges[metric.index()].include(reading.value(metric));
            }
            stats.count += 1;
        }

        Some(stats)
    }

    pub fn range(&self, metric: Metric) -> MetricRange {
        self.ranges[metric.index()]
    }

    pub fn co2(&self) -> MetricRange {
        self.range(Metric::Co2)
    }

    pub fn temperature(&self) -> MetricRange {
        self.range(Metric::Temperature)
    }

    pub fn humidity(&self) -> MetricRange {
        self.range(Metric::Humidity)
    }
}
