//! Measurement period gate
//!
//! A sensor in periodic mode produces one value per period. Probing it more
//! often only wastes bus time, so sources consult a [`MeasurementCadence`]
//! first and answer `NotReady` without touching the hardware until the next
//! period boundary has passed.

use embassy_time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct MeasurementCadence {
    period: Duration,
    next_due: Option<Instant>,
}

impl MeasurementCadence {
    /// Create a cadence that has not been started. It is never due until
    /// [`start`](Self::start) is called.
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Begin measuring at `now`. The first value is due one full period later.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn is_started(&self) -> bool {
        self.next_due.is_some()
    }

    /// Whether a new value should be available at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.next_due, Some(due) if now >= due)
    }

    /// Record that the value for the current period was taken.
    ///
    /// The next boundary stays on the original grid; periods that were missed
    /// entirely are skipped rather than reported as a burst of values.
    pub fn consume(&mut self, now: Instant) {
        if let Some(mut due) = self.next_due {
            // A zero period is always due
            if self.period.as_ticks() == 0 {
                return;
            }
            while due <= now {
                due += self.period;
            }
            self.next_due = Some(due);
        }
    }

    /// `is_due` followed by `consume` when due.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.consume(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(5000);

    #[test]
    fn test_not_due_before_start() {
        let cadence = MeasurementCadence::new(PERIOD);
        assert!(!cadence.is_started());
        assert!(!cadence.is_due(Instant::from_secs(100)));
    }

    #[test]
    fn test_fast_polling_only_fires_on_period_boundaries() {
        let mut cadence = MeasurementCadence::new(PERIOD);
        cadence.start(Instant::from_millis(0));

        // Poll every 700 ms for 21 seconds.
        let mut fired_at = heapless::Vec::<u64, 8>::new();
        let mut t = 0;
        while t <= 21_000 {
            if cadence.poll(Instant::from_millis(t)) {
                fired_at.push(t).unwrap();
            }
            t += 700;
        }

        // First poll at or after each 5 s boundary.
        assert_eq!(fired_at.as_slice(), &[5600, 10500, 15400, 20300]);
    }

    #[test]
    fn test_missed_periods_are_skipped() {
        let mut cadence = MeasurementCadence::new(PERIOD);
        cadence.start(Instant::from_millis(0));

        assert!(cadence.poll(Instant::from_millis(17_000)));
        // The 10 s and 15 s values were never read and are not replayed.
        assert!(!cadence.poll(Instant::from_millis(17_001)));
        assert!(!cadence.poll(Instant::from_millis(19_999)));
        assert!(cadence.poll(Instant::from_millis(20_000)));
    }

    #[test]
    fn test_is_due_does_not_consume() {
        let mut cadence = MeasurementCadence::new(PERIOD);
        cadence.start(Instant::from_millis(0));

        assert!(cadence.is_due(Instant::from_millis(5000)));
        assert!(cadence.is_due(Instant::from_millis(5100)));
        cadence.consume(Instant::from_millis(5100));
        assert!(!cadence.is_due(Instant::from_millis(5100)));
        assert!(cadence.is_due(Instant::from_millis(10_000)));
    }
}
