//! Latest reading and reading history shared between tasks

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{Duration, with_timeout};

use super::LockTimeout;
use crate::config::HISTORY_CAPACITY;
use crate::sensors::Reading;
use crate::stats::{RollingStats, StatsWindow};

/// Most recent reading plus a fixed-capacity ring of past readings.
///
/// `write_index` always points at the slot the next reading overwrites.
/// Slots that have not been written yet hold [`Reading::EMPTY`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorHistory<const N: usize> {
    latest: Reading,
    slots: [Reading; N],
    write_index: usize,
    len: usize,
}

impl<const N: usize> SensorHistory<N> {
    pub const fn new() -> Self {
        Self {
            latest: Reading::EMPTY,
            slots: [Reading::EMPTY; N],
            write_index: 0,
            len: 0,
        }
    }

    /// Store `reading` as the latest value and overwrite the oldest slot.
    pub fn record(&mut self, reading: Reading) {
        self.latest = reading;
        self.slots[self.write_index] = reading;
        self.write_index = (self.write_index + 1) % N;
        if self.len < N {
            self.len += 1;
        }
    }

    pub const fn latest(&self) -> &Reading {
        &self.latest
    }

    pub const fn write_index(&self) -> usize {
        self.write_index
    }

    /// Number of slots written so far, saturating at `N`.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// Raw ring storage in slot order, including unwritten slots.
    pub const fn slots(&self) -> &[Reading; N] {
        &self.slots
    }

    /// Written readings, oldest first.
    pub fn chronological(&self) -> impl Iterator<Item = &Reading> + '_ {
        let start = if self.len < N { 0 } else { self.write_index };
        (0..self.len).map(move |i| &self.slots[(start + i) % N])
    }

    /// Min/max of every metric over the slots selected by `window`.
    pub fn stats(&self, window: StatsWindow) -> Option<RollingStats> {
        match window {
            StatsWindow::WrittenOnly => RollingStats::compute(self.chronological()),
            StatsWindow::AllSlots => RollingStats::compute(self.slots.iter()),
        }
    }
}

impl<const N: usize> Default for SensorHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`SensorHistory`] behind the single lock shared by the sampling loop
/// (writer) and the UI refresh timer (reader).
///
/// Every accessor takes a bounded wait. Callers that time out skip their
/// work for the cycle instead of blocking.
pub struct SharedSensorState<const N: usize = HISTORY_CAPACITY> {
    inner: Mutex<CriticalSectionRawMutex, SensorHistory<N>>,
}

impl<const N: usize> SharedSensorState<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(SensorHistory::new()),
        }
    }

    async fn lock(
        &self,
        timeout: Duration,
    ) -> Result<MutexGuard<'_, CriticalSectionRawMutex, SensorHistory<N>>, LockTimeout> {
        with_timeout(timeout, self.inner.lock())
            .await
            .map_err(|_| LockTimeout::new("sensor state"))
    }

    /// Record a reading and return a copy of the history taken under the
    /// same lock, so statistics can be computed after it is released.
    pub async fn record(
        &self,
        reading: Reading,
        timeout: Duration,
    ) -> Result<SensorHistory<N>, LockTimeout> {
        let mut history = self.lock(timeout).await?;
        history.record(reading);
        Ok(*history)
    }

    /// Copy of the most recent reading.
    pub async fn latest(&self, timeout: Duration) -> Result<Reading, LockTimeout> {
        let history = self.lock(timeout).await?;
        Ok(*history.latest())
    }

    /// Copy of the whole history.
    pub async fn snapshot(&self, timeout: Duration) -> Result<SensorHistory<N>, LockTimeout> {
        let history = self.lock(timeout).await?;
        Ok(*history)
    }

    /// Take the lock without a bound, for tests that need it held.
    #[cfg(test)]
    pub(crate) async fn hold(&self) -> MutexGuard<'_, CriticalSectionRawMutex, SensorHistory<N>> {
        self.inner.lock().await
    }
}

impl<const N: usize> Default for SharedSensorState<N> {
    fn default() -> Self {
        Self::new()
    }
}
