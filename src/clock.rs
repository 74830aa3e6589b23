//! Time keeping for echo measurements.

pub trait Now {
    // The time elapsed since startup in microseconds
    fn now_micros(&self) -> u64;
}

/// Measures the time between two points on a [`Now`] clock.
///
/// Until [`Stopwatch::stop`] is called, `elapsed` reads the clock again and keeps growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopwatch {
    started_at: u64,
    stopped_at: Option<u64>,
}

impl Stopwatch {
    pub fn start<C: Now>(clock: &C) -> Self {
        Self {
            started_at: clock.now_micros(),
            stopped_at: None,
        }
    }

    /// Freeze the stopwatch and return the elapsed microseconds.
    pub fn stop<C: Now>(&mut self, clock: &C) -> u64 {
        let stopped_at = *self.stopped_at.get_or_insert_with(|| clock.now_micros());
        stopped_at.saturating_sub(self.started_at)
    }

    pub fn elapsed_micros<C: Now>(&self, clock: &C) -> u64 {
        self.stopped_at
            .unwrap_or_else(|| clock.now_micros())
            .saturating_sub(self.started_at)
    }
}

/// A point in time after which a wait is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: u64,
}

impl Deadline {
    pub fn after<C: Now>(clock: &C, timeout_us: u64) -> Self {
        Self {
            at: clock.now_micros().saturating_add(timeout_us),
        }
    }

    pub fn has_expired<C: Now>(&self, clock: &C) -> bool {
        clock.now_micros() >= self.at
    }
}
