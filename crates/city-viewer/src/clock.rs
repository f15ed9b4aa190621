//! Frame timing.

use std::time::Instant;

/// A monotonic source of elapsed seconds.
pub trait TimeSource {
    fn elapsed_secs(&mut self) -> f64;
}

/// Wall-clock source. Starts counting on the first read, so the first
/// reading is always `0.0`.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    start: Option<Instant>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for MonotonicClock {
    fn elapsed_secs(&mut self) -> f64 {
        let start = *self.start.get_or_insert_with(Instant::now);
        start.elapsed().as_secs_f64()
    }
}

/// Timing for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    pub elapsed: f64,
    pub delta: f64,
}

/// Elapsed/previous bookkeeping for the render loop.
#[derive(Debug)]
pub struct FrameClock<T = MonotonicClock> {
    source: T,
    elapsed: f64,
    previous: f64,
}

impl<T: TimeSource> FrameClock<T> {
    pub fn new(source: T) -> Self {
        Self {
            source,
            elapsed: 0.0,
            previous: 0.0,
        }
    }

    /// Reads the source and returns the time since the previous tick.
    ///
    /// `delta` is never negative: a reading behind the last one is treated
    /// as no time passing.
    pub fn tick(&mut self) -> FrameTime {
        let reading = self.source.elapsed_secs();
        self.elapsed = reading.max(self.previous);
        let delta = self.elapsed - self.previous;
        self.previous = self.elapsed;
        FrameTime {
            elapsed: self.elapsed,
            delta,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn previous(&self) -> f64 {
        self.previous
    }
}

impl Default for FrameClock<MonotonicClock> {
    fn default() -> Self {
        Self::new(MonotonicClock::new())
    }
}

/// Replays a fixed list of readings; holds the last one once exhausted.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedTime {
    readings: std::collections::VecDeque<f64>,
    last: f64,
}

#[cfg(test)]
impl ScriptedTime {
    pub(crate) fn new(readings: impl IntoIterator<Item = f64>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            last: 0.0,
        }
    }
}

#[cfg(test)]
impl TimeSource for ScriptedTime {
    fn elapsed_secs(&mut self) -> f64 {
        if let Some(next) = self.readings.pop_front() {
            self.last = next;
        }
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_has_zero_delta() {
        let mut clock = FrameClock::new(ScriptedTime::new([0.0, 0.016]));
        assert_eq!(clock.tick().delta, 0.0);
        let t = clock.tick();
        assert!((t.delta - 0.016).abs() < 1e-12);
        assert_eq!(clock.previous(), clock.elapsed());
    }

    #[test]
    fn delta_is_never_negative_for_non_decreasing_readings() {
        let readings = [0.0, 0.0, 0.1, 0.1, 0.35, 1.0, 1.0, 7.25];
        let mut clock = FrameClock::new(ScriptedTime::new(readings));
        let mut total = 0.0;
        for _ in 0..readings.len() {
            let t = clock.tick();
            assert!(t.delta >= 0.0);
            total += t.delta;
        }
        assert!((total - 7.25).abs() < 1e-9);
    }

    #[test]
    fn backwards_reading_yields_zero_delta() {
        let mut clock = FrameClock::new(ScriptedTime::new([1.0, 0.5, 1.5]));
        clock.tick();
        assert_eq!(clock.tick().delta, 0.0);
        assert!((clock.tick().delta - 0.5).abs() < 1e-12);
    }

    #[test]
    fn arbitrary_gaps_are_reported_in_full() {
        let mut clock = FrameClock::new(ScriptedTime::new([0.0, 12.5]));
        clock.tick();
        assert_eq!(clock.tick().delta, 12.5);
    }

    #[test]
    fn monotonic_clock_starts_at_zero() {
        let mut clock = MonotonicClock::new();
        let first = clock.elapsed_secs();
        assert!(first < 0.01);
        assert!(clock.elapsed_secs() >= first);
    }
}
