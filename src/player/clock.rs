//! Time sources for the playback scheduler.

use std::thread;
use std::time::{Duration, Instant};

/// Something that can block for a duration and report elapsed time.
///
/// The scheduler waits exclusively through this trait, so playback timing can
/// be simulated in tests.
pub trait Clock {
    /// Blocks for `duration`. Real clocks may overshoot.
    fn sleep(&mut self, duration: Duration);

    /// Time elapsed since the clock was created.
    fn elapsed(&self) -> Duration;
}

/// Wall-clock time backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }

    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated time. Every sleep advances the clock by the requested duration
/// plus a fixed jitter, and is recorded.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Duration,
    jitter: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    /// A clock that sleeps exactly as long as asked.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock that oversleeps by `jitter` on every call.
    pub fn with_jitter(jitter: Duration) -> Self {
        Self {
            jitter,
            ..Self::default()
        }
    }

    /// Requested durations of every sleep so far, in order.
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }

    /// Moves time forward without recording a sleep.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for ManualClock {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.now += duration + self.jitter;
    }

    fn elapsed(&self) -> Duration {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_exact() {
        let mut clock = ManualClock::new();
        clock.sleep(Duration::from_millis(80));
        clock.sleep(Duration::from_millis(20));
        assert_eq!(clock.elapsed(), Duration::from_millis(100));
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[test]
    fn test_manual_clock_jitter() {
        let mut clock = ManualClock::with_jitter(Duration::from_millis(2));
        clock.sleep(Duration::from_millis(80));
        clock.advance(Duration::from_millis(10));
        assert_eq!(clock.elapsed(), Duration::from_millis(92));
        assert_eq!(clock.sleeps(), &[Duration::from_millis(80)]);
    }

    #[test]
    fn test_system_clock_sleeps_at_least() {
        let mut clock = SystemClock::new();
        let before = clock.elapsed();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.elapsed() - before >= Duration::from_millis(5));
    }
}
