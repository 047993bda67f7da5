//! Wall-Clock Timing
//!
//! A comparison of execution strategies only needs end-to-end wall-clock
//! time, so this is a thin wrapper over `std::time::Instant`.

use std::time::{Duration, Instant};

/// Timer for measuring one task or one whole strategy run.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    #[inline]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time since [`Timer::start`]. Monotonic, so always finite and
    /// never negative.
    #[inline]
    pub fn stop(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_measures_a_sleep() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.stop();

        // At least the sleep, with headroom for scheduling noise.
        assert!(elapsed >= Duration::from_millis(5));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn timer_is_reusable_and_monotonic() {
        let timer = Timer::start();
        let first = timer.stop();
        let second = timer.stop();
        assert!(second >= first);
    }
}
