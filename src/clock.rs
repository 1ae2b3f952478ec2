//! Monotonic clock abstraction used to pace the mixer workers.
//!
//! Mixers never rely on their poll sleep being accurate. They compare a
//! virtual timestamp against [`Clock::now`] instead, so swapping in a
//! [`ManualClock`] makes every mix iteration fire exactly when a test says so.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A source of monotonic time.
pub trait Clock: Send + Sync + std::fmt::Debug + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Returns the default clock shared by mixers and buffers.
pub fn default_clock() -> Arc<dyn Clock> {
    Arc::new(MonotonicClock)
}

/// A clock that only moves when [`advance`](ManualClock::advance) is called.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use stream_mix::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.advance(Duration::from_millis(20));
/// assert_eq!(clock.now() - start, Duration::from_millis(20));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Creates a manual clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Instant::now()),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_frozen() {
        let clock = ManualClock::new();
        let a = clock.now();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(clock.now(), a);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_millis(20));
        clock.advance(Duration::from_millis(20));
        assert_eq!(clock.now() - start, Duration::from_millis(40));
    }

    #[test]
    fn test_monotonic_clock_moves_forward() {
        let clock = MonotonicClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
