//! Wait primitives
//!
//! The executor never calls `std::thread::sleep` directly; it goes through a
//! [`Sleeper`] so tests can observe the requested waits without blocking.

use std::sync::Arc;
use std::time::Duration;

/// Blocking wait between attempts
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

impl<T: Sleeper + ?Sized> Sleeper for Arc<T> {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Sleeper blocking the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Convert a delay magnitude into a wall-clock duration
///
/// Saturates at `u64::MAX` nanoseconds instead of overflowing.
pub fn scale_delay(magnitude: u64, unit: Duration) -> Duration {
    let nanos = unit.as_nanos().saturating_mul(u128::from(magnitude));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
