//! Run clocks and cancellation.

use chrono::Duration;
use std::cell::Cell;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[derive(Debug, Default)]
struct CancelShared {
    cancelled: Mutex<bool>,
    cv: Condvar,
}

/// Run-level cancellation signal. Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    shared: Arc<CancelShared>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.shared
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel the run and wake every pending sleep.
    pub fn cancel(&self) {
        let mut cancelled = self.lock();
        *cancelled = true;
        self.shared.cv.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Block for up to `timeout`. Returns `true` if the token was cancelled.
    pub fn wait_timeout(&self, timeout: std::time::Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self.lock();
        loop {
            if *cancelled {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .shared
                .cv
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            cancelled = guard;
        }
    }
}

/// Source of elapsed run time.
pub trait Clock {
    /// Time since the run started.
    fn elapsed(&self) -> Duration;

    /// Block until `elapsed() >= target`. Returns `false` if `cancel` fired first.
    fn sleep_until(&self, target: Duration, cancel: &CancelToken) -> bool;
}

/// Wall clock backed by a monotonic [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Clock whose run starts now.
    pub fn start() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self { start }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        Duration::from_std(self.start.elapsed()).unwrap_or_else(|_| Duration::max_value())
    }

    fn sleep_until(&self, target: Duration, cancel: &CancelToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let remaining = target - self.elapsed();
            if remaining <= Duration::zero() {
                return true;
            }
            let timeout = remaining.to_std().unwrap_or_default();
            if cancel.wait_timeout(timeout) {
                return false;
            }
        }
    }
}

/// Virtual clock for dry runs and tests. Sleeping jumps straight to the target.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Duration::zero())
    }

    pub fn starting_at(now: Duration) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.now.get()
    }

    fn sleep_until(&self, target: Duration, cancel: &CancelToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        if target > self.now.get() {
            self.now.set(target);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!token.is_cancelled());
        other.cancel();
        assert!(token.is_cancelled());
        assert!(token.wait_timeout(std::time::Duration::from_secs(60)));
    }

    #[test]
    fn test_wait_timeout_expires() {
        let token = CancelToken::new();
        assert!(!token.wait_timeout(std::time::Duration::from_millis(10)));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        let cancel = CancelToken::new();
        assert_eq!(clock.elapsed(), Duration::zero());

        clock.advance(Duration::seconds(5));
        assert!(clock.sleep_until(Duration::seconds(30), &cancel));
        assert_eq!(clock.elapsed(), Duration::seconds(30));

        // Sleeping to a past target leaves the clock alone
        assert!(clock.sleep_until(Duration::seconds(10), &cancel));
        assert_eq!(clock.elapsed(), Duration::seconds(30));

        cancel.cancel();
        assert!(!clock.sleep_until(Duration::minutes(1), &cancel));
        assert_eq!(clock.elapsed(), Duration::seconds(30));
    }

    #[test]
    fn test_system_clock_short_sleep() {
        let clock = SystemClock::start();
        let cancel = CancelToken::new();
        assert!(clock.sleep_until(Duration::milliseconds(20), &cancel));
        assert!(clock.elapsed() >= Duration::milliseconds(20));
    }

    #[test]
    fn test_system_clock_sleep_interrupted() {
        let clock = SystemClock::start();
        let cancel = CancelToken::new();
        let canceller = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(50));
            canceller.cancel();
        });

        assert!(!clock.sleep_until(Duration::minutes(10), &cancel));
        assert!(clock.elapsed() < Duration::seconds(30));
        handle.join().unwrap();
    }
}
