//! Fixed-window request limiting per caller identity.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Counter for one identity's current window.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    started: Instant,
    count: u32,
}

/// Fixed-window limiter: at most `max` admissions per identity per `window`.
///
/// A single mutex guards the whole window map, so concurrent callers sharing
/// an identity can never be admitted more than `max` times in one window.
/// Windows are created lazily and never evicted.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max: u32,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl RateLimiter {
    /// Create a limiter. A `max` of zero is raised to one.
    #[must_use]
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            window,
            max: max.max(1),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or deny a call for `identity` at the current instant.
    pub fn admit(&self, identity: &str) -> bool {
        self.admit_at(identity, Instant::now())
    }

    /// Admit or deny a call for `identity` at `now`.
    ///
    /// Opens a fresh window when none exists or the current one is older
    /// than the window length. Denied calls leave the count untouched.
    pub fn admit_at(&self, identity: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock();
        match windows.get_mut(identity) {
            Some(current) if now.saturating_duration_since(current.started) <= self.window => {
                if current.count < self.max {
                    current.count += 1;
                    true
                } else {
                    false
                }
            }
            _ => {
                windows.insert(
                    identity.to_string(),
                    RateWindow {
                        started: now,
                        count: 1,
                    },
                );
                true
            }
        }
    }

    /// Number of identities with a window on record.
    #[must_use]
    pub fn tracked_identities(&self) -> usize {
        self.windows.lock().len()
    }

    /// Window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Admissions allowed per window.
    #[must_use]
    pub const fn max_requests(&self) -> u32 {
        self.max
    }
}
