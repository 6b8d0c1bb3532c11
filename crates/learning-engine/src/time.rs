//! Time utilities for the learning engine.
//!
//! All timestamps are Unix epoch microseconds (u64).

use std::sync::atomic::{AtomicU64, Ordering};

/// Microseconds in one day.
pub const MICROS_PER_DAY: u64 = 86_400 * 1_000_000;

/// Return the current time as microseconds since Unix epoch.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Convert a number of whole days to microseconds. `None` on overflow.
pub fn days_to_micros(days: u32) -> Option<u64> {
    u64::from(days).checked_mul(MICROS_PER_DAY)
}

/// Convert microseconds to an RFC 3339 string.
pub fn micros_to_rfc3339(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let nsecs = ((micros % 1_000_000) * 1000) as u32;
    let dt = chrono::DateTime::from_timestamp(secs, nsecs).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Source of the current time for the service layer.
pub trait Clock: Send + Sync {
    fn now_micros(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        now_micros()
    }
}

/// A clock that only moves when told to. Used to exercise access windows.
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    pub fn new(start_micros: u64) -> Self {
        Self {
            micros: AtomicU64::new(start_micros),
        }
    }

    pub fn set(&self, micros: u64) {
        self.micros.store(micros, Ordering::SeqCst);
    }

    /// Move forward, saturating at `u64::MAX`.
    pub fn advance(&self, micros: u64) {
        let _ = self
            .micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(micros))
            });
    }

    pub fn advance_days(&self, days: u32) {
        self.advance(days_to_micros(days).unwrap_or(u64::MAX));
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> u64 {
        self.micros.load(Ordering::SeqCst)
    }
}
