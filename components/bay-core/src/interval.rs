//! Normalized (seconds, nanoseconds) interval arithmetic. The sub-second
//! component of every result is renormalized into `[0, 1e9)` by borrowing or
//! carrying a whole second.

use embassy_time::{Duration, Instant};

use crate::config;

pub const NANOS_PER_SEC: u32 = 1_000_000_000;

// Fields stay private so every value goes through the normalizing
// constructors and the `[0, 1e9)` invariant holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeInterval {
    secs: i64,
    nanos: u32,
}

impl TimeInterval {
    pub const ZERO: TimeInterval = TimeInterval { secs: 0, nanos: 0 };

    pub const fn new(secs: i64, nanos: u32) -> Self {
        let mut secs = secs;
        let mut nanos = nanos;
        while nanos >= NANOS_PER_SEC {
            nanos -= NANOS_PER_SEC;
            secs += 1;
        }
        TimeInterval { secs, nanos }
    }

    /// Monotonic time since boot as an interval.
    pub fn since_boot(instant: Instant) -> Self {
        let micros = instant.as_micros();
        TimeInterval {
            secs: (micros / 1_000_000) as i64,
            nanos: ((micros % 1_000_000) * 1000) as u32,
        }
    }

    pub fn from_duration(duration: Duration) -> Self {
        let micros = duration.as_micros();
        TimeInterval {
            secs: (micros / 1_000_000) as i64,
            nanos: ((micros % 1_000_000) * 1000) as u32,
        }
    }

    /// `self - other`, borrowing a second when the nanoseconds underflow.
    pub fn sub(self, other: Self) -> Self {
        let mut secs = self.secs - other.secs;
        let mut nanos = self.nanos as i64 - other.nanos as i64;
        if nanos < 0 {
            secs -= 1;
            nanos += NANOS_PER_SEC as i64;
        }
        TimeInterval { secs, nanos: nanos as u32 }
    }

    /// `self + other`, carrying a second when the nanoseconds overflow.
    pub fn add(self, other: Self) -> Self {
        let mut secs = self.secs + other.secs;
        let mut nanos = self.nanos + other.nanos;
        if nanos >= NANOS_PER_SEC {
            secs += 1;
            nanos -= NANOS_PER_SEC;
        }
        TimeInterval { secs, nanos }
    }

    /// Strict `self > other`.
    pub fn gt(self, other: Self) -> bool {
        self.secs > other.secs || (self.secs == other.secs && self.nanos > other.nanos)
    }

    pub fn secs(self) -> i64 {
        self.secs
    }

    /// Sub-second component, always in `[0, 1e9)`.
    pub fn nanos(self) -> u32 {
        self.nanos
    }
}

/// Converts a round-trip echo pulse width into centimeters. Only the
/// sub-second component carries information, a real echo is orders of
/// magnitude shorter than a second.
pub fn pulse_width_to_cm(width: TimeInterval) -> f32 {
    width.nanos as f32 / config::PULSE_NANOS_PER_CM
}
