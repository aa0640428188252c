//! Empirical constants of the bay monitor. The pulse-width divisor and the
//! centimeter thresholds are tied to the timing characteristics of the
//! deployed ultrasonic sensor and are not re-derived here.

use embassy_time::Duration;

/// Interval between distance measurements.
pub const MEASUREMENT_PERIOD: Duration = Duration::from_millis(500);

/// How long the trigger pin is held high before the measurement.
pub const TRIGGER_HOLD_US: u64 = 10;

/// Iteration ceiling of the echo busy-poll. Bounds the worst-case latency of
/// a single measurement since no edge-interrupt primitive is assumed.
pub const POLL_CEILING: u32 = 10_000;

/// Distance reported when no echo is observed within the poll ceiling.
pub const NO_ECHO_CM: f32 = 400.0;

/// Distance reported when the trigger/echo pin cannot be acquired.
pub const UNAVAILABLE_CM: f32 = -1.0;

/// Round-trip pulse width in nanoseconds per centimeter of distance.
pub const PULSE_NANOS_PER_CM: f32 = 58_000.0;

/// Above this distance the bay classifies as clear.
pub const CLEAR_THRESHOLD_CM: f32 = 8.0;

/// At or below this distance the bay classifies as occupied (tier), anything
/// in between is near.
pub const OCCUPIED_THRESHOLD_CM: f32 = 2.0;

/// Minimum delay between consecutive telemetry connection attempts.
pub const RETRY_PERIOD: Duration = Duration::from_secs(1);

/// Sleep between orchestrator iterations to bound CPU usage.
pub const PACING_SLEEP: Duration = Duration::from_millis(1);

/// Name of the reported twin property carrying the occupancy boolean.
pub const OCCUPANCY_PROPERTY: &str = "ParkingBayOccupied";
