#![allow(async_fn_in_trait)]

//! Telemetry client seam and the fixed-backoff connection manager.

use embassy_time::{Duration, Instant};

use crate::interval::TimeInterval;

/// The telemetry stack could not be brought up at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryInitError;

/// The remote telemetry endpoint. Connection-status changes are delivered
/// out of band: the concrete client writes the shared connectivity flag
/// (`MonitorState::set_connected`) whenever the session state flips.
pub trait TelemetryClient {
    /// One-time initialization of the telemetry stack. Failure aborts
    /// startup.
    async fn initialize(&mut self) -> Result<(), TelemetryInitError>;

    /// Sets up the client session. Safe to call when the session is already
    /// up, in which case it has no effect. Returns whether the session is
    /// usable.
    async fn setup(&mut self) -> bool;

    /// Sends a remote-readable reported property. Fire-and-forget.
    async fn report_property(&mut self, name: &str, value: i32);

    /// Must run once per orchestrator iteration while the session is up;
    /// starving it silently stalls the protocol exchange.
    async fn run_periodic_maintenance(&mut self);
}

/// Re-attempts session setup on a fixed backoff period. Every attempt,
/// successful or not, pushes the next eligible attempt to `now + period`.
#[derive(Debug)]
pub struct ConnectionManager {
    retry_period: TimeInterval,
    next_attempt: TimeInterval,
    client_ready: bool,
}

impl ConnectionManager {
    pub fn new(retry_period: Duration) -> Self {
        ConnectionManager {
            retry_period: TimeInterval::from_duration(retry_period),
            // the first attempt is due immediately
            next_attempt: TimeInterval::ZERO,
            client_ready: false,
        }
    }

    pub fn client_ready(&self) -> bool {
        self.client_ready
    }

    pub async fn service<C: TelemetryClient>(&mut self, client: &mut C) {
        let now = TimeInterval::since_boot(Instant::now());
        if now.gt(self.next_attempt) {
            self.client_ready = client.setup().await;
            if !self.client_ready {
                debug!("Telemetry setup failed, backing off");
            }
            self.next_attempt = TimeInterval::since_boot(Instant::now()).add(self.retry_period);
        }
        if self.client_ready {
            client.run_periodic_maintenance().await;
        }
    }
}
