//! Distance classification and debounced occupancy reporting.

use crate::config;
use crate::net::cloud::{TelemetryClient, TelemetryInitError};
use crate::shared::MonitorState;

/// Distance tier, only used to pick the traffic indicator color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tier {
    Clear,
    Near,
    Occupied,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Classification {
    pub occupied: bool,
    pub tier: Tier,
}

/// Thresholds are strict greater-than at the upper bound: exactly 8 cm is
/// near, not clear. The sentinel distances flow through the same comparison,
/// so an unavailable sensor (-1 cm) classifies as occupied.
pub fn classify(cm: f32) -> Classification {
    if cm > config::CLEAR_THRESHOLD_CM {
        Classification { occupied: false, tier: Tier::Clear }
    } else if cm > config::OCCUPIED_THRESHOLD_CM {
        Classification { occupied: true, tier: Tier::Near }
    } else {
        Classification { occupied: true, tier: Tier::Occupied }
    }
}

/// Emits the occupancy boolean to the telemetry endpoint only on change.
/// At-most-once: while disconnected a changed value is dropped with a
/// warning, never queued or retried.
#[derive(Debug, Default)]
pub struct OccupancyReporter {
    last: Option<bool>,
}

impl OccupancyReporter {
    pub fn new() -> Self {
        OccupancyReporter { last: None }
    }

    pub async fn report<C: TelemetryClient>(&mut self, occupied: bool, state: &MonitorState, client: &mut C) {
        let changed = self.last != Some(occupied);
        self.last = Some(occupied);
        if !changed {
            return;
        }
        if state.is_connected() {
            client.report_property(config::OCCUPANCY_PROPERTY, occupied as i32).await;
        } else {
            warn!("Cannot report occupancy change: not connected to the telemetry endpoint");
        }
    }
}
