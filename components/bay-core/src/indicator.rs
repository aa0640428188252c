//! Deterministic mapping from logical monitor state to indicator colors.

use crate::occupancy::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorColor {
    Off,
    Red,
    Green,
    Yellow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorRole {
    Traffic,
    Activity,
    Network,
}

/// Setting a color failed. Indicates a broken indicator resource, not a
/// transient condition, and is fatal to the orchestrator loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndicatorError;

pub trait IndicatorDriver {
    fn set_color(&mut self, role: IndicatorRole, color: IndicatorColor) -> Result<(), IndicatorError>;
    fn close(&mut self);
}

pub struct IndicatorController<D: IndicatorDriver> {
    driver: D,
}

impl<D: IndicatorDriver> IndicatorController<D> {
    pub fn new(driver: D) -> Self {
        IndicatorController { driver }
    }

    /// Network indicator follows connectivity exactly: green when connected,
    /// off otherwise.
    pub fn apply_network(&mut self, connected: bool) -> Result<(), IndicatorError> {
        let color = if connected { IndicatorColor::Green } else { IndicatorColor::Off };
        self.driver.set_color(IndicatorRole::Network, color)
    }

    pub fn apply_traffic(&mut self, tier: Tier) -> Result<(), IndicatorError> {
        let color = match tier {
            Tier::Clear => IndicatorColor::Green,
            Tier::Near => IndicatorColor::Yellow,
            Tier::Occupied => IndicatorColor::Red,
        };
        self.driver.set_color(IndicatorRole::Traffic, color)
    }

    /// Turns the traffic indicator off before releasing the driver, so no
    /// indicator stays lit after process exit.
    pub fn shutdown(mut self) {
        if self.driver.set_color(IndicatorRole::Traffic, IndicatorColor::Off).is_err() {
            warn!("Could not turn off traffic indicator during shutdown");
        }
        self.driver.close();
    }
}
