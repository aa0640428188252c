#![allow(async_fn_in_trait)]

use embedded_hal::digital::PinState;

use crate::config;

pub mod ultrasonic;

/// The trigger/echo pin could not be acquired in the requested direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinUnavailable;

/// A single GPIO pin that can be reacquired as a driven output or as an
/// input, the way a three-wire ultrasonic sensor shares one signal line.
pub trait TriggerEchoPin {
    fn open_as_output(&mut self, initial: PinState) -> Result<(), PinUnavailable>;
    fn open_as_input(&mut self) -> Result<(), PinUnavailable>;
    fn set_level(&mut self, level: PinState);
    fn level(&mut self) -> PinState;
    fn close(&mut self);
}

/// Outcome of one distance measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DistanceSample {
    /// Measured distance in centimeters.
    Measured(f32),
    /// No falling edge observed within the poll ceiling. A timeout, not a
    /// failure.
    NoEcho,
    /// The pin could not be acquired.
    Unavailable,
}

impl DistanceSample {
    /// Collapses the sample into the centimeter value fed to classification.
    /// The sentinels deliberately pass through the same thresholds: no echo
    /// reads as far away, an unavailable sensor reads as occupied.
    pub fn centimeters(self) -> f32 {
        match self {
            DistanceSample::Measured(cm) => cm,
            DistanceSample::NoEcho => config::NO_ECHO_CM,
            DistanceSample::Unavailable => config::UNAVAILABLE_CM,
        }
    }
}

pub trait DistanceSource {
    async fn measure(&mut self) -> DistanceSample;
}
