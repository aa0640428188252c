//! Ultrasonic ranging over a single shared trigger/echo pin. The echo is
//! captured by a bounded busy-poll because no edge-interrupt primitive is
//! assumed available; the poll ceiling bounds the worst-case latency of one
//! measurement.

use embassy_time::{Instant, Timer};
use embedded_hal::digital::PinState;

use super::{DistanceSample, DistanceSource, TriggerEchoPin};
use crate::config;
use crate::interval::{self, TimeInterval};

pub struct UltrasonicSensor<P: TriggerEchoPin> {
    pin: P,
}

impl<P: TriggerEchoPin> UltrasonicSensor<P> {
    pub fn new(pin: P) -> Self {
        UltrasonicSensor { pin }
    }
}

impl<P: TriggerEchoPin> DistanceSource for UltrasonicSensor<P> {
    async fn measure(&mut self) -> DistanceSample {
        if self.pin.open_as_output(PinState::High).is_err() {
            error!("Could not open ultrasonic trigger output");
            return DistanceSample::Unavailable;
        }
        Timer::after_micros(config::TRIGGER_HOLD_US).await;
        self.pin.set_level(PinState::Low);
        self.pin.close();

        if self.pin.open_as_input().is_err() {
            error!("Could not open ultrasonic echo input");
            return DistanceSample::Unavailable;
        }

        let mut start = None;
        let mut end = None;
        for i in 0..config::POLL_CEILING {
            match self.pin.level() {
                PinState::High => {
                    if start.is_none() {
                        start = Some(Instant::now());
                    }
                }
                PinState::Low => {
                    if start.is_some() {
                        end = Some(Instant::now());
                        debug!("Echo captured after {} polls", i);
                        break;
                    }
                }
            }
        }
        self.pin.close();

        let (Some(start), Some(end)) = (start, end) else {
            return DistanceSample::NoEcho;
        };

        let elapsed = TimeInterval::since_boot(end).sub(TimeInterval::since_boot(start));
        DistanceSample::Measured(interval::pulse_width_to_cm(elapsed))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::sensor::PinUnavailable;

    /// Pin that replays a scripted level sequence and records every
    /// operation. Once the script is exhausted the line stays low.
    #[derive(Default)]
    struct ScriptedPin {
        script: Vec<PinState>,
        cursor: usize,
        fail_output: bool,
        fail_input: bool,
        polls: u32,
        opened_output: u32,
        opened_input: u32,
        closed: u32,
        trigger_levels: Vec<PinState>,
    }

    impl ScriptedPin {
        fn with_script(script: Vec<PinState>) -> Self {
            ScriptedPin { script, ..Default::default() }
        }
    }

    impl TriggerEchoPin for ScriptedPin {
        fn open_as_output(&mut self, initial: PinState) -> Result<(), PinUnavailable> {
            if self.fail_output {
                return Err(PinUnavailable);
            }
            self.opened_output += 1;
            self.trigger_levels.push(initial);
            Ok(())
        }

        fn open_as_input(&mut self) -> Result<(), PinUnavailable> {
            if self.fail_input {
                return Err(PinUnavailable);
            }
            self.opened_input += 1;
            Ok(())
        }

        fn set_level(&mut self, level: PinState) {
            self.trigger_levels.push(level);
        }

        fn level(&mut self) -> PinState {
            self.polls += 1;
            let level = self.script.get(self.cursor).copied().unwrap_or(PinState::Low);
            self.cursor += 1;
            level
        }

        fn close(&mut self) {
            self.closed += 1;
        }
    }

    #[tokio::test]
    async fn unavailable_when_output_acquisition_fails() {
        let pin = ScriptedPin {
            fail_output: true,
            ..Default::default()
        };
        let mut sensor = UltrasonicSensor::new(pin);
        assert_eq!(sensor.measure().await, DistanceSample::Unavailable);
        assert_eq!(sensor.pin.opened_input, 0);
        assert_eq!(sensor.pin.polls, 0);
    }

    #[tokio::test]
    async fn unavailable_when_input_acquisition_fails() {
        let pin = ScriptedPin {
            fail_input: true,
            ..Default::default()
        };
        let mut sensor = UltrasonicSensor::new(pin);
        assert_eq!(sensor.measure().await, DistanceSample::Unavailable);
        assert_eq!(sensor.pin.opened_output, 1);
        assert_eq!(sensor.pin.polls, 0);
    }

    #[tokio::test]
    async fn no_echo_when_line_never_rises() {
        let pin = ScriptedPin::with_script(vec![]);
        let mut sensor = UltrasonicSensor::new(pin);
        assert_eq!(sensor.measure().await, DistanceSample::NoEcho);
        assert_eq!(sensor.pin.polls, config::POLL_CEILING);
    }

    #[tokio::test]
    async fn no_echo_when_line_never_falls_back() {
        let script = vec![PinState::Low, PinState::High];
        let mut pin = ScriptedPin::with_script(script);
        // stay high after the rising edge
        pin.script.extend(core::iter::repeat_n(PinState::High, config::POLL_CEILING as usize));
        let mut sensor = UltrasonicSensor::new(pin);
        assert_eq!(sensor.measure().await, DistanceSample::NoEcho);
        assert_eq!(sensor.pin.polls, config::POLL_CEILING);
    }

    #[tokio::test]
    async fn measures_once_edge_pair_is_captured() {
        let script = vec![
            PinState::Low,
            PinState::Low,
            PinState::High,
            PinState::High,
            PinState::High,
            PinState::Low,
        ];
        let mut sensor = UltrasonicSensor::new(ScriptedPin::with_script(script));
        let sample = sensor.measure().await;
        // Three polls of host time between the edges, far below the 58 us
        // a single centimeter takes.
        assert!(matches!(sample, DistanceSample::Measured(cm) if (0.0..50.0).contains(&cm)));
        // short-circuits at the falling edge instead of exhausting the ceiling
        assert_eq!(sensor.pin.polls, 6);
        // trigger pulse: driven high on open, then dropped low
        assert_eq!(sensor.pin.trigger_levels, vec![PinState::High, PinState::Low]);
        // both acquisitions released
        assert_eq!(sensor.pin.closed, 2);
    }

    #[test]
    fn sentinels_collapse_to_the_documented_centimeters() {
        assert_eq!(DistanceSample::NoEcho.centimeters(), config::NO_ECHO_CM);
        assert_eq!(DistanceSample::Unavailable.centimeters(), config::UNAVAILABLE_CM);
        assert_eq!(DistanceSample::Measured(3.5).centimeters(), 3.5);
    }
}
