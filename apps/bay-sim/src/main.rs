//! Host simulation of the parking bay monitor: the real orchestrator, sensor
//! busy-poll and connection manager running against a scripted trigger/echo
//! pin, a flaky simulated telemetry endpoint and log-backed indicators.

use bay_core::bay_monitor;
use bay_core::config;
use bay_core::indicator::{IndicatorColor, IndicatorDriver, IndicatorError, IndicatorRole};
use bay_core::net::cloud::{TelemetryClient, TelemetryInitError};
use bay_core::sensor::{PinUnavailable, TriggerEchoPin};
use bay_core::sensor::ultrasonic::UltrasonicSensor;
use bay_core::shared::MonitorState;
use embassy_executor::{Executor, Spawner};
use embassy_futures::yield_now;
use embassy_time::{Instant, Timer};
use embedded_hal::digital::PinState;
use log::LevelFilter;
use static_cell::StaticCell;

/// How long the simulation runs before a shutdown is requested.
const RUN_SECS: u64 = 30;

/// Setup attempts that fail before the simulated endpoint accepts a session.
const SETUP_FAILURES: u32 = 2;

/// Bay scenario: distance presented to the sensor, changing every few
/// seconds. `None` is an empty bay, too far for an echo to return.
const SCENARIO: [(u64, Option<f32>); 6] = [
    (4, None),        // bay empty
    (2, Some(6.0)),   // car rolling in
    (8, Some(1.5)),   // parked close to the wall
    (2, Some(6.0)),   // backing out
    (4, None),        // empty again
    (6, Some(1.0)),   // next car
];

static MONITOR_STATE: MonitorState = MonitorState::new();
static EXECUTOR: StaticCell<Executor> = StaticCell::new();

/// A trigger/echo line emulated in real time: after the input is reopened,
/// the echo goes high for a pulse whose width encodes the scripted distance
/// (58 us per centimeter round trip).
struct SimPin {
    started: Instant,
    mode: SimPinMode,
}

enum SimPinMode {
    Closed,
    Output,
    Input { opened: Instant },
}

impl SimPin {
    fn new() -> Self {
        SimPin {
            started: Instant::now(),
            mode: SimPinMode::Closed,
        }
    }

    fn scripted_distance(&self) -> Option<f32> {
        let cycle: u64 = SCENARIO.iter().map(|(secs, _)| secs).sum();
        let mut at = self.started.elapsed().as_secs() % cycle;
        for (secs, distance) in SCENARIO {
            if at < secs {
                return distance;
            }
            at -= secs;
        }
        None
    }
}

impl TriggerEchoPin for SimPin {
    fn open_as_output(&mut self, _initial: PinState) -> Result<(), PinUnavailable> {
        self.mode = SimPinMode::Output;
        Ok(())
    }

    fn open_as_input(&mut self) -> Result<(), PinUnavailable> {
        self.mode = SimPinMode::Input { opened: Instant::now() };
        Ok(())
    }

    fn set_level(&mut self, _level: PinState) {}

    fn level(&mut self) -> PinState {
        let SimPinMode::Input { opened } = &self.mode else {
            return PinState::Low;
        };
        let Some(cm) = self.scripted_distance() else {
            return PinState::Low;
        };
        let pulse_start_us = 2;
        let pulse_end_us = pulse_start_us + (cm * config::PULSE_NANOS_PER_CM) as u64 / 1000;
        let elapsed_us = opened.elapsed().as_micros();
        if (pulse_start_us..pulse_end_us).contains(&elapsed_us) {
            PinState::High
        } else {
            PinState::Low
        }
    }

    fn close(&mut self) {
        self.mode = SimPinMode::Closed;
    }
}

/// Telemetry endpoint that refuses the first few session setups, then
/// connects and notifies through the shared connectivity flag.
struct SimTelemetry {
    state: &'static MonitorState,
    failures_left: u32,
}

impl SimTelemetry {
    fn new(state: &'static MonitorState) -> Self {
        SimTelemetry {
            state,
            failures_left: SETUP_FAILURES,
        }
    }
}

impl TelemetryClient for SimTelemetry {
    async fn initialize(&mut self) -> Result<(), TelemetryInitError> {
        log::info!("telemetry> stack initialized");
        Ok(())
    }

    async fn setup(&mut self) -> bool {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            log::info!("telemetry> session setup refused ({} more refusals)", self.failures_left);
            self.state.set_connected(false);
            return false;
        }
        if !self.state.is_connected() {
            log::info!("telemetry> session established");
            self.state.set_connected(true);
        }
        true
    }

    async fn report_property(&mut self, name: &str, value: i32) {
        log::info!("telemetry> reported property {} = {}", name, value);
    }

    async fn run_periodic_maintenance(&mut self) {
        yield_now().await;
    }
}

/// Indicator "hardware" that shows color changes on the console.
struct LogIndicators;

impl IndicatorDriver for LogIndicators {
    fn set_color(&mut self, role: IndicatorRole, color: IndicatorColor) -> Result<(), IndicatorError> {
        log::debug!("indicator> {:?} -> {:?}", role, color);
        Ok(())
    }

    fn close(&mut self) {
        log::info!("indicator> released");
    }
}

#[embassy_executor::task]
async fn monitor_task() {
    let sensor = UltrasonicSensor::new(SimPin::new());
    let client = SimTelemetry::new(&MONITOR_STATE);

    match bay_monitor::new(
        sensor,
        client,
        LogIndicators,
        &MONITOR_STATE,
        config::MEASUREMENT_PERIOD,
        config::RETRY_PERIOD,
    )
    .await
    {
        Ok(monitor) => monitor.run().await,
        Err(err) => log::error!("monitor setup failed: {:?}", err),
    }

    std::process::exit(0);
}

/// Stand-in for the process termination signal: a single flag write after
/// the scripted run time.
#[embassy_executor::task]
async fn shutdown_task() {
    Timer::after_secs(RUN_SECS).await;
    MONITOR_STATE.request_termination();
}

fn spawn_all(spawner: Spawner) {
    spawner.spawn(monitor_task()).unwrap();
    spawner.spawn(shutdown_task()).unwrap();
}

fn main() {
    env_logger::Builder::from_default_env().filter_level(LevelFilter::Debug).init();

    let executor = EXECUTOR.init(Executor::new());
    executor.run(spawn_all);
}
