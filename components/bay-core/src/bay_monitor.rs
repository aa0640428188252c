//! The orchestrator: one cooperative loop tying together the measurement
//! timer, the occupancy reporter, the indicators and the telemetry
//! connection. One iteration = dispatch scheduler events, refresh the
//! network indicator, service the connection, pace.

use embassy_time::{Duration, Timer};

use crate::config;
use crate::indicator::{IndicatorController, IndicatorDriver, IndicatorError};
use crate::net::cloud::{ConnectionManager, TelemetryClient, TelemetryInitError};
use crate::occupancy::{self, OccupancyReporter};
use crate::scheduler::{DispatchError, Scheduler, SchedulerError, TickHandler, TimerId};
use crate::sensor::DistanceSource;
use crate::shared::MonitorState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupError {
    Scheduler(SchedulerError),
    Telemetry(TelemetryInitError),
}

impl From<SchedulerError> for SetupError {
    fn from(err: SchedulerError) -> Self {
        SetupError::Scheduler(err)
    }
}

impl From<TelemetryInitError> for SetupError {
    fn from(err: TelemetryInitError) -> Self {
        SetupError::Telemetry(err)
    }
}

/// Fatal condition that terminates the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopFault {
    Indicator(IndicatorError),
}

impl From<IndicatorError> for LoopFault {
    fn from(err: IndicatorError) -> Self {
        LoopFault::Indicator(err)
    }
}

/// Work performed on every measurement tick.
struct SensingWork<'a, S, C, D>
where
    S: DistanceSource,
    C: TelemetryClient,
    D: IndicatorDriver,
{
    sensor: S,
    reporter: OccupancyReporter,
    indicators: IndicatorController<D>,
    client: C,
    connection: ConnectionManager,
    state: &'a MonitorState,
}

impl<S, C, D> TickHandler for SensingWork<'_, S, C, D>
where
    S: DistanceSource,
    C: TelemetryClient,
    D: IndicatorDriver,
{
    type Fault = LoopFault;

    async fn on_tick(&mut self, _timer: TimerId) -> Result<(), LoopFault> {
        let sample = self.sensor.measure().await;
        let cm = sample.centimeters();
        let classification = occupancy::classify(cm);
        self.reporter.report(classification.occupied, self.state, &mut self.client).await;
        self.indicators.apply_traffic(classification.tier)?;
        debug!("Approx {} cm", cm);
        Ok(())
    }
}

pub struct Monitor<'a, S, C, D>
where
    S: DistanceSource,
    C: TelemetryClient,
    D: IndicatorDriver,
{
    scheduler: Scheduler,
    work: SensingWork<'a, S, C, D>,
}

/// Builds the monitor. The indicators are taken over first so that a setup
/// failure still runs their shutdown path: no light stays lit after an
/// aborted startup.
pub async fn new<'a, S, C, D>(
    sensor: S,
    mut client: C,
    driver: D,
    state: &'a MonitorState,
    measurement_period: Duration,
    retry_period: Duration,
) -> Result<Monitor<'a, S, C, D>, SetupError>
where
    S: DistanceSource,
    C: TelemetryClient,
    D: IndicatorDriver,
{
    let indicators = IndicatorController::new(driver);

    let mut scheduler = Scheduler::new();
    if let Err(err) = scheduler.register_periodic(measurement_period) {
        indicators.shutdown();
        return Err(err.into());
    }

    if let Err(err) = client.initialize().await {
        indicators.shutdown();
        return Err(err.into());
    }

    Ok(Monitor {
        scheduler,
        work: SensingWork {
            sensor,
            reporter: OccupancyReporter::new(),
            indicators,
            client,
            connection: ConnectionManager::new(retry_period),
            state,
        },
    })
}

impl<S, C, D> Monitor<'_, S, C, D>
where
    S: DistanceSource,
    C: TelemetryClient,
    D: IndicatorDriver,
{
    /// Runs until termination is requested or a fatal fault occurs, then
    /// performs the ordered shutdown: indicators off and released first,
    /// scheduler resources after.
    pub async fn run(mut self) {
        info!("Parking bay monitor starting");

        while !self.work.state.termination_requested() {
            match self.scheduler.wait_and_dispatch(&mut self.work).await {
                Ok(()) => {}
                Err(DispatchError::NoTimers) => {
                    error!("Scheduler wait failed: no registered timers");
                    break;
                }
                Err(DispatchError::Handler(fault)) => {
                    error!("Fatal fault in measurement tick: {:?}", fault);
                    break;
                }
            }

            if self.work.indicators.apply_network(self.work.state.is_connected()).is_err() {
                error!("Set color for network status indicator failed");
                break;
            }

            self.work.connection.service(&mut self.work.client).await;

            Timer::after(config::PACING_SLEEP).await;
        }

        self.work.indicators.shutdown();
        drop(self.scheduler);
        info!("Parking bay monitor exiting");
    }
}
