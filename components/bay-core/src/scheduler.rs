#![allow(async_fn_in_trait)]

//! Cooperative readiness multiplexer: a fixed-capacity table of periodic
//! timers behind a single wait point. Every elapsed period of a ready timer
//! is drained before its handler runs, so a slow handler produces one late
//! dispatch instead of a burst of immediate ones.

use embassy_time::{Duration, Instant, Timer};
use heapless::Vec;

/// Registered timer slots available per scheduler.
pub const MAX_TIMERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// A zero period would keep the wait point permanently ready.
    ZeroPeriod,
    /// No free timer slot left.
    TimerTableFull,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DispatchError<E> {
    /// Nothing registered to wait on; blocking here would never return.
    NoTimers,
    /// A handler reported a fatal condition.
    Handler(E),
}

pub trait TickHandler {
    type Fault;

    async fn on_tick(&mut self, timer: TimerId) -> Result<(), Self::Fault>;
}

struct PeriodicTimer {
    period: Duration,
    next: Instant,
}

impl PeriodicTimer {
    /// Drains every elapsed period so the deadline lands in the future.
    /// Returns how many periods had elapsed.
    fn consume(&mut self, now: Instant) -> u32 {
        let mut fired = 0;
        while self.next <= now {
            self.next += self.period;
            fired += 1;
        }
        fired
    }
}

pub struct Scheduler<const N: usize = MAX_TIMERS> {
    timers: Vec<PeriodicTimer, N>,
}

impl<const N: usize> Scheduler<N> {
    pub fn new() -> Self {
        Scheduler { timers: Vec::new() }
    }

    pub fn register_periodic(&mut self, period: Duration) -> Result<TimerId, SchedulerError> {
        if period.as_ticks() == 0 {
            return Err(SchedulerError::ZeroPeriod);
        }
        let id = TimerId(self.timers.len());
        self.timers
            .push(PeriodicTimer {
                period,
                next: Instant::now() + period,
            })
            .map_err(|_| SchedulerError::TimerTableFull)?;
        Ok(id)
    }

    /// Blocks until the earliest registered deadline, then invokes the
    /// handler once for every timer whose deadline has passed.
    pub async fn wait_and_dispatch<H: TickHandler>(&mut self, handler: &mut H) -> Result<(), DispatchError<H::Fault>> {
        let earliest = self.timers.iter().map(|timer| timer.next).min().ok_or(DispatchError::NoTimers)?;
        Timer::at(earliest).await;

        let now = Instant::now();
        for (index, timer) in self.timers.iter_mut().enumerate() {
            let fired = timer.consume(now);
            if fired == 0 {
                continue;
            }
            if fired > 1 {
                warn!("Timer {} missed {} period(s)", index, fired - 1);
            }
            handler.on_tick(TimerId(index)).await.map_err(DispatchError::Handler)?;
        }
        Ok(())
    }
}

impl<const N: usize> Default for Scheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    struct CountingHandler {
        ticks: Vec<TimerId, 32>,
        delay_first_tick: Option<Duration>,
        fail: bool,
    }

    impl CountingHandler {
        fn new() -> Self {
            CountingHandler {
                ticks: Vec::new(),
                delay_first_tick: None,
                fail: false,
            }
        }
    }

    impl TickHandler for CountingHandler {
        type Fault = &'static str;

        async fn on_tick(&mut self, timer: TimerId) -> Result<(), Self::Fault> {
            if self.fail {
                return Err("handler fault");
            }
            if self.ticks.is_empty() {
                if let Some(delay) = self.delay_first_tick {
                    Timer::after(delay).await;
                }
            }
            let _ = self.ticks.push(timer);
            Ok(())
        }
    }

    #[test]
    fn zero_period_is_a_setup_failure() {
        let mut scheduler: Scheduler = Scheduler::new();
        assert_eq!(
            scheduler.register_periodic(Duration::from_ticks(0)),
            Err(SchedulerError::ZeroPeriod)
        );
    }

    #[test]
    fn timer_table_overflow_is_a_setup_failure() {
        let mut scheduler: Scheduler<1> = Scheduler::new();
        assert!(scheduler.register_periodic(Duration::from_millis(10)).is_ok());
        assert_eq!(
            scheduler.register_periodic(Duration::from_millis(10)),
            Err(SchedulerError::TimerTableFull)
        );
    }

    #[tokio::test]
    async fn waiting_without_timers_fails() {
        let mut scheduler: Scheduler = Scheduler::new();
        let mut handler = CountingHandler::new();
        assert!(matches!(
            scheduler.wait_and_dispatch(&mut handler).await,
            Err(DispatchError::NoTimers)
        ));
    }

    #[tokio::test]
    async fn dispatches_once_per_period() {
        let mut scheduler: Scheduler = Scheduler::new();
        let started = Instant::now();
        let id = scheduler.register_periodic(Duration::from_millis(10)).unwrap();
        let mut handler = CountingHandler::new();

        for _ in 0..3 {
            scheduler.wait_and_dispatch(&mut handler).await.unwrap();
        }

        assert_eq!(handler.ticks.len(), 3);
        assert!(handler.ticks.iter().all(|tick| *tick == id));
        assert!(Instant::now() - started >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn slow_handler_does_not_cause_a_dispatch_burst() {
        let mut scheduler: Scheduler = Scheduler::new();
        scheduler.register_periodic(Duration::from_millis(10)).unwrap();
        let mut handler = CountingHandler::new();
        handler.delay_first_tick = Some(Duration::from_millis(45));

        // Each wait drains the backlog and yields exactly one invocation.
        for expected in 1..=3 {
            scheduler.wait_and_dispatch(&mut handler).await.unwrap();
            assert_eq!(handler.ticks.len(), expected);
        }
    }

    #[tokio::test]
    async fn handler_fault_propagates() {
        let mut scheduler: Scheduler = Scheduler::new();
        scheduler.register_periodic(Duration::from_millis(1)).unwrap();
        let mut handler = CountingHandler::new();
        handler.fail = true;

        assert_eq!(
            scheduler.wait_and_dispatch(&mut handler).await,
            Err(DispatchError::Handler("handler fault"))
        );
    }
}
