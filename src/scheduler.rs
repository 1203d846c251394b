//! Fixed-rate sampling loop
//!
//! The scheduler acquires a raw sample, converts it, stamps it with wall-clock
//! time, hands it to the sink and then sleeps until the next slot. Slots are
//! measured from a monotonic clock anchored at loop start: after `n` samples
//! the loop waits until `n * period` has elapsed. An iteration that overruns
//! its slot is not compensated; the next comparison simply finds less (or no)
//! time left.
//!
//! ```text
//! Idle --run()--> Running --stop flag / sample limit / bus error--> Stopped
//! ```
//!
//! `Stopped` is terminal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use device_driver::RegisterInterface;
use log::{debug, info, warn};

use crate::Error;
use crate::sample::{PhysicalSample, Timestamp};
use crate::session::RuntimeContext;
use crate::sink::OutputSink;

/// Shared stop flag
///
/// Starts out running. [`request_stop`](Self::request_stop) may be called from
/// any thread (typically a signal handler); the flag is never reset.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    stop: Arc<AtomicBool>,
}

impl RunState {
    /// Create a new flag in the running state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the sampling loop to stop at its next iteration boundary
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Not started
    Idle,
    /// Sampling loop active
    Running,
    /// Loop has exited; terminal
    Stopped,
}

/// Sampling loop parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Target sample period
    pub period: Duration,
    /// Flush the sink every this many samples
    pub flush_interval: u64,
    /// Stop after this many samples
    pub max_samples: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(1),
            flush_interval: 100,
            max_samples: None,
        }
    }
}

impl SamplerConfig {
    /// Default configuration at the given rate
    ///
    /// Returns `None` for a rate of zero.
    #[must_use]
    pub fn from_rate_hz(rate_hz: u32) -> Option<Self> {
        if rate_hz == 0 {
            return None;
        }
        Some(Self {
            period: Duration::from_nanos(1_000_000_000 / u64::from(rate_hz)),
            ..Self::default()
        })
    }
}

/// What happened during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Records appended to the sink
    pub samples: u64,
    /// Periodic flushes requested
    pub flushes: u64,
    /// Iterations that finished after their slot had already passed
    pub overruns: u64,
    /// Largest amount by which an iteration missed its slot
    pub max_lag: Duration,
    /// Monotonic time from loop start to exit
    pub elapsed: Duration,
}

/// Time left until `target`, if any
///
/// Returns `None` when the target has already been reached or passed.
#[must_use]
pub fn compensation(target: Duration, elapsed: Duration) -> Option<Duration> {
    target.checked_sub(elapsed).filter(|remaining| !remaining.is_zero())
}

/// Elapsed-time accounting against a monotonic anchor
struct Pacer {
    start: Instant,
    period: Duration,
    overruns: u64,
    max_lag: Duration,
}

impl Pacer {
    fn start(period: Duration) -> Self {
        Self {
            start: Instant::now(),
            period,
            overruns: 0,
            max_lag: Duration::ZERO,
        }
    }

    /// Ideal elapsed time after `count` samples, at nanosecond resolution
    fn target(&self, count: u64) -> Duration {
        let nanos = self.period.as_nanos().saturating_mul(u128::from(count));
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Sleep until slot `count` ends, or record the overrun
    fn pace(&mut self, count: u64) {
        let target = self.target(count);
        let elapsed = self.start.elapsed();
        match compensation(target, elapsed) {
            Some(remaining) => std::thread::sleep(remaining),
            None if elapsed > target => {
                let lag = elapsed - target;
                self.overruns += 1;
                self.max_lag = self.max_lag.max(lag);
            }
            None => {}
        }
    }
}

/// Drives the acquire / stamp / emit / pace loop
#[derive(Debug)]
pub struct SamplingScheduler {
    config: SamplerConfig,
    state: SchedulerState,
}

impl SamplingScheduler {
    /// Create an idle scheduler
    #[must_use]
    pub const fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            state: SchedulerState::Idle,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Loop configuration
    #[must_use]
    pub const fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Run the sampling loop until stopped
    ///
    /// The stop flag is checked once at the top of every iteration, so the
    /// iteration in progress when a stop is requested still completes. Each
    /// sample is fully converted before it is appended.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyStarted`] if the scheduler is not idle
    /// - [`Error::InvalidConfig`] for a zero period or flush interval
    /// - a bus error if an acquisition fails (fatal, nothing is appended)
    /// - [`Error::Sink`] if the sink rejects a record or a flush
    ///
    /// The scheduler is `Stopped` after any return.
    pub fn run<I, S>(
        &mut self,
        context: &mut RuntimeContext<I>,
        sink: &mut S,
    ) -> Result<RunSummary, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
        S: OutputSink,
    {
        if self.state != SchedulerState::Idle {
            return Err(Error::AlreadyStarted);
        }
        if self.config.period.is_zero() || self.config.flush_interval == 0 {
            self.state = SchedulerState::Stopped;
            return Err(Error::InvalidConfig);
        }

        self.state = SchedulerState::Running;
        let result = self.sample_loop(context, sink);
        self.state = SchedulerState::Stopped;

        match &result {
            Ok(summary) => {
                info!(
                    "Sampling stopped after {} samples in {:.3}s",
                    summary.samples,
                    summary.elapsed.as_secs_f64()
                );
                if summary.overruns > 0 {
                    warn!(
                        "{} iterations overran the {:?} period (worst lag {:?})",
                        summary.overruns, self.config.period, summary.max_lag
                    );
                }
            }
            Err(_) => warn!("Sampling aborted by a fatal error"),
        }
        result
    }

    fn sample_loop<I, S>(
        &self,
        context: &mut RuntimeContext<I>,
        sink: &mut S,
    ) -> Result<RunSummary, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
        S: OutputSink,
    {
        let scale = context.driver.gyro_scale();
        let temperature = *context.driver.temperature_conversion();
        let mut summary = RunSummary::default();
        let mut pacer = Pacer::start(self.config.period);

        debug!(
            "Sampling at {:?} period, scale {} LSB/(°/s)",
            self.config.period, scale
        );

        while !context.run_state.should_stop() {
            if self
                .config
                .max_samples
                .is_some_and(|limit| summary.samples >= limit)
            {
                break;
            }

            let raw = context.driver.read_raw_sample()?;
            let sample = PhysicalSample::from_raw(
                raw,
                scale,
                &temperature,
                &context.offsets,
                Timestamp::now(),
            );
            sink.append(&sample).map_err(Error::Sink)?;
            summary.samples += 1;

            pacer.pace(summary.samples);

            if summary.samples % self.config.flush_interval == 0 {
                sink.flush().map_err(Error::Sink)?;
                summary.flushes += 1;
            }
        }

        summary.overruns = pacer.overruns;
        summary.max_lag = pacer.max_lag;
        summary.elapsed = pacer.start.elapsed();
        Ok(summary)
    }
}
