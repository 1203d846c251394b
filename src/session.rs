//! Runtime state and scoped cleanup
//!
//! [`RuntimeContext`] holds everything the sampling loop needs: the driver
//! (which owns the bus handle), the offsets computed at startup and the
//! stop flag. [`Session`] pairs it with the output sink and guarantees that
//! both are released exactly once on every exit path: normal termination,
//! a fatal bus error, cancellation, or an early return.
//!
//! [`start`] runs the startup sequence that produces a ready session:
//!
//! ```text
//! identity -> create sink -> reset/wake -> max performance
//!          -> self-test (optional) -> offset calibration -> max sample rate
//! ```
//!
//! Nothing is created unless the identity check succeeds. Once the sink
//! exists, any later failure still closes it and releases the bus.

use std::io;

use device_driver::RegisterInterface;
use embedded_hal::delay::DelayNs;
use log::{error, info};

use crate::Error;
use crate::calibration::{CalibrationOffsets, calibrate_offsets, run_self_test};
use crate::config::LoggerConfig;
use crate::device::{Iam20380Driver, Identity};
use crate::scheduler::{RunState, RunSummary, SamplingScheduler};
use crate::sink::OutputSink;

/// State shared by the calibration and sampling phases
pub struct RuntimeContext<I> {
    /// Sensor driver; owns the bus handle
    pub driver: Iam20380Driver<I>,
    /// Offsets subtracted from every sample
    pub offsets: CalibrationOffsets,
    /// Cooperative stop flag
    pub run_state: RunState,
}

impl<I> RuntimeContext<I> {
    /// Create a context with zero offsets
    #[must_use]
    pub fn new(driver: Iam20380Driver<I>, run_state: RunState) -> Self {
        Self {
            driver,
            offsets: CalibrationOffsets::default(),
            run_state,
        }
    }
}

/// Owns the bus (through the context) and the sink for the life of a run
///
/// Dropping the session closes the sink if it is still open and then drops
/// the driver, which closes the bus. A failure to close the sink is logged
/// and does not prevent the bus from being released.
pub struct Session<I, S: OutputSink> {
    context: RuntimeContext<I>,
    sink: S,
    sink_closed: bool,
}

impl<I, S: OutputSink> Session<I, S> {
    /// Take ownership of an initialised context and an open sink
    #[must_use]
    pub const fn new(context: RuntimeContext<I>, sink: S) -> Self {
        Self {
            context,
            sink,
            sink_closed: false,
        }
    }

    /// Runtime context
    #[must_use]
    pub const fn context(&self) -> &RuntimeContext<I> {
        &self.context
    }

    /// Mutable runtime context
    pub const fn context_mut(&mut self) -> &mut RuntimeContext<I> {
        &mut self.context
    }

    /// Output sink
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Run the sampling loop against this session's context and sink
    ///
    /// # Errors
    ///
    /// See [`SamplingScheduler::run`].
    pub fn run(&mut self, scheduler: &mut SamplingScheduler) -> Result<RunSummary, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        scheduler.run(&mut self.context, &mut self.sink)
    }

    /// Close the sink and release the bus
    ///
    /// # Errors
    ///
    /// Returns the sink's close error. The bus is released regardless.
    pub fn close(mut self) -> std::io::Result<()> {
        self.close_sink()
    }

    fn close_sink(&mut self) -> std::io::Result<()> {
        if self.sink_closed {
            return Ok(());
        }
        self.sink_closed = true;
        let result = self.sink.close();
        if result.is_ok() {
            info!("Data file closed");
        }
        result
    }
}

impl<I, S: OutputSink> Drop for Session<I, S> {
    fn drop(&mut self) {
        if let Err(e) = self.close_sink() {
            error!("Failed to close data file: {e}");
        }
        // The driver field is dropped right after this
        info!("Releasing bus");
    }
}

/// Bring the device from power-on to a session ready for sampling
///
/// `make_sink` is called only after the identity check has passed. If any
/// step after that fails, the returned error is produced after the sink has
/// been closed and the bus released.
///
/// # Errors
///
/// - [`Error::InvalidConfig`] if `config` has a zero rate or flush interval
///   (checked before any bus traffic)
/// - [`Error::NoResponse`] or a bus error from the identity check
/// - [`Error::Sink`] if the sink cannot be created
/// - a bus error from reset, configuration, self-test or calibration
pub fn start<I, D, S, F>(
    mut driver: Iam20380Driver<I>,
    delay: &mut D,
    config: &LoggerConfig,
    run_state: RunState,
    make_sink: F,
) -> Result<Session<I, S>, Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
    D: DelayNs,
    S: OutputSink,
    F: FnOnce() -> io::Result<S>,
{
    if config.sampler_config().is_none() {
        return Err(Error::InvalidConfig);
    }

    if driver.check_identity()? == Identity::Expected {
        info!("IAM-20380 found at 0x{:02X}", config.address);
    }

    let sink = make_sink().map_err(Error::Sink)?;
    let mut session = Session::new(RuntimeContext::new(driver, run_state), sink);

    let context = session.context_mut();
    context.driver.reset_and_wake(delay)?;
    context.driver.configure_max_performance()?;

    let self_test = config.self_test_config();
    if self_test.enabled {
        run_self_test(&mut context.driver, delay, &self_test)?;
    }

    context.offsets = calibrate_offsets(&mut context.driver, delay, &config.calibration_config())?;
    context.driver.set_max_sample_rate()?;

    Ok(session)
}
