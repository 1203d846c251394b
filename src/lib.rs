#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod bus;
pub mod calibration;
pub mod config;
pub mod device;
pub mod interface;
pub mod registers;
pub mod sample;
pub mod scheduler;
pub mod sensors;
pub mod session;
pub mod sink;

// Re-export main types
pub use bus::RegisterBus;
pub use calibration::{
    CalibrationConfig, CalibrationOffsets, SelfTestConfig, SelfTestResult, calibrate_offsets,
    run_self_test,
};
pub use config::LoggerConfig;
pub use device::{Iam20380Driver, Identity};
pub use interface::I2cInterface;
pub use sample::{PhysicalSample, RawSample, Timestamp};
pub use scheduler::{RunState, RunSummary, SamplerConfig, SamplingScheduler, SchedulerState};
pub use sensors::{GyroConfig, GyroDlpf, GyroFullScale, TemperatureConversion};
pub use session::{RuntimeContext, Session};
pub use sink::{CsvSink, OutputSink};

/// IAM-20380 I2C address when AD0 pin is high (default: 0x69)
pub const I2C_ADDRESS_AD0_HIGH: u8 = 0x69;

/// IAM-20380 I2C address when AD0 pin is low (alternative: 0x68)
pub const I2C_ADDRESS_AD0_LOW: u8 = 0x68;

/// Expected value of `WHO_AM_I` register
pub const WHO_AM_I_VALUE: u8 = 0xFA;

/// Driver errors
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    /// Communication error with the device
    #[error("bus transaction failed: {0:?}")]
    Bus(E),
    /// `WHO_AM_I` read as zero: nothing answered at the configured address
    #[error("no response from device (WHO_AM_I = 0x00), check wiring and I2C address")]
    NoResponse,
    /// Invalid configuration parameter
    #[error("invalid configuration")]
    InvalidConfig,
    /// Writing or flushing the output sink failed
    #[error("output sink failed: {0}")]
    Sink(#[source] std::io::Error),
    /// The sampling scheduler has already run and cannot be restarted
    #[error("sampling scheduler already started")]
    AlreadyStarted,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}
