//! Logger configuration
//!
//! [`LoggerConfig`] collects everything an operator can choose for a run.
//! The procedure parameters derived from it keep their own defaults in
//! [`CalibrationConfig`] and [`SelfTestConfig`].

use std::path::PathBuf;

use crate::I2C_ADDRESS_AD0_HIGH;
use crate::calibration::{CalibrationConfig, SelfTestConfig};
use crate::scheduler::SamplerConfig;

/// Run-level configuration for the gyro logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// I2C bus device node
    pub bus_path: PathBuf,
    /// 7-bit device address
    pub address: u8,
    /// Target output rate in Hz
    pub rate_hz: u32,
    /// Samples averaged for offset calibration
    pub calibration_samples: u16,
    /// Flush the output every this many samples
    pub flush_interval: u64,
    /// Stop after this many samples
    pub max_samples: Option<u64>,
    /// Directory the data file is created in
    pub output_dir: PathBuf,
    /// Run the self-test before calibration
    pub self_test: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            bus_path: PathBuf::from("/dev/i2c-1"),
            address: I2C_ADDRESS_AD0_HIGH,
            rate_hz: 1_000,
            calibration_samples: 200,
            flush_interval: 100,
            max_samples: None,
            output_dir: PathBuf::from("."),
            self_test: true,
        }
    }
}

impl LoggerConfig {
    /// Sampling loop parameters
    ///
    /// Returns `None` if the rate or flush interval is zero.
    #[must_use]
    pub fn sampler_config(&self) -> Option<SamplerConfig> {
        if self.flush_interval == 0 {
            return None;
        }
        let mut config = SamplerConfig::from_rate_hz(self.rate_hz)?;
        config.flush_interval = self.flush_interval;
        config.max_samples = self.max_samples;
        Some(config)
    }

    /// Offset calibration parameters
    #[must_use]
    pub fn calibration_config(&self) -> CalibrationConfig {
        CalibrationConfig {
            samples: self.calibration_samples,
            ..CalibrationConfig::default()
        }
    }

    /// Self-test parameters
    #[must_use]
    pub fn self_test_config(&self) -> SelfTestConfig {
        SelfTestConfig {
            enabled: self.self_test,
            ..SelfTestConfig::default()
        }
    }
}
