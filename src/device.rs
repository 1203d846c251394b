//! High-level driver API for the IAM-20380
//!
//! This module maps the named device operations (identify, reset, configure,
//! read a sample, toggle self-test) onto ordered register transactions.
//!
//! Mode-changing writes need a settle delay before the device output is
//! valid. Operations that change mode take a delay provider and wait the
//! datasheet time themselves; configuration writes that do not change the
//! operating mode do not wait.

use device_driver::RegisterInterface;
use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::bus::RegisterBus;
use crate::registers::{RegisterDevice, SAMPLE_SEQUENCE};
use crate::sample::RawSample;
use crate::sensors::{GyroConfig, TemperatureConversion};
use crate::{Error, WHO_AM_I_VALUE};

/// Delay after setting `DEVICE_RESET`
const RESET_SETTLE_MS: u32 = 100;

/// Delay after selecting the clock source
const WAKE_SETTLE_MS: u32 = 10;

/// Delay after taking all gyro axes out of standby
const AXES_SETTLE_MS: u32 = 200;

/// PLL with X axis gyroscope reference
const CLKSEL_PLL_X: u8 = 1;

/// Outcome of the identity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// `WHO_AM_I` matched [`WHO_AM_I_VALUE`]
    Expected,
    /// A device answered with a different, non-zero identity
    ///
    /// It may be a different revision and still be operable.
    Unexpected(u8),
}

/// Main driver for the IAM-20380
pub struct Iam20380Driver<I> {
    device: RegisterDevice<I>,
    gyro_config: GyroConfig,
    temperature: TemperatureConversion,
}

impl<I> Iam20380Driver<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Create a new IAM-20380 driver instance
    ///
    /// No bus traffic happens here. Call [`check_identity`](Self::check_identity)
    /// and [`reset_and_wake`](Self::reset_and_wake) before using the device.
    #[must_use]
    pub fn new(interface: I) -> Self {
        Self {
            device: RegisterDevice::new(interface),
            gyro_config: GyroConfig::default(),
            temperature: TemperatureConversion::default(),
        }
    }

    /// Read the `WHO_AM_I` register
    ///
    /// Should return 0xFA for a valid IAM-20380
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn identify(&mut self) -> Result<u8, Error<I::Error>> {
        let reg = self.device.who_am_i().read()?;
        Ok(reg.who_am_i())
    }

    /// Read `WHO_AM_I` and classify the answer
    ///
    /// A zero identity means nothing is answering and is a hard fault. Any
    /// other mismatch is logged and reported as [`Identity::Unexpected`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResponse`] if the identity reads as zero, or a bus
    /// error if communication fails.
    pub fn check_identity(&mut self) -> Result<Identity, Error<I::Error>> {
        match self.identify()? {
            WHO_AM_I_VALUE => Ok(Identity::Expected),
            0 => Err(Error::NoResponse),
            other => {
                warn!(
                    "Unexpected WHO_AM_I value 0x{other:02X} (expected 0x{WHO_AM_I_VALUE:02X})"
                );
                Ok(Identity::Unexpected(other))
            }
        }
    }

    /// Reset the device and wake it on the PLL clock
    ///
    /// Writes `DEVICE_RESET`, waits 100 ms, selects the PLL clock source and
    /// waits a further 10 ms.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn reset_and_wake<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: DelayNs,
    {
        self.device.pwr_mgmt_1().write(|w| {
            w.set_device_reset(true);
        })?;
        delay.delay_ms(RESET_SETTLE_MS);

        self.device.pwr_mgmt_1().write(|w| {
            w.set_clksel(CLKSEL_PLL_X);
        })?;
        delay.delay_ms(WAKE_SETTLE_MS);

        // Register contents are back at their reset values
        self.gyro_config = GyroConfig::default();
        debug!("Device reset and awake");
        Ok(())
    }

    /// Take all three gyro axes out of standby
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn enable_gyro_axes<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: DelayNs,
    {
        self.device.pwr_mgmt_2().write(|w| {
            w.set_stby_xg(false);
            w.set_stby_yg(false);
            w.set_stby_zg(false);
        })?;
        delay.delay_ms(AXES_SETTLE_MS);
        Ok(())
    }

    /// Configure the gyroscope range, filter and sample-rate divider
    ///
    /// Writing `GYRO_CONFIG` clears any self-test enable bits.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn configure_gyroscope(&mut self, config: GyroConfig) -> Result<(), Error<I::Error>> {
        self.device.gyro_config().write(|w| {
            w.set_fs_sel(config.full_scale as u8);
        })?;

        self.device.configuration().write(|w| {
            w.set_dlpf_cfg(config.dlpf as u8);
        })?;

        self.device.smplrt_div().write(|w| {
            w.set_smplrt_div(config.sample_rate_div);
        })?;

        self.gyro_config = config;
        Ok(())
    }

    /// Widest range, filter off, divider zero
    ///
    /// This fixes the scale constant used by every later unit conversion.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn configure_max_performance(&mut self) -> Result<(), Error<I::Error>> {
        self.configure_gyroscope(GyroConfig::max_performance())
    }

    /// Rewrite the filter and divider for maximum output rate
    ///
    /// Leaves `GYRO_CONFIG` (and with it the scale constant) untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_max_sample_rate(&mut self) -> Result<(), Error<I::Error>> {
        self.device.smplrt_div().write(|w| {
            w.set_smplrt_div(0);
        })?;
        self.device.configuration().write(|w| {
            w.set_dlpf_cfg(0);
        })?;
        self.gyro_config.sample_rate_div = 0;
        self.gyro_config.dlpf = crate::sensors::GyroDlpf::Disabled;
        Ok(())
    }

    /// Read one raw sample: gyro X, Y, Z then temperature
    ///
    /// Each word is two single-byte reads, high byte first.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the eight byte reads fails.
    pub fn read_raw_sample(&mut self) -> Result<RawSample, Error<I::Error>> {
        let bus = &mut self.device.interface;
        let [x, y, z, t] = SAMPLE_SEQUENCE;
        Ok(RawSample {
            gyro_x: bus.read_word(x)?,
            gyro_y: bus.read_word(y)?,
            gyro_z: bus.read_word(z)?,
            temperature_raw: bus.read_word(t)?,
        })
    }

    /// Enable or disable self-test on all three axes
    ///
    /// The full-scale range bits in `GYRO_CONFIG` are preserved. The caller
    /// owns the settle delay after this call.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_self_test(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.device.gyro_config().modify(|w| {
            w.set_xg_st(enabled);
            w.set_yg_st(enabled);
            w.set_zg_st(enabled);
        })?;
        Ok(())
    }

    /// Read the factory trim codes for X, Y and Z
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_factory_trim(&mut self) -> Result<[u8; 3], Error<I::Error>> {
        let x = self.device.self_test_x_gyro().read()?.xg_st_data();
        let y = self.device.self_test_y_gyro().read()?.yg_st_data();
        let z = self.device.self_test_z_gyro().read()?.zg_st_data();
        Ok([x, y, z])
    }

    /// Current gyroscope configuration
    #[must_use]
    pub const fn gyro_config(&self) -> GyroConfig {
        self.gyro_config
    }

    /// Raw-to-°/s scale constant for the current range
    #[must_use]
    pub const fn gyro_scale(&self) -> f32 {
        self.gyro_config.scale()
    }

    /// Temperature conversion constants
    #[must_use]
    pub const fn temperature_conversion(&self) -> &TemperatureConversion {
        &self.temperature
    }

    /// Replace the temperature conversion constants
    pub const fn set_temperature_conversion(&mut self, conversion: TemperatureConversion) {
        self.temperature = conversion;
    }

    /// Consume the driver and return the underlying interface
    #[must_use]
    pub fn release(self) -> I {
        self.device.interface
    }
}
