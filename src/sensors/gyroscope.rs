//! Gyroscope sensor types and configuration
//!
//! Provides the full-scale range and filter settings for the IAM-20380's
//! 3-axis gyroscope, and the raw-to-physical scale constant they imply.

/// Gyroscope full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GyroFullScale {
    /// ±250°/s range
    Dps250 = 0,
    /// ±500°/s range
    Dps500 = 1,
    /// ±1000°/s range
    Dps1000 = 2,
    /// ±2000°/s range
    Dps2000 = 3,
}

impl GyroFullScale {
    /// Widest range supported by the device
    pub const WIDEST: Self = Self::Dps2000;

    /// Get the sensitivity in LSB/(°/s)
    ///
    /// This is the scale constant used to convert raw sensor values to
    /// physical units.
    #[must_use]
    pub const fn sensitivity(self) -> f32 {
        match self {
            Self::Dps250 => 131.0, // LSB/(°/s)
            Self::Dps500 => 65.5,  // LSB/(°/s)
            Self::Dps1000 => 32.8, // LSB/(°/s)
            Self::Dps2000 => 16.4, // LSB/(°/s)
        }
    }
}

/// Gyroscope Digital Low Pass Filter (DLPF) configuration (`CONFIG.DLPF_CFG`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GyroDlpf {
    /// Filter off, 250 Hz bandwidth at 8 kHz internal rate
    Disabled = 0,
    /// 176 Hz bandwidth
    Hz176 = 1,
    /// 92 Hz bandwidth
    Hz92 = 2,
    /// 41 Hz bandwidth
    Hz41 = 3,
    /// 20 Hz bandwidth
    Hz20 = 4,
    /// 10 Hz bandwidth
    Hz10 = 5,
    /// 5 Hz bandwidth
    Hz5 = 6,
}

/// Gyroscope configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GyroConfig {
    /// Full-scale range
    pub full_scale: GyroFullScale,
    /// Digital Low Pass Filter configuration
    pub dlpf: GyroDlpf,
    /// Sample rate divider (0-255)
    pub sample_rate_div: u8,
}

impl Default for GyroConfig {
    fn default() -> Self {
        Self {
            full_scale: GyroFullScale::Dps250,
            dlpf: GyroDlpf::Hz176,
            sample_rate_div: 0,
        }
    }
}

impl GyroConfig {
    /// Widest range, no filtering and no divider
    #[must_use]
    pub const fn max_performance() -> Self {
        Self {
            full_scale: GyroFullScale::WIDEST,
            dlpf: GyroDlpf::Disabled,
            sample_rate_div: 0,
        }
    }

    /// Raw-to-°/s scale constant for this configuration
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.full_scale.sensitivity()
    }
}

/// Convert raw gyroscope counts to degrees per second
#[must_use]
pub fn raw_to_dps(raw: i16, scale: f32) -> f32 {
    f32::from(raw) / scale
}
