//! Sample records
//!
//! A [`RawSample`] is the four register words read in one acquisition. It is
//! converted straight into a [`PhysicalSample`] (scaled, offset-corrected,
//! wall-clock stamped) which is handed to the output sink and dropped.

use chrono::{DateTime, Local};

use crate::calibration::CalibrationOffsets;
use crate::sensors::{TemperatureConversion, raw_to_dps};

/// One acquisition of raw register values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    /// X-axis rotation (raw)
    pub gyro_x: i16,
    /// Y-axis rotation (raw)
    pub gyro_y: i16,
    /// Z-axis rotation (raw)
    pub gyro_z: i16,
    /// Temperature (raw)
    pub temperature_raw: i16,
}

impl RawSample {
    /// Gyro axes as an array, X, Y, Z
    #[must_use]
    pub const fn gyro(&self) -> [i16; 3] {
        [self.gyro_x, self.gyro_y, self.gyro_z]
    }
}

/// Wall-clock time of a sample
///
/// Only used for stamping records. Pacing runs on a monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(DateTime<Local>);

impl Timestamp {
    /// Current local time
    #[must_use]
    pub fn now() -> Self {
        Self(Local::now())
    }

    /// Wrap an existing local time
    #[must_use]
    pub const fn from_datetime(time: DateTime<Local>) -> Self {
        Self(time)
    }

    /// Human-readable form, `YYYY-MM-DD HH:MM:SS`
    #[must_use]
    pub fn human(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Seconds since the Unix epoch
    #[must_use]
    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }
}

/// Calibrated sample in physical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalSample {
    /// Wall-clock time of acquisition
    pub timestamp: Timestamp,
    /// X-axis rotation rate in °/s
    pub gyro_x: f32,
    /// Y-axis rotation rate in °/s
    pub gyro_y: f32,
    /// Z-axis rotation rate in °/s
    pub gyro_z: f32,
    /// Temperature in °C, relative to the calibration reference
    pub temperature: f32,
}

impl PhysicalSample {
    /// Scale a raw sample and subtract the calibration offsets
    #[must_use]
    pub fn from_raw(
        raw: RawSample,
        scale: f32,
        temperature: &TemperatureConversion,
        offsets: &CalibrationOffsets,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            timestamp,
            gyro_x: raw_to_dps(raw.gyro_x, scale) - offsets.gyro_offset[0],
            gyro_y: raw_to_dps(raw.gyro_y, scale) - offsets.gyro_offset[1],
            gyro_z: raw_to_dps(raw.gyro_z, scale) - offsets.gyro_offset[2],
            temperature: temperature.to_celsius(raw.temperature_raw) - offsets.temp_offset,
        }
    }
}
