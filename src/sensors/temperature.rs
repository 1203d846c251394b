//! On-die temperature sensor conversion
//!
//! The conversion is a fixed linear formula, `°C = raw / sensitivity + offset`.
//! The constants are empirical and kept configurable rather than derived.

/// Linear raw-to-Celsius conversion constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureConversion {
    /// Sensitivity in LSB/°C
    pub sensitivity: f32,
    /// Temperature in °C at a raw reading of zero
    pub offset_c: f32,
}

impl Default for TemperatureConversion {
    fn default() -> Self {
        Self {
            sensitivity: 340.0,
            offset_c: 36.53,
        }
    }
}

impl TemperatureConversion {
    /// Convert a raw `TEMP_OUT` reading to degrees Celsius
    #[must_use]
    pub fn to_celsius(&self, raw: i16) -> f32 {
        (f32::from(raw) / self.sensitivity) + self.offset_c
    }
}
