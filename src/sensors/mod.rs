//! Sensor modules for the IAM-20380
//!
//! This module provides types and configuration structures for each sensor
//! in the IAM-20380:
//! - Gyroscope (3-axis)
//! - Temperature (on-die)
//!
//! All register operations are performed through methods on `Iam20380Driver`.

pub mod gyroscope;
pub mod temperature;

// Re-export main types
pub use gyroscope::{GyroConfig, GyroDlpf, GyroFullScale, raw_to_dps};
pub use temperature::TemperatureConversion;
