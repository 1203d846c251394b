//! Unit tests for offset calibration

use crate::common::{MockDelay, assert_float_eq, create_configured_driver};
use iam20380::{
    CalibrationConfig, CalibrationOffsets, Error, PhysicalSample, Timestamp, calibrate_offsets,
};
use iam20380::calibration::average_samples;

#[test]
fn test_offsets_from_stationary_mean() {
    let (mut driver, interface) = create_configured_driver();
    interface.set_sample_sequence(vec![[10, -10, 0, 0]]);

    let offsets =
        calibrate_offsets(&mut driver, &mut MockDelay::default(), &CalibrationConfig::default())
            .unwrap();

    assert_float_eq(offsets.gyro_offset[0], 10.0 / 16.4, 1e-4);
    assert_float_eq(offsets.gyro_offset[1], -10.0 / 16.4, 1e-4);
    assert_float_eq(offsets.gyro_offset[2], 0.0, 1e-6);
    // Raw 0 is 36.53 °C, reference 25 °C
    assert_float_eq(offsets.temp_offset, 11.53, 1e-3);
}

#[test]
fn test_calibrated_reading_of_the_mean_is_zero() {
    let (mut driver, interface) = create_configured_driver();
    interface.set_sample_sequence(vec![[10, 10, 10, 0]]);

    let offsets =
        calibrate_offsets(&mut driver, &mut MockDelay::default(), &CalibrationConfig::default())
            .unwrap();
    let raw = driver.read_raw_sample().unwrap();
    let sample = PhysicalSample::from_raw(
        raw,
        driver.gyro_scale(),
        driver.temperature_conversion(),
        &offsets,
        Timestamp::now(),
    );

    assert_float_eq(sample.gyro_x, 0.0, 1e-5);
    assert_float_eq(sample.gyro_y, 0.0, 1e-5);
    assert_float_eq(sample.gyro_z, 0.0, 1e-5);
    assert_float_eq(sample.temperature, 25.0, 1e-4);
}

#[test]
fn test_calibration_is_repeatable() {
    let (mut driver, interface) = create_configured_driver();
    interface.set_sample_sequence(vec![[8, -4, 3, 680], [12, -6, 5, 700]]);
    let config = CalibrationConfig::default();

    let first = calibrate_offsets(&mut driver, &mut MockDelay::default(), &config).unwrap();
    let second = calibrate_offsets(&mut driver, &mut MockDelay::default(), &config).unwrap();

    assert_eq!(first, second);
    assert_float_eq(first.gyro_offset[0], 10.0 / 16.4, 1e-4);
}

#[test]
fn test_calibration_timing_and_sample_count() {
    let (mut driver, interface) = create_configured_driver();
    interface.set_sample_sequence(vec![[0, 0, 0, 0]]);
    let mut delay = MockDelay::default();

    calibrate_offsets(&mut driver, &mut delay, &CalibrationConfig::default()).unwrap();

    // 1 s settle then 200 samples at 5 ms
    assert_eq!(delay.total_ms(), 2_000);
    assert_eq!(interface.samples_served(), 200);
}

#[test]
fn test_zero_samples_rejected_without_bus_traffic() {
    let (mut driver, interface) = create_configured_driver();
    let config = CalibrationConfig {
        samples: 0,
        ..CalibrationConfig::default()
    };

    let result = calibrate_offsets(&mut driver, &mut MockDelay::default(), &config);

    assert!(matches!(result, Err(Error::InvalidConfig)));
    assert!(interface.operations().is_empty());
}

#[test]
fn test_average_does_not_overflow() {
    let (mut driver, interface) = create_configured_driver();
    interface.set_sample_sequence(vec![[i16::MAX, i16::MIN, i16::MAX, i16::MIN]]);

    let mean = average_samples(&mut driver, &mut MockDelay::default(), u16::MAX, 0).unwrap();

    assert!((mean.gyro[0] - f64::from(i16::MAX)).abs() < 1e-9);
    assert!((mean.gyro[1] - f64::from(i16::MIN)).abs() < 1e-9);
    assert!((mean.temperature_raw - f64::from(i16::MIN)).abs() < 1e-9);
}

#[test]
fn test_default_offsets_are_zero() {
    let offsets = CalibrationOffsets::default();
    assert_eq!(offsets.gyro_offset, [0.0; 3]);
    assert_float_eq(offsets.temp_offset, 0.0, 1e-9);
}
