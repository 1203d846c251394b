//! Integration test: identify, reset, self-test, calibrate and log to a file

use std::fs;
use std::time::Duration;

use crate::common::{MockDelay, create_mock_driver};
use iam20380::sink::CSV_HEADER;
use iam20380::{CsvSink, Error, LoggerConfig, RunState, SamplingScheduler, session};

#[test]
fn test_complete_logging_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig {
        max_samples: Some(50),
        flush_interval: 20,
        rate_hz: 2_000,
        output_dir: dir.path().to_path_buf(),
        ..LoggerConfig::default()
    };

    let (driver, interface) = create_mock_driver();
    interface.set_factory_trim([1, 2, 3]);
    interface.set_sample_sequence(vec![[20, -10, 6, 0], [24, -14, 10, 0]]);
    interface.set_self_test_response([330, 330, 330]);
    let mut delay = MockDelay::default();

    let mut path = None;
    let mut session = session::start(driver, &mut delay, &config, RunState::new(), || {
        let (sink, created) = CsvSink::create_in(&config.output_dir)?;
        path = Some(created);
        Ok(sink)
    })
    .unwrap();
    let path = path.unwrap();

    // 110 ms reset, 900 ms self-test, 2 s calibration
    assert_eq!(delay.total_ms(), 3_010);

    let sampler = config.sampler_config().unwrap();
    assert_eq!(sampler.period, Duration::from_micros(500));
    let mut scheduler = SamplingScheduler::new(sampler);
    let summary = session.run(&mut scheduler).unwrap();
    session.close().unwrap();

    assert_eq!(summary.samples, 50);
    assert_eq!(summary.flushes, 2);
    assert_eq!(interface.drop_count(), 1);

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 51);
    assert_eq!(lines[0], CSV_HEADER);

    // Alternating samples sit 2 LSB either side of the calibrated mean
    for line in &lines[1..] {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 6);
        let gyro_x: f32 = fields[2].parse().unwrap();
        assert!((gyro_x.abs() - 2.0 / 16.4).abs() < 2e-3);
        assert_eq!(fields[5], "25.00");
    }
}

#[test]
fn test_absent_device_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig {
        output_dir: dir.path().to_path_buf(),
        ..LoggerConfig::default()
    };
    let (driver, interface) = create_mock_driver();
    interface.set_who_am_i(0x00);

    let result = session::start(
        driver,
        &mut MockDelay::default(),
        &config,
        RunState::new(),
        || CsvSink::create_in(&config.output_dir).map(|(sink, _)| sink),
    );

    assert!(matches!(result, Err(Error::NoResponse)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(interface.drop_count(), 1);
}

#[test]
fn test_fault_after_file_creation_still_closes_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig {
        output_dir: dir.path().to_path_buf(),
        self_test: false,
        ..LoggerConfig::default()
    };
    let (driver, interface) = create_mock_driver();
    interface.fail_next_write();

    let result = session::start(
        driver,
        &mut MockDelay::default(),
        &config,
        RunState::new(),
        || CsvSink::create_in(&config.output_dir).map(|(sink, _)| sink),
    );

    assert!(result.is_err());
    assert_eq!(interface.drop_count(), 1);

    // The file exists and holds the flushed header
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let text = fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
    assert_eq!(text.lines().collect::<Vec<_>>(), vec![CSV_HEADER]);
}
