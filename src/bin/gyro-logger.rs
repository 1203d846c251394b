//! Fixed-rate IAM-20380 gyro logger
//!
//! Identifies the sensor, resets it, optionally runs the self-test,
//! calibrates offsets at rest and then records calibrated samples to a
//! timestamp-named text file until Ctrl-C (or the sample limit).
//!
//! # Usage
//!
//! ```bash
//! # Log at 1 kHz from /dev/i2c-1, address 0x69
//! gyro-logger
//!
//! # 5000 samples at 500 Hz into /tmp, sensor strapped to 0x68
//! gyro-logger --address 0x68 --rate-hz 500 --samples 5000 --output-dir /tmp
//! ```

use std::error::Error as StdError;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use linux_embedded_hal::{Delay, I2cdev};
use log::{error, info};

use iam20380::session;
use iam20380::{
    CsvSink, I2cInterface, Iam20380Driver, LoggerConfig, RunState, RunSummary, SamplingScheduler,
};

#[derive(Parser, Debug)]
#[command(name = "gyro-logger")]
#[command(about = "Record calibrated IAM-20380 gyro samples at a fixed rate")]
struct Args {
    /// I2C bus device node
    #[arg(short, long, default_value = "/dev/i2c-1")]
    bus: PathBuf,

    /// Device address (0x69 with AD0 high, 0x68 with AD0 low)
    #[arg(short, long, default_value = "0x69", value_parser = parse_address)]
    address: u8,

    /// Target sample rate in Hz
    #[arg(short, long, default_value_t = 1000)]
    rate_hz: u32,

    /// Samples averaged for offset calibration
    #[arg(long, default_value_t = 200)]
    calibration_samples: u16,

    /// Flush the data file every N samples
    #[arg(long, default_value_t = 100)]
    flush_interval: u64,

    /// Stop after N samples instead of waiting for Ctrl-C
    #[arg(short = 'n', long)]
    samples: Option<u64>,

    /// Directory to create the data file in
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Skip the gyroscope self-test
    #[arg(long)]
    skip_self_test: bool,

    /// Log filter when `RUST_LOG` is not set (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<Args> for LoggerConfig {
    fn from(args: Args) -> Self {
        Self {
            bus_path: args.bus,
            address: args.address,
            rate_hz: args.rate_hz,
            calibration_samples: args.calibration_samples,
            flush_interval: args.flush_interval,
            max_samples: args.samples,
            output_dir: args.output_dir,
            self_test: !args.skip_self_test,
        }
    }
}

fn parse_address(value: &str) -> Result<u8, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    };
    match parsed {
        Ok(address) if address <= 0x7F => Ok(address),
        _ => Err(format!("'{value}' is not a 7-bit I2C address")),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    match run(&LoggerConfig::from(args)) {
        Ok(summary) => {
            info!(
                "Recorded {} samples ({} flushes, {} overruns)",
                summary.samples, summary.flushes, summary.overruns
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &LoggerConfig) -> Result<RunSummary, Box<dyn StdError>> {
    let sampler = config
        .sampler_config()
        .ok_or("rate and flush interval must be non-zero")?;

    let i2c = I2cdev::new(&config.bus_path)
        .map_err(|e| format!("failed to open {}: {e}", config.bus_path.display()))?;
    let driver = Iam20380Driver::new(I2cInterface::new(i2c, config.address));

    let run_state = RunState::new();
    let handle = run_state.clone();
    ctrlc::set_handler(move || handle.request_stop())?;

    let mut session = session::start(driver, &mut Delay, config, run_state, || {
        let (sink, path) = CsvSink::create_in(&config.output_dir)?;
        info!("Logging to {}", path.display());
        Ok(sink)
    })?;

    info!("Sampling at {} Hz, press Ctrl-C to stop", config.rate_hz);
    let mut scheduler = SamplingScheduler::new(sampler);
    let result = session.run(&mut scheduler);
    let closed = session.close();

    let summary = result?;
    closed?;
    Ok(summary)
}
