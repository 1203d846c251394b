//! Output sinks for calibrated samples
//!
//! The scheduler decides when to flush; sinks may buffer freely in between.
//! [`CsvSink`] writes the text format consumed by downstream tooling:
//!
//! ```text
//! Timestamp,UnixTime,GyroX,GyroY,GyroZ,Temperature
//! 2024-03-09 14:05:07,1709993107,0.061,-0.122,0.000,25.31
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::sample::PhysicalSample;

/// Header line written once at the start of every CSV output
pub const CSV_HEADER: &str = "Timestamp,UnixTime,GyroX,GyroY,GyroZ,Temperature";

/// Destination for calibrated samples
pub trait OutputSink {
    /// Append one record
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the record cannot be written.
    fn append(&mut self, sample: &PhysicalSample) -> io::Result<()>;

    /// Force buffered records to durable storage
    ///
    /// # Errors
    ///
    /// Returns an I/O error if flushing fails.
    fn flush(&mut self) -> io::Result<()>;

    /// Flush and release the destination
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the final flush fails. The destination is
    /// released either way.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Format one record line (without the trailing newline)
#[must_use]
pub fn format_record(sample: &PhysicalSample) -> String {
    format!(
        "{},{},{:.3},{:.3},{:.3},{:.2}",
        sample.timestamp.human(),
        sample.timestamp.unix_seconds(),
        sample.gyro_x,
        sample.gyro_y,
        sample.gyro_z,
        sample.temperature
    )
}

/// Comma-separated text sink
pub struct CsvSink<W: Write> {
    writer: Option<W>,
}

impl<W: Write> CsvSink<W> {
    /// Wrap a writer and emit the header line
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the header cannot be written.
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "{CSV_HEADER}")?;
        Ok(Self {
            writer: Some(writer),
        })
    }

    /// Whether [`close`](OutputSink::close) has been called
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Consume the sink and return the writer, if still open
    #[must_use]
    pub fn into_inner(self) -> Option<W> {
        self.writer
    }

    fn writer(&mut self) -> io::Result<&mut W> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "sink is closed"))
    }
}

impl CsvSink<BufWriter<File>> {
    /// Create a new timestamp-named file `gyro_data_YYYYMMDD_HHMMSS.txt` in `dir`
    ///
    /// An existing file is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file already exists, cannot be created, or
    /// the header cannot be written.
    pub fn create_in(dir: &Path) -> io::Result<(Self, PathBuf)> {
        let name = Local::now()
            .format("gyro_data_%Y%m%d_%H%M%S.txt")
            .to_string();
        let path = dir.join(name);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        let sink = Self::new(BufWriter::new(file))?;
        Ok((sink, path))
    }
}

impl<W: Write> OutputSink for CsvSink<W> {
    fn append(&mut self, sample: &PhysicalSample) -> io::Result<()> {
        let line = format_record(sample);
        writeln!(self.writer()?, "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer()?.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}
