//! # JSONL Telemetry Logger
//!
//! Each record is a single line:
//!
//! ```text
//! {"timestamp":"2024-05-01T12:00:00.123+00:00","kind":"gps","lat":47.31,...}
//! ```
//!
//! Files are named `ltm_<YYYYmmdd_HHMMSS>_<seq>.jsonl`. Pruning drops the
//! lowest names first but never the file currently being written, even when
//! the directory holds names from a clock that ran ahead.

use chrono::Utc;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::ltm::{Frame, FrameSink};

const FILE_PREFIX: &str = "ltm_";
const FILE_EXTENSION: &str = "jsonl";

#[derive(Serialize)]
struct TelemetryRecord<'a> {
    timestamp: String,

    #[serde(flatten)]
    frame: &'a Frame,
}

/// Writes frames to rotating JSONL files
#[derive(Debug)]
pub struct TelemetryLogger {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    file_sequence: u32,
    total_records: u64,
}

impl TelemetryLogger {
    /// Create a logger from configuration, creating the log directory
    ///
    /// No file is opened until the first frame arrives.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let log_dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&log_dir)?;

        info!("Recording LTM telemetry to {}", log_dir.display());

        Ok(Self {
            log_dir,
            max_records_per_file: config.max_records_per_file,
            max_files_to_keep: config.max_files_to_keep,
            writer: None,
            current_path: None,
            records_in_file: 0,
            file_sequence: 0,
            total_records: 0,
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    /// Append one frame, rotating first if the current file is full
    pub fn log_frame(&mut self, frame: &Frame) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let record = TelemetryRecord {
            timestamp: Utc::now().to_rfc3339(),
            frame,
        };

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, &record)?;
            writer.write_all(b"\n")?;
        }

        self.records_in_file += 1;
        self.total_records += 1;
        Ok(())
    }

    /// Flush buffered records to disk
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.flush()?;

        self.file_sequence += 1;
        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.file_sequence,
            FILE_EXTENSION
        );
        let path = self.log_dir.join(name);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened telemetry file {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    /// Remove the oldest telemetry files beyond `max_files_to_keep`
    ///
    /// The active file always counts toward the limit and is never removed.
    fn prune(&self) -> Result<()> {
        let mut files: Vec<PathBuf> = self
            .telemetry_files()?
            .into_iter()
            .filter(|path| Some(path) != self.current_path.as_ref())
            .collect();

        let keep = self.max_files_to_keep.saturating_sub(1);
        if files.len() <= keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - keep;
        for path in files.into_iter().take(excess) {
            debug!("Removing old telemetry file {}", path.display());
            fs::remove_file(path)?;
        }

        Ok(())
    }

    fn telemetry_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.log_dir)? {
            let path = entry?.path();
            let is_telemetry = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(FILE_PREFIX))
                .unwrap_or(false)
                && path.extension().and_then(|ext| ext.to_str()) == Some(FILE_EXTENSION);

            if is_telemetry {
                files.push(path);
            }
        }

        Ok(files)
    }
}

impl FrameSink for TelemetryLogger {
    fn accept(&mut self, frame: &Frame) -> Result<()> {
        self.log_frame(frame)
    }
}

impl Drop for TelemetryLogger {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
