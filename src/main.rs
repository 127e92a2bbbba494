//! # LTM Telemetry
//!
//! Decode a Lightweight Telemetry (LTM) capture file or live serial stream.
//!
//! # Usage
//!
//! ```bash
//! ltm-telemetry flight.ltm --verbose
//! ltm-telemetry --serial /dev/ttyUSB0 --record
//! ```
//!
//! Expected output:
//! ```text
//! File 'flight.ltm' contains 1834 frames.
//! INFO ltm_telemetry: Dropped frames: 0 unknown type, 1 malformed, 3 checksum failures
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use ltm_telemetry::config::{Config, LoggingConfig};
use ltm_telemetry::ltm::decoder::StatusFlagDecoding;
use ltm_telemetry::ltm::{self, Frame, FrameSink, StreamEnd};
use ltm_telemetry::serial::LtmSerial;
use ltm_telemetry::error::is_cancellation;
use ltm_telemetry::session::run_session;
use ltm_telemetry::telemetry::TelemetryLogger;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusFlagsArg {
    Legacy,
    Corrected,
}

impl From<StatusFlagsArg> for StatusFlagDecoding {
    fn from(arg: StatusFlagsArg) -> Self {
        match arg {
            StatusFlagsArg::Legacy => StatusFlagDecoding::Legacy,
            StatusFlagsArg::Corrected => StatusFlagDecoding::Corrected,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "ltm-telemetry", version, about = "Decode Lightweight Telemetry (LTM) streams")]
struct Cli {
    /// File containing raw LTM data
    #[arg(required_unless_present = "serial", conflicts_with = "serial")]
    file: Option<PathBuf>,

    /// Read from a serial port instead of a file (auto-detect when PORT is omitted)
    #[arg(long, value_name = "PORT", num_args = 0..=1, default_missing_value = "")]
    serial: Option<String>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print every decoded frame
    #[arg(short, long)]
    verbose: bool,

    /// Record frames to JSONL files (overrides the config)
    #[arg(long)]
    record: bool,

    /// How to read the armed/failsafe bits of status frames (overrides the config)
    #[arg(long, value_enum)]
    status_flags: Option<StatusFlagsArg>,
}

/// Frame sink used by the CLI: optional live echo and optional recording
struct CliSink {
    echo: bool,
    logger: Option<TelemetryLogger>,
}

impl FrameSink for CliSink {
    fn accept(&mut self, frame: &Frame) -> ltm_telemetry::error::Result<()> {
        if self.echo {
            println!("{}", frame);
        }

        if let Some(logger) = self.logger.as_mut() {
            logger.log_frame(frame)?;
        }

        Ok(())
    }
}

fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ltm-telemetry.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Main entry point
///
/// Loads configuration, opens the requested source, parses it to the end
/// (or until Ctrl+C) and reports what was decoded.
///
/// # Errors
///
/// Returns error if configuration or the source cannot be opened, or if the
/// stream fails with anything other than end-of-data or cancellation.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(flags) = cli.status_flags {
        config.parser.status_flags = flags.into();
    }
    if cli.record {
        config.telemetry.enabled = true;
    }
    if let Some(port) = cli.serial.as_deref().filter(|port| !port.is_empty()) {
        config.serial.port = port.to_string();
    }
    config.validate()?;

    let _log_guard = init_logging(&config.logging);
    info!("LTM Telemetry v{} starting...", env!("CARGO_PKG_VERSION"));

    let logger = if config.telemetry.enabled {
        Some(TelemetryLogger::new(&config.telemetry)?)
    } else {
        None
    };

    let parser = ltm::Parser::new(config.parser.decode_options());

    let (source_name, report) = match &cli.file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let sink = CliSink { echo: false, logger };
            let report = run_session(parser, BufReader::new(file), sink, shutdown_signal()).await?;
            (format!("File '{}'", path.display()), report)
        }
        None => {
            let serial = LtmSerial::open(&config.serial)?;
            let name = format!("Port '{}'", serial.device_path());
            info!("Reading LTM from {}, press Ctrl+C to stop", serial.device_path());
            let sink = CliSink { echo: cli.verbose, logger };
            let report = run_session(parser, serial.into_reader(), sink, shutdown_signal()).await?;
            (name, report)
        }
    };

    let mut sink = report.sink;
    if let Some(logger) = sink.logger.as_mut() {
        logger.flush()?;
        info!("Recorded {} frames to {}", logger.total_records(), logger.log_dir().display());
    }

    let result = report.result;
    println!("{} contains {} frames.", source_name, result.frames.len());
    info!(
        "Dropped frames: {} unknown type, {} malformed, {} checksum failures",
        result.stats.unknown_frame_types,
        result.stats.malformed_frames,
        result.stats.checksum_failures
    );

    if cli.verbose && !sink.echo {
        for frame in &result.frames {
            println!("{}", frame);
        }
    }

    match result.end {
        StreamEnd::Eof => Ok(()),
        StreamEnd::Error(e) if is_cancellation(&e) => Ok(()),
        StreamEnd::Error(e) => Err(e).context("LTM stream failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_file_argument() {
        let cli = Cli::try_parse_from(["ltm-telemetry", "flight.ltm", "-v"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("flight.ltm")));
        assert!(cli.verbose);
        assert!(cli.serial.is_none());
    }

    #[test]
    fn test_serial_without_port() {
        let cli = Cli::try_parse_from(["ltm-telemetry", "--serial"]).unwrap();
        assert_eq!(cli.serial.as_deref(), Some(""));
        assert!(cli.file.is_none());
    }

    #[test]
    fn test_serial_with_port_and_flags() {
        let cli = Cli::try_parse_from([
            "ltm-telemetry",
            "--serial",
            "/dev/ttyUSB1",
            "--status-flags",
            "corrected",
        ])
        .unwrap();
        assert_eq!(cli.serial.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(
            StatusFlagDecoding::from(cli.status_flags.unwrap()),
            StatusFlagDecoding::Corrected
        );
    }

    #[test]
    fn test_source_is_required() {
        assert!(Cli::try_parse_from(["ltm-telemetry"]).is_err());
        assert!(Cli::try_parse_from(["ltm-telemetry", "a.ltm", "--serial"]).is_err());
    }
}
