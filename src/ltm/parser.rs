//! # LTM Stream Parser
//!
//! Byte-at-a-time framing state machine over any `std::io::Read`.
//!
//! The parser hunts for the `$T` preamble, dispatches on the tag byte, reads
//! the fixed payload for that kind and checks the trailing XOR checksum.
//! Corrupted, truncated and unknown frames are counted and skipped; the only
//! thing that stops a parse is the source itself ending or failing.
//!
//! There is no length field on the wire, so an unknown tag leaves its payload
//! in the stream to be scanned as noise. If that payload happens to contain
//! `$T`, the parser will try to decode from there.

use serde::Serialize;
use std::io::{self, ErrorKind, Read};
use tracing::{debug, warn};

use super::decoder::{read_frame, DecodeOptions, DecodedFrame};
use super::protocol::{Frame, FrameKind, LTM_HEADER, LTM_SENTINEL};
use crate::error::{is_cancellation, LtmError, Result};

/// Receives every frame that passes checksum validation, in stream order
#[cfg_attr(test, mockall::automock)]
pub trait FrameSink {
    /// Accept one validated frame
    ///
    /// An error here is logged and the parse carries on.
    fn accept(&mut self, frame: &Frame) -> Result<()>;
}

/// Counters for frames that were dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Tag byte after `$T` was not a known frame kind
    pub unknown_frame_types: u64,

    /// Stream ended or failed before the full payload arrived
    pub malformed_frames: u64,

    /// Trailing checksum byte did not match the payload
    pub checksum_failures: u64,
}

impl ParseStats {
    /// Total number of dropped frames
    pub fn dropped(&self) -> u64 {
        self.unknown_frame_types + self.malformed_frames + self.checksum_failures
    }
}

/// How the byte source stopped
#[derive(Debug)]
pub enum StreamEnd {
    /// Clean end of data
    Eof,

    /// The source returned an error
    Error(io::Error),
}

impl StreamEnd {
    fn from_read_error(err: io::Error) -> Self {
        if err.kind() == ErrorKind::UnexpectedEof {
            StreamEnd::Eof
        } else {
            StreamEnd::Error(err)
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, StreamEnd::Eof)
    }
}

/// Everything a parse produced
#[derive(Debug)]
pub struct ParseResult {
    /// Validated frames in stream order
    pub frames: Vec<Frame>,

    pub stats: ParseStats,

    pub end: StreamEnd,
}

impl ParseResult {
    fn new() -> Self {
        Self {
            frames: Vec::new(),
            stats: ParseStats::default(),
            end: StreamEnd::Eof,
        }
    }

    /// Turn a non-EOF stream error into an `Err`, keeping the frames otherwise
    pub fn into_frames(self) -> Result<Vec<Frame>> {
        match self.end {
            StreamEnd::Eof => Ok(self.frames),
            StreamEnd::Error(err) => Err(LtmError::Io(err)),
        }
    }
}

#[derive(Debug)]
enum ParserState {
    AwaitingSentinel,
    AwaitingHeader,
    AwaitingTypeAndPayload,
    AwaitingChecksum(DecodedFrame),
}

struct NullSink;

impl FrameSink for NullSink {
    fn accept(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }
}

/// LTM stream parser
///
/// Holds only decode options; every call to [`Parser::parse`] runs its own
/// state machine, so one parser can serve several streams in parallel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    options: DecodeOptions,
}

impl Parser {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    /// Parse a byte stream until it ends
    ///
    /// # Arguments
    ///
    /// * `reader` - Byte source (file, serial port, socket, in-memory buffer)
    ///
    /// # Returns
    ///
    /// * `ParseResult` - Validated frames, drop counters, and how the stream ended
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ltm_telemetry::ltm::Parser;
    ///
    /// let file = std::fs::File::open("flight.ltm")?;
    /// let result = Parser::default().parse(std::io::BufReader::new(file));
    /// println!("{} frames", result.frames.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn parse<R: Read>(&self, reader: R) -> ParseResult {
        self.parse_with(reader, &mut NullSink)
    }

    /// Parse a byte stream, handing each validated frame to `sink` as it arrives
    pub fn parse_with<R, S>(&self, mut reader: R, sink: &mut S) -> ParseResult
    where
        R: Read,
        S: FrameSink + ?Sized,
    {
        let mut result = ParseResult::new();
        let mut state = ParserState::AwaitingSentinel;

        loop {
            let byte = match read_byte(&mut reader) {
                Ok(byte) => byte,
                Err(e) => {
                    result.end = StreamEnd::from_read_error(e);
                    break;
                }
            };

            state = match state {
                ParserState::AwaitingSentinel => {
                    if byte == LTM_SENTINEL {
                        ParserState::AwaitingHeader
                    } else {
                        ParserState::AwaitingSentinel
                    }
                }

                ParserState::AwaitingHeader => {
                    if byte == LTM_HEADER {
                        ParserState::AwaitingTypeAndPayload
                    } else {
                        ParserState::AwaitingSentinel
                    }
                }

                ParserState::AwaitingTypeAndPayload => match FrameKind::from_tag(byte) {
                    None => {
                        result.stats.unknown_frame_types += 1;
                        debug!("Unknown LTM frame type 0x{:02X}", byte);
                        ParserState::AwaitingSentinel
                    }
                    Some(kind) => match read_frame(kind, &mut reader, &self.options) {
                        Ok(decoded) => ParserState::AwaitingChecksum(decoded),
                        Err(LtmError::Io(io_err)) if io_err.kind() != ErrorKind::UnexpectedEof => {
                            // A cancelled read says nothing about the frame itself
                            if !is_cancellation(&io_err) {
                                result.stats.malformed_frames += 1;
                                debug!("Malformed {} frame: {}", kind, io_err);
                            }
                            result.end = StreamEnd::Error(io_err);
                            break;
                        }
                        Err(e) => {
                            result.stats.malformed_frames += 1;
                            debug!("Malformed {} frame: {}", kind, e);
                            ParserState::AwaitingSentinel
                        }
                    },
                },

                ParserState::AwaitingChecksum(decoded) => {
                    if byte == decoded.checksum {
                        if let Err(e) = sink.accept(&decoded.frame) {
                            warn!("Frame sink rejected {} frame: {}", decoded.frame.kind(), e);
                        }
                        result.frames.push(decoded.frame);
                    } else {
                        result.stats.checksum_failures += 1;
                        debug!(
                            "Checksum mismatch on {} frame: expected 0x{:02X}, got 0x{:02X}",
                            decoded.frame.kind(),
                            decoded.checksum,
                            byte
                        );
                    }

                    ParserState::AwaitingSentinel
                }
            };
        }

        debug!(
            "LTM parse finished: {} frames, {} unknown, {} malformed, {} checksum failures",
            result.frames.len(),
            result.stats.unknown_frame_types,
            result.stats.malformed_frames,
            result.stats.checksum_failures
        );

        result
    }
}

/// Parse a byte stream with default decode options
pub fn parse<R: Read>(reader: R) -> ParseResult {
    Parser::default().parse(reader)
}

fn read_byte<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}
