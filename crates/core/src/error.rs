//! Error types for the resequencer.
//!
//! All fallible operations return structured errors rather than panicking.
//! Heap misuse is reported through the same channel as input errors so the
//! driver can abort the run cleanly and the CLI can exit non-zero.

use thiserror::Error;

/// Top-level error type for all operations in the system.
///
/// Each variant corresponds to a specific failure domain:
/// - Heap: structural misuse of the packet heap (a driver bug)
/// - Record: the input stream could not be parsed into packets
/// - Buffer: the configured buffering limit was exceeded
/// - I/O: reading input or writing output groups
#[derive(Debug, Error)]
pub enum Error {
    /// Heap contract violation (e.g., extracting from an empty heap)
    #[error("heap error: {0}")]
    Heap(#[from] HeapError),

    /// Input header or record could not be parsed
    #[error("malformed input: {0}")]
    Record(#[from] RecordError),

    /// Too many packets held back waiting for a gap to close
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// File or stream I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Packet heap errors.
///
/// These indicate a caller bug. The driver always checks the heap before
/// extracting, so seeing one of these aborts the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeapError {
    /// `extract_min` was called on a heap with no elements
    #[error("extract_min called on an empty heap")]
    Empty,
}

/// Input parsing errors.
///
/// Line numbers are 1-based and count every physical line, blank or not.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// The stream ended before a header line was found
    #[error("missing header line")]
    MissingHeader,

    /// The header line does not hold two non-negative integers
    #[error("line {line}: invalid header: {reason}")]
    InvalidHeader { line: usize, reason: String },

    /// The header declares a block size of zero
    #[error("line {line}: block size must be at least 1")]
    ZeroBlockSize { line: usize },

    /// A record line lacks a required field
    #[error("line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },

    /// A record field is not a valid integer
    #[error("line {line}: invalid {field} {value:?}")]
    InvalidInteger {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Buffering errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// Ingesting one more packet would exceed `max_buffered`
    #[error("buffered packet limit {limit} exceeded while waiting for sequence {watermark}")]
    LimitExceeded { limit: usize, watermark: i64 },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
