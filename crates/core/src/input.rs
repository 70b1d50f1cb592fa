//! Record reader for the line-oriented input format.
//!
//! # Input Format
//!
//! ```text
//! <total_packets> <block_size>                  header
//! <sequence_number> <byte_len> <tok> [<tok>..]  one record per line
//! ```
//!
//! Data tokens are joined with `,` to form the payload, so the record
//! `3 4 0a ff 10 2b` becomes packet 3 with payload `0a,ff,10,2b`. The
//! declared byte length is kept for metrics but never checked against the
//! token count. Blank lines are skipped anywhere in the stream.
//!
//! Malformed lines fail the read with their line number. Skipping them
//! would silently open a gap that stalls the watermark.

use crate::error::{RecordError, Result};
use crate::packet::Packet;
use std::io::BufRead;

/// Parsed header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Number of records the stream declares
    pub total_packets: usize,

    /// Records ingested per block before each drain
    pub block_size: usize,
}

impl Header {
    /// Number of fill/drain blocks needed to cover the declared records.
    pub fn block_count(&self) -> usize {
        self.total_packets.div_ceil(self.block_size)
    }
}

/// One parsed record line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based physical line number
    pub line: usize,

    /// Ordering key
    pub sequence_number: i64,

    /// Byte length stated by the producer (informational)
    pub declared_len: u64,

    /// Data tokens joined with `,`
    pub payload: String,
}

impl Record {
    /// Convert into a packet, dropping reader bookkeeping.
    pub fn into_packet(self) -> Packet {
        Packet::new(self.sequence_number, self.payload)
    }
}

/// Streaming reader yielding a header and then records.
pub struct RecordReader<R> {
    reader: R,

    /// Physical lines consumed so far
    line: usize,

    buf: String,
}

impl<R: BufRead> RecordReader<R> {
    /// Wrap a buffered reader positioned at the start of the stream.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Read and validate the header line.
    ///
    /// # Errors
    /// - `RecordError::MissingHeader` if the stream holds only blank lines
    /// - `RecordError::InvalidHeader` if the line is not two non-negative integers
    /// - `RecordError::ZeroBlockSize` if the block size is 0
    pub fn read_header(&mut self) -> Result<Header> {
        if !self.next_content_line()? {
            return Err(RecordError::MissingHeader.into());
        }

        parse_header(self.line, &self.buf)
    }

    /// Read the next record, or `None` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        if !self.next_content_line()? {
            return Ok(None);
        }

        parse_record(self.line, &self.buf).map(Some)
    }

    /// Check whether any non-blank line remains, consuming it.
    pub fn has_remaining(&mut self) -> Result<bool> {
        self.next_content_line()
    }

    /// Number of physical lines consumed so far.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Load the next non-blank line into `buf`; false at end of stream.
    fn next_content_line(&mut self) -> Result<bool> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(false);
            }
            self.line += 1;

            if !self.buf.trim().is_empty() {
                return Ok(true);
            }
        }
    }
}

/// Parse a header line.
pub fn parse_header(line: usize, text: &str) -> Result<Header> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(RecordError::InvalidHeader {
            line,
            reason: format!("expected 2 fields, found {}", fields.len()),
        }
        .into());
    }

    let parse = |field: &str, name: &str| {
        field.parse::<usize>().map_err(|_| RecordError::InvalidHeader {
            line,
            reason: format!("{name} {field:?} is not a non-negative integer"),
        })
    };

    let total_packets = parse(fields[0], "packet count")?;
    let block_size = parse(fields[1], "block size")?;

    if block_size == 0 {
        return Err(RecordError::ZeroBlockSize { line }.into());
    }

    Ok(Header {
        total_packets,
        block_size,
    })
}

/// Parse a record line.
///
/// # Errors
/// - `RecordError::MissingField` if the sequence number, length or data is absent
/// - `RecordError::InvalidInteger` if a numeric field does not parse
pub fn parse_record(line: usize, text: &str) -> Result<Record> {
    let mut tokens = text.split_whitespace();

    let sequence_number = match tokens.next() {
        Some(t) => t.parse::<i64>().map_err(|_| RecordError::InvalidInteger {
            line,
            field: "sequence number",
            value: t.to_string(),
        })?,
        None => {
            return Err(RecordError::MissingField {
                line,
                field: "sequence number",
            }
            .into())
        }
    };

    let declared_len = match tokens.next() {
        Some(t) => t.parse::<u64>().map_err(|_| RecordError::InvalidInteger {
            line,
            field: "byte length",
            value: t.to_string(),
        })?,
        None => {
            return Err(RecordError::MissingField {
                line,
                field: "byte length",
            }
            .into())
        }
    };

    let payload = tokens.collect::<Vec<_>>().join(",");
    if payload.is_empty() {
        return Err(RecordError::MissingField {
            line,
            field: "payload data",
        }
        .into());
    }

    Ok(Record {
        line,
        sequence_number,
        declared_len,
        payload,
    })
}
