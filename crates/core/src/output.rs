//! Group writer for drained runs.
//!
//! Each drained run becomes one line with every payload fenced by `|`:
//!
//! ```text
//! |payload_1|payload_2|...|payload_k|
//! ```
//!
//! An empty run writes nothing.

use crate::error::Result;
use crate::packet::Packet;
use std::io::Write;

/// Format a run of packets as a single output line, newline included.
pub fn format_group(packets: &[Packet]) -> String {
    let payload_len: usize = packets.iter().map(|p| p.payload.len() + 1).sum();
    let mut line = String::with_capacity(payload_len + 2);

    for packet in packets {
        line.push('|');
        line.push_str(&packet.payload);
    }
    line.push_str("|\n");

    line
}

/// Writes formatted groups to a sink and counts what it wrote.
pub struct GroupWriter<W: Write> {
    inner: W,
    groups_written: u64,
    bytes_written: u64,
}

impl<W: Write> GroupWriter<W> {
    /// Wrap a sink.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            groups_written: 0,
            bytes_written: 0,
        }
    }

    /// Write one group line. Empty runs are skipped.
    ///
    /// Returns true if a line was written.
    pub fn write_group(&mut self, packets: &[Packet]) -> Result<bool> {
        if packets.is_empty() {
            return Ok(false);
        }

        let line = format_group(packets);
        self.inner.write_all(line.as_bytes())?;

        self.groups_written += 1;
        self.bytes_written += line.len() as u64;

        Ok(true)
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Number of group lines written.
    pub fn groups_written(&self) -> u64 {
        self.groups_written
    }

    /// Number of bytes written.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Unwrap the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
