//! Block-wise resequencing driver.
//!
//! Runs the fill/drain loop over a record stream:
//!
//! ```text
//! header ──► for each block:
//!              fill:  read up to block_size records ──► Resequencer::ingest
//!              drain: Resequencer::drain ──► one group line (if non-empty)
//!            end of input:
//!              flush remainder (opt-in) or report stall
//! ```
//!
//! The loop runs at most `ceil(total_packets / block_size)` blocks and stops
//! early when the input runs out, so it always terminates. Records past the
//! declared count are left unread.

use crate::error::{Error, Result};
use crate::input::{Header, RecordReader};
use crate::metrics::{Metrics, ReorderTracker};
use crate::output::GroupWriter;
use crate::resequencer::{Resequencer, Stall};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Behavior knobs for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResequenceOptions {
    /// First sequence number expected for emission
    pub start_sequence: i64,

    /// At end of input, emit everything still buffered as one last group
    pub flush_remainder: bool,

    /// Fail instead of buffering more than this many packets
    pub max_buffered: Option<usize>,
}

impl Default for ResequenceOptions {
    fn default() -> Self {
        Self {
            start_sequence: 0,
            flush_remainder: false,
            max_buffered: None,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Header the input declared
    pub header: Header,

    /// Run counters
    pub metrics: Metrics,

    /// Set when packets were left behind a gap and not flushed
    pub stall: Option<Stall>,
}

/// Resequence a record stream into group lines.
///
/// # Errors
/// - `Error::Record` if the header or any record is malformed
/// - `Error::Config` if `max_buffered` is smaller than the block size
/// - `Error::Buffer` if the buffered packet limit is exceeded
/// - `Error::Io` on read or write failure
pub fn resequence<R: BufRead, W: Write>(
    input: R,
    output: W,
    options: &ResequenceOptions,
) -> Result<RunReport> {
    let mut reader = RecordReader::new(input);
    let mut writer = GroupWriter::new(output);
    let mut metrics = Metrics::new();
    let mut reorder = ReorderTracker::new();

    let header = reader.read_header()?;

    // A block never holds more records than the stream declares
    let effective_block = header.block_size.min(header.total_packets.max(1));

    if let Some(limit) = options.max_buffered {
        if limit < effective_block {
            return Err(Error::Config(format!(
                "max buffered packets ({limit}) is smaller than the block size ({effective_block})"
            )));
        }
    }

    tracing::info!(
        total_packets = header.total_packets,
        block_size = header.block_size,
        blocks = header.block_count(),
        "resequencing started"
    );

    let mut reseq = Resequencer::new(effective_block, options.start_sequence)
        .with_max_buffered(options.max_buffered);
    let mut exhausted = false;

    for block in 0..header.block_count() {
        let mut filled = 0;

        while filled < header.block_size {
            let Some(record) = reader.next_record()? else {
                exhausted = true;
                break;
            };

            metrics.records_read += 1;
            metrics.declared_bytes += record.declared_len;
            if reorder.track(record.sequence_number) {
                metrics.packets_reordered += 1;
            }

            reseq.ingest(record.into_packet())?;
            filled += 1;
        }

        if filled == 0 {
            break;
        }
        metrics.blocks_processed += 1;

        let run = reseq.drain()?;
        metrics.packets_emitted += run.len() as u64;
        if !writer.write_group(&run)? {
            metrics.blocks_without_output += 1;
        }

        tracing::debug!(
            block,
            filled,
            released = run.len(),
            watermark = reseq.watermark(),
            buffered = reseq.buffered(),
            "block processed"
        );

        if exhausted {
            break;
        }
    }

    if exhausted {
        if metrics.records_read < header.total_packets as u64 {
            tracing::warn!(
                declared = header.total_packets,
                read = metrics.records_read,
                "input ended before the declared packet count"
            );
        }
    } else if reader.has_remaining()? {
        tracing::warn!(
            declared = header.total_packets,
            line = reader.line(),
            "ignoring records beyond the declared packet count"
        );
    }

    let mut stall = None;
    if options.flush_remainder && !reseq.is_idle() {
        let rest = reseq.flush_remaining()?;
        metrics.packets_flushed = rest.len() as u64;
        metrics.packets_emitted += rest.len() as u64;
        writer.write_group(&rest)?;

        tracing::info!(flushed = rest.len(), "flushed packets buffered behind gaps");
    } else if let Some(s) = reseq.stall() {
        tracing::warn!(
            watermark = s.watermark,
            buffered = s.buffered,
            lowest_buffered = ?s.lowest_buffered,
            "watermark stalled; buffered packets were not emitted"
        );
        metrics.packets_stalled = s.buffered as u64;
        stall = Some(s);
    }

    writer.flush()?;

    let stats = reseq.stats();
    metrics.groups_emitted = writer.groups_written();
    metrics.output_bytes = writer.bytes_written();
    metrics.peak_buffered = stats.peak_buffered as u64;
    metrics.capacity_growths = stats.capacity_growths;
    metrics.late_packets = stats.late_packets;
    metrics.final_watermark = stats.watermark;
    metrics.complete();

    tracing::info!(
        emitted = metrics.packets_emitted,
        groups = metrics.groups_emitted,
        watermark = metrics.final_watermark,
        "resequencing finished"
    );

    Ok(RunReport {
        header,
        metrics,
        stall,
    })
}

/// Resequence `input_path` into `output_path`.
///
/// The input is opened before the output is created, so a missing input
/// leaves no empty output file behind.
pub fn resequence_file(
    input_path: &Path,
    output_path: &Path,
    options: &ResequenceOptions,
) -> Result<RunReport> {
    let input = BufReader::new(File::open(input_path)?);
    let output = BufWriter::new(File::create(output_path)?);

    resequence(input, output, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BufferError, RecordError};

    fn run(input: &str, options: &ResequenceOptions) -> Result<(String, RunReport)> {
        let mut out = Vec::new();
        let report = resequence(input.as_bytes(), &mut out, options)?;
        Ok((String::from_utf8(out).unwrap(), report))
    }

    #[test]
    fn test_block_scenario() {
        let input = "5 2\n2 1 b\n0 1 a\n1 1 c\n4 1 d\n3 1 e\n";
        let (out, report) = run(input, &ResequenceOptions::default()).unwrap();

        assert_eq!(out, "|a|\n|c|b|\n|e|d|\n");
        assert!(report.stall.is_none());
        assert_eq!(report.metrics.blocks_processed, 3);
        assert_eq!(report.metrics.final_watermark, 5);
    }

    #[test]
    fn test_block_without_output() {
        let input = "4 2\n3 1 d\n2 1 c\n1 1 b\n0 1 a\n";
        let (out, report) = run(input, &ResequenceOptions::default()).unwrap();

        assert_eq!(out, "|a|b|c|d|\n");
        assert_eq!(report.metrics.blocks_without_output, 1);
        assert_eq!(report.metrics.groups_emitted, 1);
    }

    #[test]
    fn test_short_final_block() {
        let input = "3 2\n1 1 b\n0 1 a\n2 1 c\n";
        let (out, _) = run(input, &ResequenceOptions::default()).unwrap();

        assert_eq!(out, "|a|b|\n|c|\n");
    }

    #[test]
    fn test_input_shorter_than_declared() {
        let input = "10 2\n0 1 a\n1 1 b\n2 1 c\n";
        let (out, report) = run(input, &ResequenceOptions::default()).unwrap();

        assert_eq!(out, "|a|b|\n|c|\n");
        assert_eq!(report.metrics.records_read, 3);
    }

    #[test]
    fn test_records_beyond_declared_count_ignored() {
        let input = "2 2\n1 1 b\n0 1 a\n2 1 c\n";
        let (out, report) = run(input, &ResequenceOptions::default()).unwrap();

        assert_eq!(out, "|a|b|\n");
        assert_eq!(report.metrics.records_read, 2);
    }

    #[test]
    fn test_zero_declared_packets() {
        let (out, report) = run("0 4\n", &ResequenceOptions::default()).unwrap();

        assert!(out.is_empty());
        assert_eq!(report.metrics.blocks_processed, 0);
    }

    #[test]
    fn test_stall_leaves_tail_unwritten() {
        let input = "4 2\n0 1 a\n2 1 c\n3 1 d\n4 1 e\n";
        let (out, report) = run(input, &ResequenceOptions::default()).unwrap();

        assert_eq!(out, "|a|\n");
        let stall = report.stall.unwrap();
        assert_eq!(stall.watermark, 1);
        assert_eq!(stall.buffered, 3);
        assert_eq!(report.metrics.packets_stalled, 3);
    }

    #[test]
    fn test_flush_remainder() {
        let input = "4 2\n0 1 a\n2 1 c\n4 1 e\n3 1 d\n";
        let options = ResequenceOptions {
            flush_remainder: true,
            ..Default::default()
        };
        let (out, report) = run(input, &options).unwrap();

        assert_eq!(out, "|a|\n|c|d|e|\n");
        assert!(report.stall.is_none());
        assert_eq!(report.metrics.packets_flushed, 3);
        assert_eq!(report.metrics.packets_emitted, 4);
    }

    #[test]
    fn test_start_sequence() {
        let input = "2 2\n11 1 b\n10 1 a\n";
        let options = ResequenceOptions {
            start_sequence: 10,
            ..Default::default()
        };
        let (out, _) = run(input, &options).unwrap();

        assert_eq!(out, "|a|b|\n");
    }

    #[test]
    fn test_malformed_record_fails_run() {
        let input = "3 3\n0 1 a\n1 1\n2 1 c\n";
        let result = run(input, &ResequenceOptions::default());

        assert!(matches!(
            result,
            Err(Error::Record(RecordError::MissingField { line: 3, .. }))
        ));
    }

    #[test]
    fn test_max_buffered_below_block_size() {
        let options = ResequenceOptions {
            max_buffered: Some(1),
            ..Default::default()
        };
        let result = run("2 2\n0 1 a\n1 1 b\n", &options);

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_max_buffered_exceeded() {
        let input = "6 2\n1 1 b\n2 1 c\n3 1 d\n4 1 e\n5 1 f\n6 1 g\n";
        let options = ResequenceOptions {
            max_buffered: Some(4),
            ..Default::default()
        };
        let result = run(input, &options);

        assert!(matches!(
            result,
            Err(Error::Buffer(BufferError::LimitExceeded { limit: 4, watermark: 0 }))
        ));
    }

    #[test]
    fn test_huge_declared_block_size() {
        let (out, report) = run(
            "1 18446744073709551615\n0 1 a\n",
            &ResequenceOptions::default(),
        )
        .unwrap();

        assert_eq!(out, "|a|\n");
        assert_eq!(report.metrics.blocks_processed, 1);

        let (out, _) = run(
            "3 100000000000\n2 1 c\n0 1 a\n1 1 b\n",
            &ResequenceOptions::default(),
        )
        .unwrap();
        assert_eq!(out, "|a|b|c|\n");
    }

    #[test]
    fn test_start_sequence_at_max() {
        let options = ResequenceOptions {
            start_sequence: i64::MAX,
            ..Default::default()
        };
        let (out, report) = run("1 1\n9223372036854775807 1 z\n", &options).unwrap();

        assert_eq!(out, "|z|\n");
        assert_eq!(report.metrics.final_watermark, i64::MAX);
        assert!(report.stall.is_none());
    }

    #[test]
    fn test_metrics_counts() {
        let input = "5 2\n2 3 b\n0 3 a\n1 3 c\n4 3 d\n3 3 e\n";
        let (_, report) = run(input, &ResequenceOptions::default()).unwrap();
        let m = &report.metrics;

        assert_eq!(m.records_read, 5);
        assert_eq!(m.declared_bytes, 15);
        assert_eq!(m.packets_emitted, 5);
        assert_eq!(m.groups_emitted, 3);
        // 0 after 2, 1 after 2, 3 after 4
        assert_eq!(m.packets_reordered, 3);
        assert_eq!(m.peak_buffered, 3);
        assert_eq!(m.output_bytes, "|a|\n|c|b|\n|e|d|\n".len() as u64);
        assert!(m.end_time.is_some());
    }
}
