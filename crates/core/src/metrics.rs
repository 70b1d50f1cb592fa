//! Metrics collection and reporting for a resequencing run.
//!
//! This module provides observable insights into system behavior:
//! - Volume (records read, packets and groups emitted)
//! - Buffering pressure (peak buffered, heap capacity growth)
//! - Arrival disorder (reordered and late packets)
//! - Liveness (packets left stalled behind a gap)
//!
//! # Thread Safety
//!
//! The `Metrics` struct is NOT thread-safe. The driver owns one instance
//! per run and fills it in as it goes.

use std::time::{Duration, Instant};

/// Counters and timing for one run.
#[derive(Debug, Clone)]
pub struct Metrics {
    // === Timing ===
    /// When the run started
    pub start_time: Instant,

    /// When the run ended (set on completion)
    pub end_time: Option<Instant>,

    // === Input ===
    /// Records read from the input
    pub records_read: u64,

    /// Sum of the byte lengths the records declared
    pub declared_bytes: u64,

    /// Fill/drain blocks processed
    pub blocks_processed: u64,

    /// Blocks whose drain released nothing
    pub blocks_without_output: u64,

    // === Output ===
    /// Packets written to the output
    pub packets_emitted: u64,

    /// Packets written by the end-of-input flush (subset of emitted)
    pub packets_flushed: u64,

    /// Group lines written
    pub groups_emitted: u64,

    /// Bytes written to the output
    pub output_bytes: u64,

    // === Buffering ===
    /// Highest number of packets buffered at once
    pub peak_buffered: u64,

    /// Times the heap capacity doubled
    pub capacity_growths: u64,

    /// Packets still buffered at the end of the run
    pub packets_stalled: u64,

    /// Watermark at the end of the run
    pub final_watermark: i64,

    // === Arrival order ===
    /// Packets that arrived after a higher sequence number
    pub packets_reordered: u64,

    /// Packets that arrived below the watermark
    pub late_packets: u64,
}

impl Metrics {
    /// Create new metrics with start time set to now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            records_read: 0,
            declared_bytes: 0,
            blocks_processed: 0,
            blocks_without_output: 0,
            packets_emitted: 0,
            packets_flushed: 0,
            groups_emitted: 0,
            output_bytes: 0,
            peak_buffered: 0,
            capacity_growths: 0,
            packets_stalled: 0,
            final_watermark: 0,
            packets_reordered: 0,
            late_packets: 0,
        }
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Fraction of records that arrived out of order.
    pub fn reorder_rate(&self) -> f64 {
        if self.records_read == 0 {
            0.0
        } else {
            self.packets_reordered as f64 / self.records_read as f64
        }
    }

    /// Fraction of records that were emitted.
    pub fn delivery_rate(&self) -> f64 {
        if self.records_read == 0 {
            0.0
        } else {
            self.packets_emitted as f64 / self.records_read as f64
        }
    }

    /// Compute throughput in records/second.
    pub fn records_per_sec(&self) -> f64 {
        let duration_secs = self.duration().as_secs_f64();
        if duration_secs == 0.0 {
            0.0
        } else {
            self.records_read as f64 / duration_secs
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Resequencing Summary ===");
        println!("Duration: {} ms", self.duration().as_millis());
        println!();

        println!("=== Input ===");
        println!("Records read: {}", self.records_read);
        println!("Declared bytes: {}", self.declared_bytes);
        println!(
            "Blocks: {} ({} without output)",
            self.blocks_processed, self.blocks_without_output
        );
        println!(
            "Reordered arrivals: {} ({:.2}%)",
            self.packets_reordered,
            self.reorder_rate() * 100.0
        );
        println!("Late arrivals: {}", self.late_packets);
        println!();

        println!("=== Output ===");
        println!(
            "Packets emitted: {} ({:.2}%)",
            self.packets_emitted,
            self.delivery_rate() * 100.0
        );
        println!("Packets flushed past gaps: {}", self.packets_flushed);
        println!("Groups written: {}", self.groups_emitted);
        println!("Bytes written: {}", self.output_bytes);
        println!();

        println!("=== Buffering ===");
        println!("Peak buffered: {}", self.peak_buffered);
        println!("Capacity growths: {}", self.capacity_growths);
        println!("Final watermark: {}", self.final_watermark);
        println!("Stalled packets: {}", self.packets_stalled);
        println!();
    }

    /// Print just the final result.
    pub fn print_result(&self) {
        if self.packets_stalled == 0 {
            println!("✓ Resequencing completed");
            println!(
                "  {} packets in {} groups, {} ms",
                self.packets_emitted,
                self.groups_emitted,
                self.duration().as_millis()
            );
        } else {
            println!(
                "! Resequencing stalled at sequence {}: {} packets never emitted",
                self.final_watermark, self.packets_stalled
            );
        }
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "duration_ms={}\n\
             records_read={}\n\
             declared_bytes={}\n\
             blocks_processed={}\n\
             blocks_without_output={}\n\
             packets_emitted={}\n\
             packets_flushed={}\n\
             groups_emitted={}\n\
             output_bytes={}\n\
             peak_buffered={}\n\
             capacity_growths={}\n\
             packets_stalled={}\n\
             final_watermark={}\n\
             packets_reordered={}\n\
             reorder_rate={:.4}\n\
             late_packets={}\n",
            self.duration().as_millis(),
            self.records_read,
            self.declared_bytes,
            self.blocks_processed,
            self.blocks_without_output,
            self.packets_emitted,
            self.packets_flushed,
            self.groups_emitted,
            self.output_bytes,
            self.peak_buffered,
            self.capacity_growths,
            self.packets_stalled,
            self.final_watermark,
            self.packets_reordered,
            self.reorder_rate(),
            self.late_packets,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper for tracking reordering.
///
/// A packet is reordered if a higher sequence number arrived before it.
pub struct ReorderTracker {
    highest_seen: Option<i64>,
}

impl ReorderTracker {
    /// Create a new reorder tracker.
    pub fn new() -> Self {
        Self { highest_seen: None }
    }

    /// Record an arrival and return true if it arrived out of order.
    pub fn track(&mut self, sequence_number: i64) -> bool {
        match self.highest_seen {
            Some(highest) if sequence_number < highest => true,
            _ => {
                self.highest_seen = Some(sequence_number);
                false
            }
        }
    }
}

impl Default for ReorderTracker {
    fn default() -> Self {
        Self::new()
    }
}
