//! Watermark-driven resequencing over a packet heap.
//!
//! The resequencer buffers packets that arrive ahead of the next expected
//! sequence number (the watermark) and releases them only as part of a
//! contiguous run that starts exactly at the watermark.
//!
//! # Design
//!
//! - **Contiguity gating**: a missing sequence number blocks emission of
//!   everything behind it, however many later packets are already buffered
//! - **Monotonic watermark**: advances by one per released packet, never
//!   moves backwards
//! - **Optional bound**: `max_buffered` turns unbounded growth behind a
//!   permanent gap into an error
//!
//! # Late Packets
//!
//! A packet whose sequence number is below the watermark (a duplicate of an
//! already-released packet, or a straggler below the start sequence) is
//! still buffered. It sorts to the root and never equals the watermark, so
//! it stalls every later drain. Such packets are counted and logged rather
//! than dropped.
//!
//! # Memory Bounds
//!
//! Without `max_buffered`, memory grows with the number of packets held
//! behind the oldest gap. A gap that never closes retains every later
//! packet until the run ends.

use crate::error::{BufferError, Result};
use crate::heap::PacketHeap;
use crate::packet::Packet;

/// Reorder buffer releasing packets in strict sequence order.
#[derive(Debug)]
pub struct Resequencer {
    /// Packets not yet releasable
    heap: PacketHeap,

    /// Next sequence number to release
    watermark: i64,

    /// `i64::MAX` has been released; nothing further can be
    sequence_space_exhausted: bool,

    /// Reject ingestion beyond this many buffered packets
    max_buffered: Option<usize>,

    /// Highest buffered count observed
    peak_buffered: usize,

    /// Packets ingested below the watermark
    late_packets: u64,
}

impl Resequencer {
    /// Create a resequencer.
    ///
    /// # Arguments
    /// - `initial_capacity`: starting heap capacity (normally the block size)
    /// - `start_sequence`: first sequence number expected for release
    pub fn new(initial_capacity: usize, start_sequence: i64) -> Self {
        Self {
            heap: PacketHeap::with_capacity(initial_capacity),
            watermark: start_sequence,
            sequence_space_exhausted: false,
            max_buffered: None,
            peak_buffered: 0,
            late_packets: 0,
        }
    }

    /// Limit how many packets may be buffered at once.
    pub fn with_max_buffered(mut self, limit: Option<usize>) -> Self {
        self.max_buffered = limit;
        self
    }

    /// Buffer a packet until its turn comes.
    ///
    /// # Errors
    /// - `BufferError::LimitExceeded` if `max_buffered` packets are already held
    pub fn ingest(&mut self, packet: Packet) -> Result<()> {
        if let Some(limit) = self.max_buffered {
            if self.heap.len() >= limit {
                return Err(BufferError::LimitExceeded {
                    limit,
                    watermark: self.watermark,
                }
                .into());
            }
        }

        if self.is_released(packet.sequence_number) {
            self.late_packets += 1;
            tracing::warn!(
                sequence_number = packet.sequence_number,
                watermark = self.watermark,
                "packet arrived below watermark and will block draining"
            );
        }

        self.heap.insert(packet);
        self.peak_buffered = self.peak_buffered.max(self.heap.len());

        Ok(())
    }

    /// Release the maximal contiguous run starting at the watermark.
    ///
    /// Returns the released packets in ascending order. The result is empty
    /// when the packet at the watermark has not arrived yet.
    pub fn drain(&mut self) -> Result<Vec<Packet>> {
        let mut run = Vec::new();

        while !self.sequence_space_exhausted
            && self.heap.peek_min_sequence_number() == Some(self.watermark)
        {
            run.push(self.heap.extract_min()?);
            self.advance_watermark();
        }

        if !run.is_empty() {
            tracing::debug!(
                released = run.len(),
                watermark = self.watermark,
                buffered = self.heap.len(),
                "drained contiguous run"
            );
        }

        Ok(run)
    }

    /// Release everything still buffered, ignoring gaps.
    ///
    /// Packets come out in ascending sequence order. The watermark moves to
    /// one past the last released sequence number if that is ahead of it.
    pub fn flush_remaining(&mut self) -> Result<Vec<Packet>> {
        let mut rest = Vec::with_capacity(self.heap.len());

        while !self.heap.is_empty() {
            let packet = self.heap.extract_min()?;
            if packet.sequence_number >= self.watermark && !self.sequence_space_exhausted {
                self.watermark = packet.sequence_number;
                self.advance_watermark();
            }
            rest.push(packet);
        }

        Ok(rest)
    }

    /// Describe the stall, if packets are stuck behind a gap.
    pub fn stall(&self) -> Option<Stall> {
        if self.heap.is_empty() {
            return None;
        }

        Some(Stall {
            watermark: self.watermark,
            buffered: self.heap.len(),
            lowest_buffered: self.heap.peek_min_sequence_number(),
        })
    }

    /// Step past the released watermark; at `i64::MAX` it stays put.
    fn advance_watermark(&mut self) {
        match self.watermark.checked_add(1) {
            Some(next) => self.watermark = next,
            None => self.sequence_space_exhausted = true,
        }
    }

    /// True if `sequence_number` has already been released.
    fn is_released(&self, sequence_number: i64) -> bool {
        sequence_number < self.watermark
            || (self.sequence_space_exhausted && sequence_number == self.watermark)
    }

    /// Next sequence number expected for release.
    ///
    /// Once `i64::MAX` has been released the watermark stays at `i64::MAX`.
    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    /// Number of packets currently buffered.
    pub fn buffered(&self) -> usize {
        self.heap.len()
    }

    /// Check if nothing is buffered.
    pub fn is_idle(&self) -> bool {
        self.heap.is_empty()
    }

    /// Get statistics about current resequencing state.
    pub fn stats(&self) -> ResequencerStats {
        ResequencerStats {
            watermark: self.watermark,
            buffered: self.heap.len(),
            peak_buffered: self.peak_buffered,
            heap_capacity: self.heap.capacity(),
            capacity_growths: self.heap.growths(),
            late_packets: self.late_packets,
        }
    }
}

/// Packets left behind a gap that never closed.
///
/// This is a liveness condition, not an error: the run still completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stall {
    /// Sequence number that never arrived
    pub watermark: i64,

    /// Packets held behind it
    pub buffered: usize,

    /// Smallest buffered sequence number
    pub lowest_buffered: Option<i64>,
}

/// Statistics about resequencer state.
#[derive(Debug, Clone, Copy)]
pub struct ResequencerStats {
    /// Next sequence number expected for release
    pub watermark: i64,

    /// Packets currently buffered
    pub buffered: usize,

    /// Highest buffered count seen
    pub peak_buffered: usize,

    /// Current logical heap capacity
    pub heap_capacity: usize,

    /// Number of heap capacity doublings
    pub capacity_growths: u64,

    /// Packets ingested below the watermark
    pub late_packets: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn ingest_all(reseq: &mut Resequencer, seqs: &[i64]) {
        for &seq in seqs {
            reseq.ingest(Packet::new(seq, format!("p{seq}"))).unwrap();
        }
    }

    fn keys(packets: &[Packet]) -> Vec<i64> {
        packets.iter().map(|p| p.sequence_number).collect()
    }

    #[test]
    fn test_contiguity_gating() {
        let mut reseq = Resequencer::new(5, 0);
        ingest_all(&mut reseq, &[5, 1, 6, 0, 2]);

        let run = reseq.drain().unwrap();

        assert_eq!(keys(&run), vec![0, 1, 2]);
        assert_eq!(reseq.watermark(), 3);
        assert_eq!(reseq.buffered(), 2);
    }

    #[test]
    fn test_drain_nothing_when_gap_at_watermark() {
        let mut reseq = Resequencer::new(4, 0);
        ingest_all(&mut reseq, &[1, 2, 3]);

        assert!(reseq.drain().unwrap().is_empty());
        assert_eq!(reseq.watermark(), 0);
        assert_eq!(reseq.buffered(), 3);
    }

    #[test]
    fn test_gap_closes_across_drains() {
        let mut reseq = Resequencer::new(2, 0);

        ingest_all(&mut reseq, &[2, 0]);
        assert_eq!(keys(&reseq.drain().unwrap()), vec![0]);

        ingest_all(&mut reseq, &[1, 4]);
        assert_eq!(keys(&reseq.drain().unwrap()), vec![1, 2]);

        ingest_all(&mut reseq, &[3]);
        assert_eq!(keys(&reseq.drain().unwrap()), vec![3, 4]);

        assert!(reseq.is_idle());
        assert_eq!(reseq.watermark(), 5);
    }

    #[test]
    fn test_custom_start_sequence() {
        let mut reseq = Resequencer::new(4, 100);
        ingest_all(&mut reseq, &[101, 100]);

        assert_eq!(keys(&reseq.drain().unwrap()), vec![100, 101]);
        assert_eq!(reseq.watermark(), 102);
    }

    #[test]
    fn test_stall_reported() {
        let mut reseq = Resequencer::new(4, 0);
        ingest_all(&mut reseq, &[0, 1, 3, 4]);
        reseq.drain().unwrap();

        let stall = reseq.stall().unwrap();
        assert_eq!(stall.watermark, 2);
        assert_eq!(stall.buffered, 2);
        assert_eq!(stall.lowest_buffered, Some(3));
    }

    #[test]
    fn test_no_stall_when_idle() {
        let mut reseq = Resequencer::new(4, 0);
        ingest_all(&mut reseq, &[1, 0]);
        reseq.drain().unwrap();

        assert!(reseq.stall().is_none());
    }

    #[test]
    fn test_flush_remaining_ignores_gaps() {
        let mut reseq = Resequencer::new(4, 0);
        ingest_all(&mut reseq, &[9, 3, 6]);

        let rest = reseq.flush_remaining().unwrap();

        assert_eq!(keys(&rest), vec![3, 6, 9]);
        assert_eq!(reseq.watermark(), 10);
        assert!(reseq.is_idle());
    }

    #[test]
    fn test_drain_stops_at_max_sequence() {
        let mut reseq = Resequencer::new(4, i64::MAX - 1);
        ingest_all(&mut reseq, &[i64::MAX, i64::MAX - 1]);

        let run = reseq.drain().unwrap();
        assert_eq!(keys(&run), vec![i64::MAX - 1, i64::MAX]);
        assert_eq!(reseq.watermark(), i64::MAX);

        // A repeat of the last sequence number is late, not releasable
        ingest_all(&mut reseq, &[i64::MAX]);
        assert!(reseq.drain().unwrap().is_empty());
        assert_eq!(reseq.watermark(), i64::MAX);
        assert_eq!(reseq.stats().late_packets, 1);
        assert_eq!(reseq.buffered(), 1);
    }

    #[test]
    fn test_flush_with_max_sequence() {
        let mut reseq = Resequencer::new(4, 0);
        ingest_all(&mut reseq, &[i64::MAX, 5]);

        let rest = reseq.flush_remaining().unwrap();

        assert_eq!(keys(&rest), vec![5, i64::MAX]);
        assert_eq!(reseq.watermark(), i64::MAX);
        assert!(reseq.is_idle());

        // Later packets at or below the watermark can never be released
        ingest_all(&mut reseq, &[i64::MAX]);
        assert!(reseq.drain().unwrap().is_empty());
    }

    #[test]
    fn test_max_buffered_limit() {
        let mut reseq = Resequencer::new(2, 0).with_max_buffered(Some(2));
        ingest_all(&mut reseq, &[5, 6]);

        let result = reseq.ingest(Packet::new(7, "p7"));
        assert!(matches!(
            result,
            Err(Error::Buffer(BufferError::LimitExceeded {
                limit: 2,
                watermark: 0
            }))
        ));
        assert_eq!(reseq.buffered(), 2);
    }

    #[test]
    fn test_late_packet_counted_and_blocks() {
        let mut reseq = Resequencer::new(4, 0);
        ingest_all(&mut reseq, &[0, 1]);
        reseq.drain().unwrap();

        // Duplicate of an already-released packet, then the next expected one
        ingest_all(&mut reseq, &[1, 2]);

        assert!(reseq.drain().unwrap().is_empty());
        assert_eq!(reseq.stats().late_packets, 1);
        assert_eq!(reseq.watermark(), 2);
    }

    #[test]
    fn test_stats_track_peak_and_growth() {
        let mut reseq = Resequencer::new(2, 0);
        ingest_all(&mut reseq, &[3, 2, 1]);
        reseq.drain().unwrap();
        ingest_all(&mut reseq, &[0]);
        reseq.drain().unwrap();

        let stats = reseq.stats();
        assert_eq!(stats.peak_buffered, 4);
        assert_eq!(stats.capacity_growths, 1);
        assert_eq!(stats.heap_capacity, 4);
        assert_eq!(stats.buffered, 0);
        assert_eq!(stats.watermark, 4);
    }
}
