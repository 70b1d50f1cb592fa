//! Array-backed binary min-heap of packets, keyed by sequence number.
//!
//! Packets that arrive ahead of the watermark wait here until the gap in
//! front of them closes. The smallest sequence number is always at the root,
//! so testing whether the next expected packet is present is a single peek.
//!
//! # Layout
//!
//! ```text
//! index:    0    1    2    3    4    5    6
//!         +----+----+----+----+----+----+----+
//! seq:    |  2 |  4 |  3 |  9 |  5 |  7 |  8 |
//!         +----+----+----+----+----+----+----+
//!
//! children of i: 2i+1, 2i+2      parent of i: (i-1)/2
//! ```
//!
//! # Capacity
//!
//! `capacity` is a logical growth policy, not an allocation limit. When an
//! insertion finds `len >= capacity` the capacity doubles (saturating) and
//! storage reservation follows the live data toward it. Insertions are
//! never rejected and nothing is dropped.
//! The check runs before the append, so growth fires as soon as the heap is
//! full rather than one element past it.
//!
//! # Thread Safety
//!
//! Not thread-safe. The heap is owned by a single resequencer.

use crate::error::{HeapError, Result};
use crate::packet::Packet;

/// Upper bound on storage reserved up front, whatever the logical capacity
const MAX_INITIAL_RESERVE: usize = 1024;

/// Min-heap of packets ordered by `sequence_number`.
///
/// Extraction order among equal sequence numbers is unspecified.
#[derive(Debug)]
pub struct PacketHeap {
    /// Complete binary tree in level order
    storage: Vec<Packet>,

    /// Logical capacity, doubled on demand
    capacity: usize,

    /// Number of times the capacity has doubled
    growths: u64,
}

impl PacketHeap {
    /// Create an empty heap with the given initial capacity.
    ///
    /// The capacity is logical only. Storage reserved up front is bounded,
    /// so a huge declared capacity costs nothing until packets arrive.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Vec::with_capacity(capacity.min(MAX_INITIAL_RESERVE)),
            capacity,
            growths: 0,
        }
    }

    /// Insert a packet, growing capacity first if the heap is full.
    pub fn insert(&mut self, packet: Packet) {
        if self.storage.len() >= self.capacity {
            self.grow();
        }

        self.storage.push(packet);
        self.sift_up(self.storage.len() - 1);
    }

    /// Remove and return the packet with the smallest sequence number.
    ///
    /// # Errors
    /// - `HeapError::Empty` if the heap holds no packets. Callers are
    ///   expected to check [`is_empty`](Self::is_empty) first.
    pub fn extract_min(&mut self) -> Result<Packet> {
        if self.storage.is_empty() {
            return Err(HeapError::Empty.into());
        }

        // Moves the last element into the root slot
        let root = self.storage.swap_remove(0);
        self.sift_down(0);

        Ok(root)
    }

    /// Sequence number at the root, without removing it.
    pub fn peek_min_sequence_number(&self) -> Option<i64> {
        self.storage.first().map(|p| p.sequence_number)
    }

    /// True if no packets are buffered.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of buffered packets.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Current logical capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of capacity doublings since creation.
    pub fn growths(&self) -> u64 {
        self.growths
    }

    /// Check the min-heap property over every parent/child pair.
    pub fn satisfies_heap_property(&self) -> bool {
        (1..self.storage.len()).all(|i| {
            self.storage[parent(i)].sequence_number <= self.storage[i].sequence_number
        })
    }

    fn grow(&mut self) {
        let old = self.capacity;
        self.capacity = old.saturating_mul(2).max(1);

        // Reserve toward the new capacity, never more than the live data doubled
        let len = self.storage.len();
        let target = self.capacity.min(len.saturating_mul(2).max(1));
        self.storage.reserve(target.saturating_sub(len));
        self.growths += 1;

        tracing::trace!(from = old, to = self.capacity, "packet heap capacity doubled");
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let up = parent(index);
            if self.key(index) >= self.key(up) {
                break;
            }
            self.storage.swap(index, up);
            index = up;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.storage.len();

        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && self.key(left) < self.key(smallest) {
                smallest = left;
            }
            if right < len && self.key(right) < self.key(smallest) {
                smallest = right;
            }
            if smallest == index {
                break;
            }

            self.storage.swap(index, smallest);
            index = smallest;
        }
    }

    fn key(&self, index: usize) -> i64 {
        self.storage[index].sequence_number
    }
}

fn parent(index: usize) -> usize {
    (index - 1) / 2
}
