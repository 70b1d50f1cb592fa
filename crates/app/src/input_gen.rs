//! Sample input generation for demos and testing.
//!
//! Produces a valid resequencer input file whose records arrive out of
//! order in a controlled, reproducible way.
//!
//! # Design
//!
//! Each sequence number is scheduled at `seq + delay`, where `delay` is
//! drawn uniformly from `0..=reorder_window`, and records are written in
//! scheduled order. No packet can be overtaken by one more than
//! `reorder_window` positions behind it, so the window bounds how far the
//! output lags the input. Optionally some packets are dropped, which opens
//! permanent gaps and exercises the stall path.
//!
//! All randomness comes from a seeded ChaCha8 RNG, so the same config
//! always yields byte-identical files.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::path::Path;

/// Parameters for a generated input file.
#[derive(Debug, Clone, Copy)]
pub struct GenConfig {
    /// Sequence numbers `0..packets` are generated
    pub packets: usize,

    /// Block size written to the header
    pub block_size: usize,

    /// Maximum scheduling delay, in sequence slots
    pub reorder_window: usize,

    /// Number of packets removed to create gaps
    pub drop: usize,

    /// Upper bound on payload bytes per record (at least 1)
    pub max_payload_bytes: usize,

    /// Random seed for determinism
    pub seed: u64,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            packets: 100,
            block_size: 10,
            reorder_window: 8,
            drop: 0,
            max_payload_bytes: 8,
            seed: 42,
        }
    }
}

/// One generated record: sequence number and raw payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    pub sequence_number: i64,
    pub bytes: Vec<u8>,
}

/// Generate records in arrival order.
pub fn generate_records(config: &GenConfig) -> Vec<SampleRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let drop_count = config.drop.min(config.packets);
    let dropped: HashSet<usize> = index::sample(&mut rng, config.packets, drop_count)
        .into_iter()
        .collect();

    let mut scheduled: Vec<(usize, SampleRecord)> = Vec::with_capacity(config.packets);
    for seq in 0..config.packets {
        let delay = rng.gen_range(0..=config.reorder_window);
        let len = rng.gen_range(1..=config.max_payload_bytes.max(1));
        let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();

        if dropped.contains(&seq) {
            continue;
        }

        scheduled.push((
            seq + delay,
            SampleRecord {
                sequence_number: seq as i64,
                bytes,
            },
        ));
    }

    // Ties keep sequence order
    scheduled.sort_by_key(|(slot, record)| (*slot, record.sequence_number));
    scheduled.into_iter().map(|(_, record)| record).collect()
}

/// Render a complete input file (header plus records) as text.
pub fn render_input(config: &GenConfig) -> String {
    let records = generate_records(config);
    let mut text = String::new();

    text.push_str(&format!("{} {}\n", records.len(), config.block_size.max(1)));
    for record in &records {
        text.push_str(&render_record(record));
        text.push('\n');
    }

    text
}

/// Format one record line (without the newline).
fn render_record(record: &SampleRecord) -> String {
    let mut line = format!("{} {}", record.sequence_number, record.bytes.len());
    for byte in &record.bytes {
        line.push_str(&format!(" {byte:02x}"));
    }
    line
}

/// Write a generated input file.
pub fn write_sample_file(path: &Path, config: &GenConfig) -> std::io::Result<()> {
    std::fs::write(path, render_input(config))
}
