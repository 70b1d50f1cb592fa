//! resequencer-core: bounded-buffer packet resequencing
//!
//! This library takes sequence-tagged records in arbitrary arrival order
//! and emits them in strict sequence order:
//! - Records are ingested in fixed-size blocks
//! - Packets ahead of the next expected sequence number wait in a min-heap
//! - After each block, the contiguous run starting at the watermark is
//!   drained and written as one output group
//!
//! # Architecture
//!
//! - `packet`: the sequence-tagged payload unit
//! - `heap`: array-backed min-heap with capacity doubling
//! - `resequencer`: watermark gating, flush and stall reporting
//! - `input`: header and record parsing
//! - `output`: group line formatting
//! - `driver`: the block-wise fill/drain loop
//! - `metrics`: observable run behavior
//!
//! # Design Principles
//!
//! - **No panics**: heap misuse and bad input surface as structured errors
//! - **No silent loss**: malformed records fail the run instead of opening gaps
//! - **Always terminates**: a permanent gap stalls output but not the run

pub mod driver;
pub mod error;
pub mod heap;
pub mod input;
pub mod metrics;
pub mod output;
pub mod packet;
pub mod resequencer;

// Re-export commonly used types
pub use driver::{resequence, resequence_file, ResequenceOptions, RunReport};
pub use error::{Error, Result};
pub use packet::Packet;
