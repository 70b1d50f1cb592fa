//! resequencer: command-line front end for `resequencer-core`
//!
//! - `config`: argument parsing and resolved run configuration
//! - `input_gen`: seeded generator for out-of-order sample inputs
//! - `logging`: tracing subscriber setup shared by both binaries

pub mod config;
pub mod input_gen;
pub mod logging;
