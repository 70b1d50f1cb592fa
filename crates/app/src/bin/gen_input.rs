//! gen-input: write a reproducible out-of-order resequencer input file.
//!
//! Without `--seed` a time-based seed is used and logged, so any run can be
//! reproduced afterwards.

use anyhow::Context;
use clap::Parser;
use resequencer_app::input_gen::{write_sample_file, GenConfig};
use resequencer_app::logging;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "gen-input",
    about = "Generate a shuffled resequencer input file",
    version
)]
struct Cli {
    /// Where to write the generated input
    output: PathBuf,

    /// Number of sequence numbers to generate
    #[arg(long, default_value_t = 100)]
    packets: usize,

    /// Block size declared in the header
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    block_size: u64,

    /// Maximum scheduling delay in sequence slots
    #[arg(long, default_value_t = 8)]
    reorder_window: usize,

    /// Number of packets to leave out (creates permanent gaps)
    #[arg(long, default_value_t = 0)]
    drop: usize,

    /// Maximum payload bytes per record
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u64).range(1..))]
    max_payload_bytes: u64,

    /// Random seed for determinism
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init("info");

    let seed = cli.seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    });

    let config = GenConfig {
        packets: cli.packets,
        block_size: cli.block_size as usize,
        reorder_window: cli.reorder_window,
        drop: cli.drop,
        max_payload_bytes: cli.max_payload_bytes as usize,
        seed,
    };

    write_sample_file(&cli.output, &config)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    tracing::info!(
        path = %cli.output.display(),
        packets = config.packets,
        dropped = config.drop.min(config.packets),
        block_size = config.block_size,
        reorder_window = config.reorder_window,
        seed,
        "sample input written"
    );

    Ok(())
}
