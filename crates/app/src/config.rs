//! Configuration for the resequencer CLI.
//!
//! Handles parsing command-line arguments into a resolved [`Config`].
//! The positional contract is fixed: exactly an input path and an output
//! path. Everything else is an optional flag with a default that matches
//! the classic behavior (start at 0, stall on gaps, unbounded buffering).

use clap::Parser;
use resequencer_core::ResequenceOptions;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "resequencer",
    about = "Reorder sequence-tagged records and emit contiguous runs in order",
    version
)]
pub struct Cli {
    /// Input file (header line, then one record per line)
    pub input: PathBuf,

    /// Output file, one `|p1|p2|...|` line per drained block
    pub output: PathBuf,

    /// First sequence number expected for emission
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub start_seq: i64,

    /// Emit packets still buffered behind gaps at end of input
    #[arg(long)]
    pub flush_remainder: bool,

    /// Fail when more than N packets are buffered waiting for a gap
    #[arg(long, value_name = "N", env = "RESEQ_MAX_BUFFERED")]
    pub max_buffered: Option<usize>,

    /// Print resolved configuration
    #[arg(long)]
    pub print_config: bool,

    /// Don't print metrics summary
    #[arg(long)]
    pub no_metrics: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Complete configuration for a run.
#[derive(Debug, Clone)]
pub struct Config {
    // === Files ===
    /// Input file path
    pub input_file: PathBuf,

    /// Output file path
    pub output_file: PathBuf,

    // === Resequencing ===
    /// Core behavior knobs
    pub options: ResequenceOptions,

    // === Behavior ===
    /// Whether to print detailed config
    pub print_config: bool,

    /// Whether to print detailed metrics summary
    pub print_metrics: bool,

    /// Default log filter is `debug` instead of `info`
    pub verbose: bool,
}

impl Config {
    /// Resolve parsed arguments into a configuration.
    pub fn from_cli(cli: Cli) -> Self {
        Self {
            input_file: cli.input,
            output_file: cli.output,
            options: ResequenceOptions {
                start_sequence: cli.start_seq,
                flush_remainder: cli.flush_remainder,
                max_buffered: cli.max_buffered,
            },
            print_config: cli.print_config,
            print_metrics: !cli.no_metrics,
            verbose: cli.verbose,
        }
    }

    /// Parse configuration from an argument list (first item is the program name).
    pub fn try_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Cli::try_parse_from(args).map(Self::from_cli)
    }

    /// Default log filter directive.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        println!("Input file:  {}", self.input_file.display());
        println!("Output file: {}", self.output_file.display());
        println!();
        println!("=== Resequencing ===");
        println!("Start sequence: {}", self.options.start_sequence);
        println!("Flush remainder: {}", self.options.flush_remainder);
        match self.options.max_buffered {
            Some(limit) => println!("Max buffered: {limit} packets"),
            None => println!("Max buffered: unbounded"),
        }
        println!();
    }
}
