//! resequencer CLI: reorder a record file into in-sequence output groups.
//!
//! Usage: `resequencer <input> <output> [OPTIONS]`
//!
//! Exit codes: 0 on success (including a stalled watermark), 1 on a usage
//! error or any failed run.

use anyhow::Context;
use clap::error::ErrorKind;
use resequencer_app::config::Config;
use resequencer_app::logging;
use resequencer_core::resequence_file;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match Config::try_from_args(std::env::args_os()) {
        Ok(config) => config,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    logging::init(config.log_filter());

    if config.print_config {
        config.print();
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let report = resequence_file(&config.input_file, &config.output_file, &config.options)
        .with_context(|| {
            format!(
                "failed to resequence {} into {}",
                config.input_file.display(),
                config.output_file.display()
            )
        })?;

    if config.print_metrics {
        report.metrics.print_summary();
        report.metrics.print_result();
    }

    Ok(())
}
