//! update-acls: rebuild access lists from their sources and push them out.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use update_acls::{DEFAULT_CONFIG_PATH, OutputFormat, RunOptions, SystemCommandRunner};

/// Expand the configured user lists and write them to their destinations
#[derive(Parser, Debug)]
#[command(name = "update-acls")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Expand the lists but do not write any destination
    #[arg(long)]
    no_targets: bool,

    /// Log the configured lists and print the expanded ones
    #[arg(long)]
    show_lists: bool,

    /// Output format for --show-lists
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = RunOptions {
        config_path: cli.config,
        no_targets: cli.no_targets,
        show_lists: cli.show_lists,
        format: cli.format,
    };

    let mut stdout = io::stdout().lock();
    match update_acls::run(&options, Arc::new(SystemCommandRunner), &mut stdout) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            error!(
                event = "Run",
                phase = "Done",
                errors = report.errors().count(),
                "finished with errors"
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(event = "Run", phase = "Fatal", error = %e);
            ExitCode::FAILURE
        }
    }
}
