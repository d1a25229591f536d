//! kharness CLI entry point

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = kharness::cli::Cli::parse();

    // Structured logging to stderr; --debug overrides RUST_LOG, otherwise default to info
    let filter = if cli.debug() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    kharness::cli::run(cli);
}
