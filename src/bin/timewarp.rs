//! Time Warp command-line runner
//!
//! Runs PILOT, BASIC and Logo programs from a file. Logging goes to stderr
//! and is controlled with `RUST_LOG`.

use timewarp_core::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run_cli() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
