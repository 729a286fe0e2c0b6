//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// Domain ownership verifier: samples DNS for pending custom domains and
/// activates the ones that point at the platform.
#[derive(Debug, Parser)]
#[command(author, version)]
pub struct Args {
    /// Configuration file (TOML)
    #[arg(long, short, env = "DOMAIN_VERIFIER_CONFIG", value_name = "FILE")]
    pub config: PathBuf,

    /// Run one verifier tick and one rescheduler tick, then exit
    #[arg(long)]
    pub once: bool,
}
