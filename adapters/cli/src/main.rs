#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays a scripted heist session.

mod scenario;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{scenario::Scenario, session::Session};

/// Replays a heist scenario and prints path previews and outbound wire messages.
#[derive(Debug, Parser)]
#[command(name = "heist", version, about)]
struct Args {
    /// TOML scenario describing tiles, heroes, players and the script.
    scenario: PathBuf,
    /// Print a fingerprint of the session after the summary.
    #[arg(long)]
    fingerprint: bool,
}

/// Entry point for the heist command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let scenario = Scenario::load(&args.scenario)?;
    let mut session = Session::new(&scenario)?;
    session.run(&scenario.script)?;

    for line in session.transcript() {
        println!("{line}");
    }
    println!("{}", session.summary());
    if args.fingerprint {
        println!("fingerprint {:016x}", session.fingerprint());
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
