//! Trackable CLI Application
//!
//! Replays a TOML scenario through the trackable engine:
//! - Builds the described member tree in the responsibility chain
//! - Tracks each scenario event from its member
//! - Writes every emitted event as a JSON line (stdout or file)
//! - Releases the members and sweeps the chain table

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod events;
mod report;
mod state;

/// Trackable - Replay tracking scenarios through the responsibility chain
#[derive(Parser, Debug)]
#[command(name = "trackable-cli")]
#[command(about = "Replay tracking scenarios and print the emitted events", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the scenario file (TOML)
    #[arg(short, long, value_name = "FILE")]
    scenario: PathBuf,

    /// Output file for emitted events (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Prefix to strip from property keys (overrides the scenario)
    #[arg(long, value_name = "PREFIX")]
    key_prefix: Option<String>,

    /// Prefix to strip from event names (overrides the scenario)
    #[arg(long, value_name = "PREFIX")]
    event_prefix: Option<String>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Trackable CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using trackable library v{}", trackable::VERSION);

    log::info!("Loading scenario from: {:?}", args.scenario);
    let mut scenario = config::load_scenario(&args.scenario)?;
    if let Some(prefix) = &args.key_prefix {
        scenario.tracking.key_prefix_to_remove = Some(prefix.clone());
    }
    if let Some(prefix) = &args.event_prefix {
        scenario.tracking.event_prefix_to_remove = Some(prefix.clone());
    }
    trackable::configure(scenario.tracking.clone());

    let writer: Box<dyn Write + Send> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout()),
    };
    let report = report::JsonLinesReport::new(writer);
    report.install();

    let members = state::Members::build(&scenario).context("Failed to build scenario members")?;
    log::info!("Registered {} member(s)", members.len());

    let tracked = events::replay(&scenario, &members).context("Failed to replay scenario")?;
    report.flush().context("Failed to flush output")?;
    log::info!("Tracked {} event(s), wrote {} record(s)", tracked, report.written());

    let evicted = members.release();
    log::info!("Released members, evicted {} chain link(s)", evicted);

    trackable::sink::reset_sink();
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
