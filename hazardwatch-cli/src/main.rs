//! HazardWatch CLI - diagnostics and route replay for the proximity engine.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::replay::ReplayArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "hazardwatch", version, about = "Proximity hazard alerts")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the great-circle distance between two points
    #[command(allow_negative_numbers = true)]
    Distance {
        from_lat: f64,
        from_lon: f64,
        to_lat: f64,
        to_lon: f64,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        /// Target file (default: ~/.hazardwatch/config.ini)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Replay a recorded route against a hazard list
    Replay(ReplayArgs),
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
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Distance {
            from_lat,
            from_lon,
            to_lat,
            to_lon,
        } => commands::distance::run((from_lat, from_lon), (to_lat, to_lon)),
        Command::Init { force, path } => commands::init::run(path, force),
        Command::Replay(args) => commands::replay::run(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
