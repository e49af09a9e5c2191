//! Command-line host for Game Master Portals.
//!
//! Keeps an initiative tracker in a JSON session file, rolls dice
//! expressions, and prints the player-facing portal text.

mod commands;
mod conditions;
mod resolve;
mod session;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "gm",
    about = "Game Master Portals: initiative tracking and dice for the table",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll a dice expression such as "2d6+3" or "-1d4 + d20"
    Roll {
        /// The expression (may be split across several arguments)
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        expression: Vec<String>,

        /// RNG seed for a reproducible roll
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Manage the initiative tracker stored in a session file
    Tracker {
        /// Session file holding the tracker state
        #[arg(
            short,
            long,
            env = "GM_SESSION_FILE",
            default_value = "session.json",
            global = true
        )]
        file: PathBuf,

        #[command(subcommand)]
        command: commands::tracker::TrackerCommand,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "gm=debug,gm_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let result = match cli.command {
        Commands::Roll { expression, seed } => commands::roll::run(&expression.join(" "), seed),
        Commands::Tracker { file, command } => commands::tracker::run(&file, command),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
