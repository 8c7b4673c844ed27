#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod logging;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "heft")]
#[command(author, version, about = "Installed-size costing for stored packages", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the package cost endpoint over HTTP
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, short = 'p', default_value = "8080")]
        port: u16,

        /// Path to the package index JSON file
        #[arg(long, value_name = "FILE")]
        index: PathBuf,

        /// Directory holding stored package artifacts
        #[arg(long, value_name = "DIR")]
        artifacts: PathBuf,
    },

    /// Compute the cost of one stored package and print it
    Cost {
        /// Package identifier to cost
        id: String,

        /// Include transitive dependency cost
        #[arg(long)]
        deps: bool,

        /// Path to the package index JSON file
        #[arg(long, value_name = "FILE")]
        index: PathBuf,

        /// Directory holding stored package artifacts
        #[arg(long, value_name = "DIR")]
        artifacts: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.json);

    let rt = tokio::runtime::Runtime::new().into_diagnostic()?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            index,
            artifacts,
        } => rt.block_on(commands::serve::run(commands::serve::ServeAction {
            host,
            port,
            index,
            artifacts,
        })),
        Commands::Cost {
            id,
            deps,
            index,
            artifacts,
        } => rt.block_on(commands::cost::run(&id, deps, &index, &artifacts, cli.json)),
    }
}
