//! submit-listener CLI - simulate form submission lifecycles.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use submit_listener::config::{OutputFormat, load_config};
use submit_listener::{cli, logging};

#[derive(Parser)]
#[command(name = "submit-listener")]
#[command(author, version, about = "Submission lifecycle hooks for form-state engines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file and print the lifecycle trace.
    Simulate {
        /// Path to the scenario TOML file.
        scenario: PathBuf,

        /// Report format. Defaults to the configured format.
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show the effective configuration.
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("submit-listener: error: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.log.filter);

    let result = match cli.command {
        Commands::Simulate { scenario, format } => {
            cli::simulate::run(&scenario, format.unwrap_or(config.simulation.format))
        }
        Commands::Config => cli::config::run(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("submit-listener: error: {e}");
            ExitCode::FAILURE
        }
    }
}
