mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::monte_carlo::MonteCarloArgs;
use commands::presets::PresetsArgs;
use commands::scenario::ScenarioArgs;

/// Portfolio scenario and Monte Carlo projections
#[derive(Parser)]
#[command(
    name = "stocker",
    version,
    about = "Portfolio scenario and Monte Carlo projections",
    long_about = "Project how an investment portfolio may evolve over a multi-year horizon. \
                  Simulates single plans year by year and runs Monte Carlo batches to estimate \
                  the likelihood of reaching an inflation-adjusted goal."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one random path of a plan
    Scenario(ScenarioArgs),
    /// Run a Monte Carlo batch over a plan
    MonteCarlo(MonteCarloArgs),
    /// List built-in positions and portfolios
    Presets(PresetsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
    Report,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Scenario(args) => commands::scenario::run_scenario(args),
        Commands::MonteCarlo(args) => commands::monte_carlo::run_monte_carlo(args),
        Commands::Presets(args) => commands::presets::run_presets(args),
        Commands::Version => {
            println!("stocker {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
