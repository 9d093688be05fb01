mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::bonus::CalculateArgs;
use commands::lookup::LookupArgs;
use commands::policy::DefaultsArgs;

/// Tiered sales and cost-optimization bonus calculations
#[derive(Parser)]
#[command(
    name = "tbonus",
    version,
    about = "Tiered sales and cost-optimization bonus calculations",
    long_about = "A CLI for computing per-person bonuses across two business lines \
                  with decimal precision. Combined revenue selects a rate tier, each \
                  line's cost ratio selects a factor tier, and lines below the \
                  eligibility threshold earn an optimization bonus."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log per-record decisions to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute bonuses for a batch of people
    Calculate(CalculateArgs),
    /// Evaluate one tier table at a single query value
    Lookup(LookupArgs),
    /// Print the default policy (tables, threshold, currency, rounding)
    Defaults(DefaultsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => match commands::bonus::run_calculate(args, &cli.output) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => return,
            Err(e) => Err(e),
        },
        Commands::Lookup(args) => commands::lookup::run_lookup(args),
        Commands::Defaults(args) => match commands::policy::run_defaults(args) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => return,
            Err(e) => Err(e),
        },
        Commands::Version => {
            println!("tbonus {}", env!("CARGO_PKG_VERSION"));
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
