mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::rcf::{EconomicsArgs, ReportArgs, SweepArgs};

/// Revolving credit facility and credit-linked note economics
#[derive(Parser)]
#[command(
    name = "rcf",
    version,
    about = "Revolving credit facility and CLN economics",
    long_about = "A CLI for pricing revolving credit facilities with decimal precision. \
                  Splits a facility into drawn and undrawn legs, blends the income and \
                  cost lines, and applies an optional credit-linked note risk transfer."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate drawn/undrawn income, blended lines and CLN impact
    Economics(EconomicsArgs),
    /// Print the results table, CLN impact table and summary
    Report(ReportArgs),
    /// Re-price the facility across a range of drawn fractions
    Sweep(SweepArgs),
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

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Economics(args) => commands::rcf::run_economics(args),
        Commands::Report(args) => commands::rcf::run_report(args),
        Commands::Sweep(args) => commands::rcf::run_sweep(args),
        Commands::Version => {
            println!("rcf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {:?}", e);
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
