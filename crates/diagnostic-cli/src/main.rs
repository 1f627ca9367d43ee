mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::benchmark::{BenchmarkArgs, ThresholdsArgs};
use commands::diagnose::DiagnoseArgs;

/// Sector-benchmarked financial health diagnostics
#[derive(Parser)]
#[command(
    name = "fdx",
    version,
    about = "Sector-benchmarked financial health diagnostics",
    long_about = "Aggregates calculator results (DSO, margins, runway, LTV/CAC, ...) into \
                  a four-pillar health score, benchmarks each figure against its sector, \
                  and emits prioritised alerts and a narrator-ready summary."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace); logs go to stderr
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full diagnostic over a list of calculator results
    Diagnose(DiagnoseArgs),
    /// Benchmark a single value against its sector table
    Benchmark(BenchmarkArgs),
    /// List the reference tables
    Thresholds(ThresholdsArgs),
    /// Print only the compiled summary text
    Summary(DiagnoseArgs),
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

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Diagnose(args) => commands::diagnose::run_diagnose(args),
        Commands::Benchmark(args) => commands::benchmark::run_benchmark(args),
        Commands::Thresholds(args) => commands::benchmark::run_thresholds(args),
        Commands::Summary(args) => match commands::diagnose::run_summary(args) {
            Ok(text) => {
                println!("{}", text);
                process::exit(0);
            }
            Err(e) => Err(e),
        },
        Commands::Version => {
            println!("fdx {}", env!("CARGO_PKG_VERSION"));
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
