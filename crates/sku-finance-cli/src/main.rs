mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::{BatchArgs, InputArgs};
use sku_finance_core::EngineConfig;

/// SKU business-case projections
#[derive(Parser)]
#[command(
    name = "skufin",
    version,
    about = "SKU business-case projections with decimal precision",
    long_about = "Projects multi-year pricing, P&L, cash flow and returns for \
                  injection-moulded SKU business cases, and runs sensitivities, \
                  scenarios, two-way grids, goal seeks and Monte Carlo simulations \
                  over them. Requests are JSON or YAML, from --input or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (JSON or YAML)
    #[arg(long, global = true)]
    config: Option<String>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full projection for a business case
    Calculate(InputArgs),
    /// Objective metrics of the unmodified case
    Baseline(InputArgs),
    /// One-at-a-time perturbation batch (optionally with a tornado ranking)
    Sensitivity(BatchArgs),
    /// Named scenarios of absolute overrides
    Scenarios(BatchArgs),
    /// Two-way sweep of two parameters for one metric
    Grid(BatchArgs),
    /// Goal seek a metric by grid search or bisection
    Optimize(BatchArgs),
    /// Monte Carlo simulation over uncertain inputs
    Simulate(BatchArgs),
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

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => input::file::read_document::<EngineConfig>(p)?,
        None => EngineConfig::default(),
    };
    config.validate()?;
    debug!(?config, "engine configuration loaded");
    Ok(config)
}

fn fail(e: Box<dyn std::error::Error>) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => fail(e),
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::calculate::run_calculate(args, &config),
        Commands::Baseline(args) => commands::calculate::run_baseline_metrics(args, &config),
        Commands::Sensitivity(args) => commands::analysis::run_sensitivity_batch(args, &config),
        Commands::Scenarios(args) => commands::analysis::run_scenario_batch(args, &config),
        Commands::Grid(args) => commands::analysis::run_grid(args, &config),
        Commands::Optimize(args) => commands::analysis::run_optimize(args, &config),
        Commands::Simulate(args) => commands::simulate::run_simulation(args, &config),
        Commands::Version => {
            println!("skufin {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => fail(e),
    }
}
