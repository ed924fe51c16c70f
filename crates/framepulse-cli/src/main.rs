mod commands;
mod indicator;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use framepulse_core::consts::PROGRESS_LOG_TARGET;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "framepulse", about = "Parallel frame reduction with live progress")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sum a synthetic frame stack in parallel, reporting progress
    Run(commands::run::RunArgs),
    /// Print or save the default job config as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::new(log_directives(&cli));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}

/// Filter directives: `debug` when verbose, otherwise `warn` with progress
/// lines let through when `run --log-progress` asks for them.
fn log_directives(cli: &Cli) -> String {
    if cli.verbose {
        return "debug".into();
    }
    match &cli.command {
        Commands::Run(args) if args.log_progress => format!("warn,{PROGRESS_LOG_TARGET}=info"),
        _ => "warn".into(),
    }
}
