use clap::{Parser, Subcommand};

mod commands;

use commands::{AnalyzeArgs, ShowConfigArgs};

#[derive(Parser)]
#[command(name = "divergence")]
#[command(about = "RSI divergence analysis for close-price series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute RSI, Bollinger bands and price/RSI divergences for a price CSV
    Analyze(AnalyzeArgs),
    /// Print the effective configuration as JSON
    ShowConfig(ShowConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Log to stderr so a report written to stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze(args) => {
            commands::run_analyze(args)?;
        }
        Commands::ShowConfig(args) => {
            commands::run_show_config(&args)?;
        }
    }

    Ok(())
}
