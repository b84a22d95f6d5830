//! Catch-the-Cat CLI - Command-line interface
//!
//! Commands:
//! - run: Play a competition between external agents
//! - decode: Expand a compact competition report
//! - layout: Print a generated initial layout

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod decode_cmd;
mod layout_cmd;
mod run_cmd;

#[derive(Parser)]
#[command(name = "catchcat")]
#[command(about = "Catch-the-Cat agent competition arena")]
struct Cli {
    /// Random seed for layout generation
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a competition from a config file
    Run(run_cmd::RunArgs),
    /// Decode a compact report into the verbose form
    Decode(decode_cmd::DecodeArgs),
    /// Generate and print an initial layout
    Layout(layout_cmd::LayoutArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for reports
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_cmd::run(args, cli.seed),
        Commands::Decode(args) => decode_cmd::run(args),
        Commands::Layout(args) => layout_cmd::run(args, cli.seed),
    }
}
