use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_OUTPUT: &str = "analyze_results.log";

#[derive(Parser)]
#[command(
    name = "mcw",
    about = "Minecraft World Converter: finds differences between two modded world saves",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare two world saves and write the proposed conversion actions
    Analyze(AnalyzeArgs),
    /// Parse an analysis report and list malformed lines
    Check(CheckArgs),
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Save of the older game version
    pub old: PathBuf,
    /// Save of the newer game version
    pub new: PathBuf,
    /// File the report is written to
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,
    /// Overwrite the output file if it exists
    #[arg(short, long)]
    pub force: bool,
    /// Report every changed block and disable similar-name matching of block entities
    #[arg(long)]
    pub strict: bool,
    /// Number of chunk comparison workers
    #[arg(short, long)]
    pub workers: Option<usize>,
    /// TOML file with comparison settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    pub report: PathBuf,
}
