//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use recordreader::Profile;
use std::path::PathBuf;

use crate::target::StoreFormat;

/// ImportPacer - paced, sequential record importer
#[derive(Parser)]
#[command(
    name = "ip",
    about = "Replay delimited records into a single-writer target, one at a time",
    version,
    after_help = "Logs are written to: ~/.local/share/importpacer/logs/importpacer.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Import every record of a file into the target
    Run(RunArgs),

    /// Parse a file and report records that do not match the schema
    Check {
        /// Record file (one record per line, comma separated)
        file: PathBuf,

        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Print the effective configuration as YAML
    ShowConfig,
}

/// Field schema selection
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SchemaArgs {
    /// Built-in schema (address, keyword)
    #[arg(long)]
    pub profile: Option<Profile>,

    /// Explicit field names in column order; suffix `!` marks a field required
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,
}

/// Arguments of `ip run`
#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Record file (one record per line, comma separated)
    pub file: PathBuf,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Pause between records in milliseconds
    #[arg(long)]
    pub settle_delay_ms: Option<u64>,

    /// Deadline for each interaction step in milliseconds
    #[arg(long)]
    pub step_timeout_ms: Option<u64>,

    /// Target kind
    #[arg(short, long, value_enum)]
    pub target: Option<TargetKind>,

    /// Store file for the store target
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Document shape for the store target (plain, autofill)
    #[arg(long)]
    pub store_format: Option<StoreFormat>,

    /// Entry page URL for the form target
    #[arg(long)]
    pub open_url: Option<String>,

    /// Save endpoint URL for the form target
    #[arg(long)]
    pub save_url: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Target kinds selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetKind {
    Memory,
    Store,
    Form,
}

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
