use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Derive segment expressions for report rows and explain existing ones
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to an engine config file (TOML)
    #[arg(long, global = true, env = "SEGMENT_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// When to use colors
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,

    /// Write the output to this file as well
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured passes over a report and show the derived filters
    Annotate {
        /// Report document (JSON)
        #[arg(short, long)]
        report: PathBuf,
    },
    /// Rebuild the full label of a nested row
    Recompose {
        /// Report document (JSON)
        #[arg(short, long)]
        report: PathBuf,

        /// Row path through sub-tables, e.g. "0/2/1"
        #[arg(long)]
        row: String,
    },
    /// Explain a segment expression
    Describe {
        /// Expression such as "deviceType==smartphone;ref=@news"
        #[arg(short, long)]
        expression: String,

        /// Report document providing segment names
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Build the visitor log row action for a label
    RowAction {
        /// Report document (JSON)
        #[arg(short, long)]
        report: PathBuf,

        /// Label of the clicked row
        #[arg(short, long)]
        label: String,

        /// API method the row belongs to (defaults to the report name)
        #[arg(long)]
        api_method: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
