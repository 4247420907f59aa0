//! CLI parse: clap types for condmerge. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Condmerge CLI - merge run files recorded under the same conditions
#[derive(Parser)]
#[command(name = "condmerge")]
#[command(about = "Consolidate hierarchical run files into per-condition aggregates")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Working directory holding condmerge.toml
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cluster and merge run files
    Merge {
        /// Input files, merged in the given order (default: discover in --input-dir)
        inputs: Vec<PathBuf>,
        /// Directory scanned for inputs when none are given
        #[arg(long, default_value = ".")]
        input_dir: PathBuf,
        /// Directory receiving outputs
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Report the grouping without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List the summary datasets of a store (the parameters available for comparison)
    Show {
        file: PathBuf,
    },
    /// Print a store as JSON
    Dump {
        file: PathBuf,
    },
    /// Write a store from a JSON document
    Import {
        json: PathBuf,
        out: PathBuf,
    },
    /// Rewrite a store through the merge walker, making its vectors and matrices growable
    Copy {
        file: PathBuf,
        out: PathBuf,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
