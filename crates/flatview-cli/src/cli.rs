//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "flatview",
    version,
    about = "Migrate flat admission records into a normalized document store",
    long_about = "Migrate a flat CSV of patient admissions into a normalized document store.\n\n\
                  Repeated columns move into reference collections, grouped columns into\n\
                  nested objects, and a flatten view rebuilds the original rows on read."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow row-level values in logs and mismatch tables.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load the source CSV, write the normalized collections and install the flatten view.
    Migrate(MigrateArgs),

    /// Compare the flatten view with the coerced source CSV.
    Verify(VerifyArgs),

    /// Print the flattening pipeline for a config.
    Pipeline(ConfigArgs),
}

#[derive(Args, Clone)]
pub struct ConfigArgs {
    /// Migration config (TOML).
    #[arg(long = "config", short = 'c', value_name = "PATH")]
    pub config: PathBuf,

    /// Store URI, overriding `store.uri` from the config.
    #[arg(long = "store", value_name = "URI")]
    pub store: Option<String>,
}

#[derive(Args, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Redefine the flatten view if it already exists.
    #[arg(long = "overwrite-view")]
    pub overwrite_view: bool,
}

#[derive(Args, Clone)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Write every difference to this CSV file.
    #[arg(long = "diff-out", value_name = "PATH")]
    pub diff_out: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
