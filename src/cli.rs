//! CLI struct definitions for the `ltv` command-line interface.
//!
//! All clap-derived types live here. Dispatch lives in `lib.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "ltv",
    version = env!("CARGO_PKG_VERSION"),
    about = "Ingest business events into an in-memory store and rank customers by lifetime value",
    disable_version_flag = true
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./ltv.toml when present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Do not append to the ingestion journal for this run.
    #[clap(long, global = true)]
    pub no_journal: bool,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Ingest event files, then print the top customers by LTV
    Report(ReportCli),
    /// Ingest event files, then print every table of the record store
    Display(DisplayCli),
    /// Interactive session over one in-memory store
    Shell,
    /// Describe the subsystems as JSON
    Schema,
    /// Print the version
    Version,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ReportCli {
    /// Event batch files (JSON arrays), ingested in the given order.
    #[clap(long = "events", required = true, num_args = 1..)]
    pub events: Vec<PathBuf>,
    /// Number of customers to show (defaults to `default_top` from config).
    #[clap(long)]
    pub top: Option<usize>,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text")]
    pub format: String,
}

#[derive(clap::Args, Debug)]
pub(crate) struct DisplayCli {
    /// Event batch files (JSON arrays), ingested in the given order.
    #[clap(long = "events", required = true, num_args = 1..)]
    pub events: Vec<PathBuf>,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text")]
    pub format: String,
}
