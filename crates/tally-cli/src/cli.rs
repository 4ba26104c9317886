//! CLI definition using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tally_types::OutputFormat;

#[derive(Parser)]
#[command(name = "vessel-tally")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Container movement summaries from vessel operation report photos")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Provider API key (otherwise GEMINI_API_KEY, then the config file)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Candidate model override, tried in the given order
    #[arg(long, global = true, value_delimiter = ',')]
    pub model: Vec<String>,

    /// Output format (table, json, tsv). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read report images and build the summary table
    Process {
        /// Image files or folders, processed in the given order
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Vessel name for every row (otherwise read from the image)
        #[arg(long)]
        vessel: Option<String>,

        /// Service/voyage label for every row
        #[arg(long)]
        service: Option<String>,

        /// Write the table as an Excel workbook
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write the table as tab-separated text
        #[arg(long)]
        tsv: Option<PathBuf>,

        /// Save the rows as a results file for later combine/export
        #[arg(long)]
        json: Option<PathBuf>,

        /// Also print the sum of these row numbers (e.g. 1,3)
        #[arg(long, value_delimiter = ',')]
        combine: Vec<u64>,

        /// Append the granular recon columns to exports
        #[arg(long)]
        recon: bool,
    },

    /// Sum selected rows of a results file
    Combine {
        /// Path to JSON results file
        results: PathBuf,

        /// Row numbers to sum (default: all rows)
        #[arg(long, short = 's', value_delimiter = ',')]
        select: Vec<u64>,

        /// Write the selected rows and their sum as an Excel workbook
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write the selected rows and their sum as tab-separated text
        #[arg(long)]
        tsv: Option<PathBuf>,
    },

    /// Export a results file to Excel (and optionally TSV)
    Export {
        /// Path to JSON results file
        results: PathBuf,

        /// Output Excel file path
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output TSV file path
        #[arg(long)]
        tsv: Option<PathBuf>,

        /// Append the granular recon columns
        #[arg(long)]
        recon: bool,
    },

    /// Show the ranked candidate models
    Models,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Store the provider API key in the config file
        #[arg(long)]
        set_api_key: Option<String>,

        /// Pin candidate models (comma separated, empty to discover)
        #[arg(long, value_delimiter = ',')]
        set_models: Option<Vec<String>>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Enable/disable recon columns in exports
        #[arg(long)]
        set_recon: Option<bool>,

        /// Set JPEG quality for normalized images (1-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        set_jpeg_quality: Option<u8>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}
