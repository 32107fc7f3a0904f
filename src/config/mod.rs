pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::export::ExportFormat;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "dining-nutrition")]
#[command(about = "Extracts nutrition facts from campus dining menu pages")]
pub struct CliConfig {
    /// Path to a TOML configuration file; built-in venues are used otherwise
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List every configured venue
    Locations,

    /// Extract one venue's menu
    Scrape {
        venue: String,

        /// Item to estimate if the page yields nothing (repeatable)
        #[arg(long = "expect")]
        expected: Vec<String>,
    },

    /// Search item names across open venues, or one venue
    Search {
        query: String,

        #[arg(long)]
        venue: Option<String>,
    },

    /// Extract every open venue and write the batch report
    ScrapeAll {
        /// Venues not started within this many seconds are skipped
        #[arg(long)]
        deadline_secs: Option<u64>,

        #[arg(long, default_value = "./output")]
        output: String,

        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
}
