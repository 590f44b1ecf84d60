//! CLI module - Command-line interface for Construyo planning searches
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::FilterType;

/// Construyo - planning application search
/// Finds new planning applications near your customers
#[derive(Parser)]
#[command(name = "construyo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the planning registry and show new applications
    #[command(alias = "s")]
    Search {
        /// Postcode to search, e.g. "E1 6AN"
        #[arg(long, conflicts_with = "authority", required_unless_present = "authority")]
        postcode: Option<String>,

        /// Local authority name, e.g. "Tower Hamlets"
        #[arg(long)]
        authority: Option<String>,

        /// Maximum results to fetch (defaults to registry.default_limit)
        #[arg(long)]
        limit: Option<u32>,

        /// Webhook to notify when new applications are found
        #[arg(long)]
        webhook: Option<String>,

        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show stored snapshots for a filter value
    #[command(alias = "h")]
    History {
        /// Filter value as typed in a search
        #[arg(required = true)]
        value: Vec<String>,

        /// Which kind of filter the value is
        #[arg(long = "type", value_enum, default_value_t = FilterArg::Postcode)]
        filter_type: FilterArg,

        /// Number of snapshots to show
        #[arg(long, default_value = "10")]
        limit: u64,
    },

    /// Delete old snapshots, keeping the newest per filter value
    Prune {
        /// Snapshots to keep per key (defaults to cache.retention.max_records_per_key)
        #[arg(long)]
        keep: Option<u32>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FilterArg {
    Postcode,
    Authority,
}

impl From<FilterArg> for FilterType {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Postcode => Self::Postcode,
            FilterArg::Authority => Self::LocalAuthority,
        }
    }
}

pub use commands::*;
