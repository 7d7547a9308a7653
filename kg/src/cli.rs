//! CLI argument parsing for kg

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kg")]
#[command(author, version, about = "Prerequisite-linked knowledge graph store", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bulk-load knowledge points from a YAML file
    Seed {
        /// YAML file containing a list of knowledge points
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Search points by substring on name or description
    Search {
        /// Keyword to search for
        #[arg(required = true)]
        keyword: String,
    },

    /// Show shortest prerequisite paths between two topics
    Path {
        /// Start topic (name or category substring)
        #[arg(required = true)]
        start: String,

        /// End topic (name or category substring)
        #[arg(required = true)]
        end: String,

        /// Maximum hop count
        #[arg(short, long, default_value = "5")]
        depth: usize,
    },

    /// Show a single point
    Show {
        /// Exact point name
        #[arg(required = true)]
        name: String,
    },

    /// List all point names
    List,
}
