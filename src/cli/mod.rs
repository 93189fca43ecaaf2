//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;
pub mod progress;

/// lexgraph - Hybrid semantic and relation-graph retrieval of case sections
#[derive(Parser, Debug)]
#[command(name = "lexgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable JSON output for machine consumption
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/lexgraph/config.toml, then <root>/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the database (default: ./.lexgraph)
    #[arg(long, global = true, env = "LEXGRAPH_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load case records (JSON Lines) into the relation graph
    Ingest(commands::ingest::IngestArgs),

    /// Embed every stored section into the vector store
    Index(commands::index::IndexArgs),

    /// Retrieve and rerank case sections for a query
    Query(commands::query::QueryArgs),

    /// Graph distance between two cases
    Distance(commands::distance::DistanceArgs),

    /// Embed text with the configured backend
    Embed(commands::embed::EmbedArgs),

    /// Show database statistics
    Stats(commands::stats::StatsArgs),
}
