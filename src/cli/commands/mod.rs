//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod distance;
pub mod embed;
pub mod index;
pub mod ingest;
pub mod query;
pub mod stats;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Ingest(args) => ingest::run(ctx, args),
        Commands::Index(args) => index::run(ctx, args),
        Commands::Query(args) => query::run(ctx, args),
        Commands::Distance(args) => distance::run(ctx, args),
        Commands::Embed(args) => embed::run(ctx, args),
        Commands::Stats(args) => stats::run(ctx, args),
    }
}
