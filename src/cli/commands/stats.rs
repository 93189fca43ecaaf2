//! lexgraph stats - Database statistics

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::robot_ok;
use crate::error::Result;
use crate::search::build_embedder;

#[derive(Args, Debug)]
pub struct StatsArgs {}

pub fn run(ctx: &AppContext, _args: &StatsArgs) -> Result<()> {
    let db = ctx.open_db()?;
    let embedder = build_embedder(&ctx.config.search)?;
    let cases = db.count_cases()?;
    let sections = db.count_sections()?;
    let embeddings = db.count_embeddings(embedder.name(), embedder.dims())?;
    let schema_version = db.schema_version();

    if ctx.robot_mode {
        return ctx.emit_json(&robot_ok(serde_json::json!({
            "database": ctx.db_path.display().to_string(),
            "schema_version": schema_version,
            "cases": cases,
            "sections": sections,
            "embeddings": embeddings,
            "embedder": embedder.name(),
            "dimensions": embedder.dims(),
        })));
    }

    println!("{}", "Database".bold());
    println!("  Path: {}", ctx.db_path.display().to_string().cyan());
    println!("  Schema version: {schema_version}");
    println!();
    println!("{}", "Graph".bold());
    println!("  Cases: {}", cases.to_string().cyan());
    println!("  Sections: {}", sections.to_string().cyan());
    println!();
    println!("{}", "Vectors".bold());
    println!(
        "  Embeddings: {} ({}, {} dims)",
        embeddings.to_string().cyan(),
        embedder.name(),
        embedder.dims()
    );
    if (embeddings as u64) < sections {
        println!(
            "  {} {} sections not indexed; run 'lexgraph index'",
            "!".yellow(),
            sections - embeddings as u64
        );
    }
    Ok(())
}
