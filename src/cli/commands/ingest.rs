//! lexgraph ingest - Load case records into the relation graph

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::robot_ok;
use crate::error::Result;
use crate::ingest::{build_graph, load_cases};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// JSON Lines file with one case record per line
    #[arg(value_name = "FILE")]
    pub input: PathBuf,
}

pub fn run(ctx: &AppContext, args: &IngestArgs) -> Result<()> {
    let start = Instant::now();
    let loaded = load_cases(&args.input)?;
    let db = ctx.open_db()?;
    let report = build_graph(&db, &loaded)?;
    let elapsed = start.elapsed();

    if ctx.robot_mode {
        return ctx.emit_json(&robot_ok(serde_json::json!({
            "input": args.input.display().to_string(),
            "database": ctx.db_path.display().to_string(),
            "report": report,
            "elapsed_ms": elapsed.as_millis() as u64,
        })));
    }

    println!(
        "{} Ingested {} cases ({} sections) in {:.2}s",
        "✓".green().bold(),
        report.cases.to_string().bold(),
        report.sections,
        elapsed.as_secs_f64()
    );
    if report.dropped > 0 {
        println!(
            "{} {} of {} records had no section content and were dropped",
            "!".yellow(),
            report.dropped,
            report.records
        );
    }
    println!("  Database: {}", ctx.db_path.display().to_string().dimmed());
    Ok(())
}
