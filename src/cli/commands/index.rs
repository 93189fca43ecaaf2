//! lexgraph index - Embed stored sections into the vector store

use std::time::Instant;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::robot_ok;
use crate::cli::progress::progress_bar;
use crate::error::Result;
use crate::ingest::{IndexOptions, index_sections};
use crate::search::{DistanceMetric, SqliteVectorStore, build_embedder};

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Re-embed every section, even when content is unchanged
    #[arg(long, short)]
    pub force: bool,
}

pub fn run(ctx: &AppContext, args: &IndexArgs) -> Result<()> {
    let start = Instant::now();
    let db = ctx.open_db()?;
    let embedder = build_embedder(&ctx.config.search)?;
    let metric = DistanceMetric::parse(&ctx.config.search.distance_metric)?;
    let store = SqliteVectorStore::new(&ctx.db_path, embedder.dims(), metric)
        .with_embedder_type(embedder.name());
    let options = IndexOptions {
        skip_unchanged: ctx.config.ingest.skip_unchanged && !args.force,
    };

    let total = db.count_sections()?;
    let bar = progress_bar(ctx.progress_mode, total, "Indexing");
    let report = index_sections(&db, embedder.as_ref(), &store, options, &bar)?;
    let elapsed = start.elapsed();

    if ctx.robot_mode {
        let response = robot_ok(serde_json::json!({
            "embedder": embedder.name(),
            "dimensions": embedder.dims(),
            "report": report,
            "elapsed_ms": elapsed.as_millis() as u64,
        }));
        let response = if report.failed > 0 {
            response.with_warnings(vec![format!("{} sections failed to index", report.failed)])
        } else {
            response
        };
        return ctx.emit_json(&response);
    }

    println!(
        "{} Indexed {} sections in {:.2}s ({} unchanged, {} empty, {} errors)",
        "✓".green().bold(),
        report.indexed.to_string().bold(),
        elapsed.as_secs_f64(),
        report.unchanged,
        report.skipped_empty,
        report.failed
    );
    println!(
        "  Embedder: {} ({} dims)",
        embedder.name().cyan(),
        embedder.dims()
    );

    if report.failed > 0 {
        println!();
        println!(
            "{} {} sections failed to index; rerun with -v for details",
            "!".yellow(),
            report.failed
        );
    }
    Ok(())
}
