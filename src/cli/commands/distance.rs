//! lexgraph distance - Graph distance between two cases

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::robot_ok;
use crate::error::Result;
use crate::graph::{GraphProximity, GraphSignal, SqliteGraph};
use crate::search::SectionFilter;

#[derive(Args, Debug)]
pub struct DistanceArgs {
    /// First case id (e.g. Case_0)
    pub case_a: String,

    /// Second case id
    pub case_b: String,

    /// Count only sections of this type (label or title); "all" for none
    #[arg(long, short)]
    pub section: Option<String>,
}

pub fn run(ctx: &AppContext, args: &DistanceArgs) -> Result<()> {
    let graph = SqliteGraph::new(&ctx.db_path);
    let proximity = GraphProximity::new(Arc::new(graph))
        .with_timeout(Duration::from_millis(ctx.config.graph.timeout_ms));
    let filter = SectionFilter::from_option(args.section.as_deref());
    let distance = proximity.distance(&args.case_a, &args.case_b, filter.label())?;
    let signal = GraphSignal::from_distance(Ok(distance));

    if ctx.robot_mode {
        return ctx.emit_json(&robot_ok(serde_json::json!({
            "case_a": args.case_a,
            "case_b": args.case_b,
            "section": filter.to_string(),
            // JSON has no infinity; unlinked pairs report null
            "distance": distance.is_finite().then_some(distance),
            "structural_score": signal.structural_score(),
            "signal": signal,
        })));
    }

    let rendered = if distance.is_finite() {
        format!("{distance:.4}").green()
    } else {
        "inf".yellow()
    };
    println!(
        "{} ~ {} [{}]: {}",
        args.case_a.bold(),
        args.case_b.bold(),
        filter,
        rendered
    );
    if let Some(score) = signal.structural_score() {
        println!("  Structural score: {score:.4}");
    } else {
        println!("  {}", "No shared sections".dimmed());
    }
    Ok(())
}
