//! lexgraph query - Retrieve and rerank case sections
//!
//! Semantic retrieval over section embeddings, reranked with the structural
//! signal from the relation graph.

use std::time::Instant;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::robot_ok;
use crate::error::Result;
use crate::graph::GraphSignal;
use crate::search::{FusionWeights, QueryRequest, RankedSection, ScoreSource, SectionFilter};

const SNIPPET_CHARS: usize = 240;
const SNIPPET_WIDTH: usize = 88;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Query text
    pub text: String,

    /// Restrict to one section type (label or title, e.g. Facts, issues, PetArg); "all" for none
    #[arg(long, short)]
    pub section: Option<String>,

    /// Case id to measure graph proximity against (default: the query text)
    #[arg(long)]
    pub reference_case: Option<String>,

    /// Maximum number of results (default: search.top_k)
    #[arg(long, short = 'k')]
    pub top_k: Option<usize>,

    /// Weight of the semantic term (default: search.alpha)
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Weight of the structural term (default: search.beta)
    #[arg(long)]
    pub beta: Option<f64>,

    /// Print full section content instead of a snippet
    #[arg(long)]
    pub full: bool,
}

pub fn run(ctx: &AppContext, args: &QueryArgs) -> Result<()> {
    let start = Instant::now();
    let pipeline = ctx.pipeline()?;
    let request = build_request(ctx, args)?;
    let results = pipeline.query_with(&request)?;
    let elapsed = start.elapsed();

    if ctx.robot_mode {
        let failed = results.iter().filter(|r| r.graph.is_failed()).count();
        let response = robot_ok(serde_json::json!({
            "query": args.text,
            "section": SectionFilter::from_option(args.section.as_deref()).to_string(),
            "reference_case": request.reference_case_id.as_deref().unwrap_or(&args.text),
            "count": results.len(),
            "elapsed_ms": elapsed.as_millis() as u64,
            "results": results,
        }));
        let response = if failed > 0 {
            response.with_warnings(vec![format!(
                "{failed} graph lookups failed; those results use the semantic score"
            )])
        } else {
            response
        };
        return ctx.emit_json(&response);
    }

    display_results(args, &results);
    Ok(())
}

fn build_request(ctx: &AppContext, args: &QueryArgs) -> Result<QueryRequest> {
    let mut request = QueryRequest::new(&args.text);
    request.section = args.section.clone();
    request.reference_case_id = args.reference_case.clone();
    request.top_k = args.top_k;
    if args.alpha.is_some() || args.beta.is_some() {
        let alpha = args.alpha.unwrap_or(ctx.config.search.alpha);
        let beta = args.beta.unwrap_or(ctx.config.search.beta);
        request.weights = Some(FusionWeights::new(alpha, beta)?);
    }
    Ok(request)
}

fn display_results(args: &QueryArgs, results: &[RankedSection]) {
    if results.is_empty() {
        println!(
            "{} No sections found for '{}'",
            "!".yellow(),
            args.text.cyan()
        );
        println!();
        println!("Try:");
        println!("  - Running 'lexgraph index' after ingesting cases");
        println!("  - Removing the section filter (--section all)");
        return;
    }

    println!(
        "{} results for '{}':",
        results.len().to_string().bold(),
        args.text.cyan()
    );
    println!();

    for (i, result) in results.iter().enumerate() {
        let rank = format!("{}.", i + 1);
        println!(
            "{:4} {} {}",
            rank.dimmed(),
            result.title.bold(),
            format!("[{}]", result.label).blue()
        );
        println!(
            "     {} {} (score: {:.3}, {})",
            result.case_id.dimmed(),
            result.court.dimmed(),
            result.score,
            describe_signal(result)
        );

        let body = if args.full {
            result.content.clone()
        } else {
            snippet(&result.content, SNIPPET_CHARS)
        };
        let options = textwrap::Options::new(SNIPPET_WIDTH)
            .initial_indent("     ")
            .subsequent_indent("     ");
        println!("{}", textwrap::fill(&body, options));
        println!();
    }
}

fn describe_signal(result: &RankedSection) -> String {
    match (&result.graph, result.source) {
        (GraphSignal::Linked { distance }, ScoreSource::Hybrid) => {
            format!("graph distance {distance:.3}").green().to_string()
        }
        (GraphSignal::Failed { .. }, _) => "graph lookup failed".red().to_string(),
        _ => "semantic only".normal().to_string(),
    }
}

/// First `max_chars` characters, with an ellipsis when cut.
fn snippet(content: &str, max_chars: usize) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
