//! lexgraph embed - Inspect how a text is embedded and compared

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::robot_ok;
use crate::error::Result;
use crate::search::embeddings::{build_embedder, cosine_similarity, truncate_tokens};
use crate::search::{DistanceMetric, similarity_from_distance};

#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// Text to embed
    pub text: String,

    /// Override embedding backend (hash, api)
    #[arg(long, short)]
    pub backend: Option<String>,

    /// Include the full vector
    #[arg(long)]
    pub full: bool,

    /// Score a second text against the first, as retrieval would
    #[arg(long, short)]
    pub compare: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedReport {
    backend: String,
    dimensions: usize,
    input_tokens: usize,
    embedded_tokens: usize,
    l2_norm: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    embedding: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<Comparison>,
}

#[derive(Debug, Serialize)]
struct Comparison {
    text: String,
    cosine_similarity: f32,
    metric: String,
    distance: f32,
    /// `1 / (1 + distance)`, the retrieval similarity
    similarity: f64,
}

fn l2_norm(embedding: &[f32]) -> f32 {
    embedding.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn run(ctx: &AppContext, args: &EmbedArgs) -> Result<()> {
    let mut config = ctx.config.search.clone();
    if let Some(ref backend) = args.backend {
        config.embedding_backend = backend.clone();
    }
    let embedder = build_embedder(&config)?;
    let metric = DistanceMetric::parse(&config.distance_metric)?;
    let embedding = embedder.embed(&args.text)?;

    let comparison = match args.compare {
        Some(ref other) => {
            let other_vec = embedder.embed(other)?;
            let distance = metric.distance(&embedding, &other_vec);
            Some(Comparison {
                text: other.clone(),
                cosine_similarity: cosine_similarity(&embedding, &other_vec),
                metric: config.distance_metric.to_lowercase(),
                distance,
                similarity: similarity_from_distance(f64::from(distance)),
            })
        }
        None => None,
    };

    let report = EmbedReport {
        backend: embedder.name().to_string(),
        dimensions: embedder.dims(),
        input_tokens: args.text.split_whitespace().count(),
        embedded_tokens: truncate_tokens(&args.text, config.max_input_tokens as usize)
            .split_whitespace()
            .count(),
        l2_norm: l2_norm(&embedding),
        embedding: args.full.then_some(embedding),
        comparison,
    };

    if ctx.robot_mode {
        return ctx.emit_json(&robot_ok(report));
    }

    println!(
        "{} {} ({} dims)",
        "Embedder:".bold(),
        report.backend.cyan(),
        report.dimensions
    );
    println!("  Tokens: {}", report.embedded_tokens);
    if report.embedded_tokens < report.input_tokens {
        println!(
            "  {} input truncated from {} tokens",
            "!".yellow(),
            report.input_tokens
        );
    }
    println!("  L2 norm: {:.4}", report.l2_norm);

    if let Some(ref embedding) = report.embedding {
        let line = embedding
            .iter()
            .map(|v| format!("{v:.4}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}", textwrap::fill(&line, 80));
    }

    if let Some(ref cmp) = report.comparison {
        println!();
        println!("{} \"{}\"", "Compared with".bold(), cmp.text.green());
        println!("  Cosine: {:.4}", cmp.cosine_similarity);
        println!("  Distance ({}): {:.4}", cmp.metric, cmp.distance);
        println!("  Similarity: {}", format!("{:.4}", cmp.similarity).cyan());
    }

    Ok(())
}
