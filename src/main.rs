use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tweet_sna::{ingest, stats, Analysis, Analyzer};

#[derive(Parser)]
struct Args {
    /// JSON-lines file with one post per line
    source: PathBuf,

    /// Maximum number of edges added to the interaction graph
    #[arg(long, default_value_t = tweet_sna::DEFAULT_MAX_EDGES)]
    max_edges: usize,

    /// Maximum number of accounts in the interaction graph
    #[arg(long)]
    max_nodes: Option<usize>,

    /// Number of accounts in the influence ranking
    #[arg(short, long, default_value_t = tweet_sna::DEFAULT_TOP_K)]
    top: usize,

    #[command(subcommand)]
    report: Report,
}

#[derive(Subcommand, Clone, Copy)]
enum Report {
    /// Normalized posts with sentiment, mentions and retweet source, one per line
    Posts,
    /// Interaction graph as nodes and edges
    Graph,
    /// Accounts ranked by degree centrality, one per line
    Rank,
    /// Volume, activity, engagement and sentiment summaries
    Stats,
    /// Everything in a single document
    All,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let analyzer = Analyzer::builder()
        .max_edges(args.max_edges)
        .max_nodes(args.max_nodes)
        .top_k(args.top)
        .build();
    let analysis = analyzer.analyze_source(ingest::load(&args.source));

    let result = match args.report {
        Report::Posts => write_lines(&analysis.posts),
        Report::Graph => write_lines([&analysis.graph]),
        Report::Rank => write_lines(&analysis.ranking),
        Report::Stats => write_lines([stats::overview(&analysis.posts, analyzer.top_k())]),
        Report::All => write_lines([full_report(&analysis, analyzer.top_k())]),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[derive(Serialize)]
struct FullReport<'a> {
    #[serde(flatten)]
    analysis: &'a Analysis,
    stats: stats::Overview,
}

fn full_report(analysis: &Analysis, top_k: usize) -> FullReport<'_> {
    FullReport {
        analysis,
        stats: stats::overview(&analysis.posts, top_k),
    }
}

fn write_lines<T: Serialize>(items: impl IntoIterator<Item = T>) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for item in items {
        serde_json::to_writer(&mut out, &item)?;
        writeln!(out)?;
    }
    out.flush()
}
