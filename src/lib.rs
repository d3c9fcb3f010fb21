pub mod cache;
pub mod centrality;
mod error;
pub mod extract;
pub mod graph;
pub mod ingest;
pub mod normalize;
mod post;
pub mod sentiment;
pub mod stats;

use std::sync::Arc;

use serde::Serialize;
use typed_builder::TypedBuilder;

pub use cache::{AnalysisCache, Fingerprint, MemoryCache};
pub use centrality::{degree_centrality, CentralityScores, RankedHandle, DEFAULT_TOP_K};
pub use error::AnalysisError;
pub use graph::{EdgeKind, GraphBuilder, InteractionGraph, DEFAULT_MAX_EDGES};
pub use post::{
    Field, Post, RawRecord, RetweetOrigin, RetweetSource, SentimentLabel, Timestamp, UNKNOWN,
};
pub use sentiment::SentimentClassifier;

use crate::normalize::Normalized;

/// Runs the whole analysis over a record set.
///
/// After normalization the sentiment branch and the
/// extract → graph → rank branch run concurrently on the same posts.
#[derive(Debug, Clone, TypedBuilder)]
pub struct Analyzer {
    #[builder(default = DEFAULT_MAX_EDGES)]
    max_edges: usize,

    #[builder(default)]
    max_nodes: Option<usize>,

    #[builder(default = DEFAULT_TOP_K)]
    top_k: usize,

    #[builder(default)]
    classifier: SentimentClassifier,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub posts: Vec<Post>,
    pub graph: InteractionGraph,
    pub scores: CentralityScores,
    pub ranking: Vec<RankedHandle>,
    pub ingestion_failure: Option<String>,
}

impl Analyzer {
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn analyze(&self, records: &[RawRecord]) -> Analysis {
        self.analyze_posts(normalize::normalize_records(records), None)
    }

    /// Like [`Analyzer::analyze`], but tolerates a source that could not be
    /// obtained: the failure is reported in the result and every output is
    /// empty.
    pub fn analyze_source(&self, source: Result<Vec<RawRecord>, AnalysisError>) -> Analysis {
        let Normalized { posts, failure } = normalize::normalize_source(source);
        self.analyze_posts(posts, failure.map(|e| e.to_string()))
    }

    /// Looks `raw` up in `cache` by content, parsing and analyzing only on a
    /// miss. Failed ingestions are returned but never cached.
    pub fn analyze_cached<C, P>(&self, raw: &[u8], cache: &C, parse: P) -> Arc<Analysis>
    where
        C: AnalysisCache + ?Sized,
        P: FnOnce(&[u8]) -> Result<Vec<RawRecord>, AnalysisError>,
    {
        let key = self.fingerprint(raw);
        if let Some(hit) = cache.get(&key) {
            tracing::debug!(fingerprint = %key, "analysis cache hit");
            return hit;
        }

        let analysis = Arc::new(self.analyze_source(parse(raw)));
        if analysis.ingestion_failure.is_none() {
            cache.insert(key, Arc::clone(&analysis));
        }
        analysis
    }

    pub fn fingerprint(&self, raw: &[u8]) -> Fingerprint {
        let settings = format!(
            "max_edges={};max_nodes={:?};top_k={};lexicon={:?}",
            self.max_edges,
            self.max_nodes,
            self.top_k,
            self.classifier.lexicon_entries()
        );
        Fingerprint::of(settings.as_bytes(), raw)
    }

    fn analyze_posts(&self, posts: Vec<Post>, ingestion_failure: Option<String>) -> Analysis {
        let span = tracing::info_span!("analyze", posts = posts.len());
        let _enter = span.enter();

        let graph_builder = GraphBuilder::builder()
            .max_edges(self.max_edges)
            .max_nodes(self.max_nodes)
            .build();

        let (labels, (mut annotated, graph, scores)) = rayon::join(
            || self.classifier.label_posts(&posts),
            || {
                let annotated = extract::annotate_posts(&posts);
                let graph = graph_builder.build(&annotated);
                let scores = degree_centrality(&graph);
                (annotated, graph, scores)
            },
        );
        sentiment::apply_labels(&mut annotated, &labels);
        let ranking = scores.top_k(self.top_k);

        tracing::info!(
            posts = annotated.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            truncated = graph.is_truncated(),
            "analysis complete"
        );

        Analysis {
            posts: annotated,
            graph,
            scores,
            ranking,
            ingestion_failure,
        }
    }
}
