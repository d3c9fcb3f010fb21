//! Degree centrality over the interaction graph.
//!
//! A node's degree is the number of distinct accounts it interacts with in
//! either direction, normalized by `N - 1`. Parallel edges and opposite
//! directions between the same pair count once, so scores stay in `[0, 1]`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::graph::InteractionGraph;

/// Ranking length used when none is configured.
pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedHandle {
    pub handle: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CentralityScores(BTreeMap<String, f64>);

impl CentralityScores {
    pub fn get(&self, handle: &str) -> Option<f64> {
        self.0.get(handle).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(h, s)| (h.as_str(), *s))
    }

    /// All handles by score descending, ties broken by handle ascending.
    pub fn ranked(&self) -> Vec<RankedHandle> {
        let mut ranked: Vec<RankedHandle> = self
            .0
            .iter()
            .map(|(handle, score)| RankedHandle {
                handle: handle.clone(),
                score: *score,
            })
            .collect();
        ranked.sort_by(|a, b| match b.score.total_cmp(&a.score) {
            Ordering::Equal => a.handle.cmp(&b.handle),
            other => other,
        });
        ranked
    }

    pub fn top_k(&self, k: usize) -> Vec<RankedHandle> {
        let mut ranked = self.ranked();
        ranked.truncate(k);
        ranked
    }
}

pub fn degree_centrality(graph: &InteractionGraph) -> CentralityScores {
    let n = graph.node_count();
    let scores = graph
        .nodes()
        .map(|handle| {
            let score = if n <= 1 {
                0.0
            } else {
                graph.neighbor_count(handle) as f64 / (n - 1) as f64
            };
            (handle.to_owned(), score)
        })
        .collect();
    CentralityScores(scores)
}
