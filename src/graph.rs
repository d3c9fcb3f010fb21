use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Serialize, Serializer};
use typed_builder::TypedBuilder;

use crate::extract::mention_edge_targets;
use crate::post::Post;

/// Edge cap used when none is configured.
pub const DEFAULT_MAX_EDGES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Mention,
    Retweet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub kind: EdgeKind,
}

/// Directed interaction graph between accounts.
///
/// Edges point from the acting author to the referenced handle. Nodes and
/// edges are kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    graph: DiGraph<String, EdgeKind>,
    index: HashMap<String, NodeIndex>,
    truncated: bool,
}

impl InteractionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph straight from `(source, target, kind)` triples.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = (&'a str, &'a str, EdgeKind)>) -> Self {
        let mut graph = Self::new();
        for (source, target, kind) in edges {
            graph.add_edge(source, target, kind);
        }
        graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether construction stopped at a cap before consuming every post.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.index.contains_key(handle)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_weights().map(|s| s.as_str())
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        self.graph.edge_references().map(|e| Edge {
            source: self.graph[e.source()].as_str(),
            target: self.graph[e.target()].as_str(),
            kind: *e.weight(),
        })
    }

    /// Number of parallel edges of `kind` from `source` to `target`.
    pub fn multiplicity(&self, source: &str, target: &str, kind: EdgeKind) -> usize {
        let (Some(&a), Some(&b)) = (self.index.get(source), self.index.get(target)) else {
            return 0;
        };
        self.graph
            .edges_connecting(a, b)
            .filter(|e| *e.weight() == kind)
            .count()
    }

    pub fn in_degree(&self, handle: &str) -> usize {
        self.degree(handle, Direction::Incoming)
    }

    pub fn out_degree(&self, handle: &str) -> usize {
        self.degree(handle, Direction::Outgoing)
    }

    fn degree(&self, handle: &str, direction: Direction) -> usize {
        self.index
            .get(handle)
            .map_or(0, |&n| self.graph.edges_directed(n, direction).count())
    }

    /// Distinct accounts adjacent to `handle` in either direction.
    pub fn neighbor_count(&self, handle: &str) -> usize {
        let Some(&n) = self.index.get(handle) else {
            return 0;
        };
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors_undirected(n).collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors.len()
    }

    fn would_add(&self, handles: &[&str]) -> usize {
        let mut new: Vec<&str> = handles
            .iter()
            .copied()
            .filter(|h| !self.index.contains_key(*h))
            .collect();
        new.sort_unstable();
        new.dedup();
        new.len()
    }

    fn add_node(&mut self, handle: &str) -> NodeIndex {
        if let Some(&n) = self.index.get(handle) {
            return n;
        }
        let n = self.graph.add_node(handle.to_owned());
        self.index.insert(handle.to_owned(), n);
        n
    }

    fn add_edge(&mut self, source: &str, target: &str, kind: EdgeKind) {
        let a = self.add_node(source);
        let b = self.add_node(target);
        self.graph.add_edge(a, b, kind);
    }
}

/// Serialized as `{ nodes, edges }` for external layout tools.
impl Serialize for InteractionGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Export<'a> {
            nodes: Vec<&'a str>,
            edges: Vec<Edge<'a>>,
            truncated: bool,
        }

        Export {
            nodes: self.nodes().collect(),
            edges: self.edges().collect(),
            truncated: self.truncated,
        }
        .serialize(serializer)
    }
}

/// Builds an [`InteractionGraph`] from annotated posts, in input order.
///
/// Duplicate mentions become parallel edges and self references are
/// dropped. Construction stops once the edge cap is reached, or at the first
/// edge or node that would exceed a cap, so the same input always yields the
/// same prefix.
#[derive(Debug, Clone, TypedBuilder)]
pub struct GraphBuilder {
    #[builder(default = DEFAULT_MAX_EDGES)]
    max_edges: usize,

    #[builder(default)]
    max_nodes: Option<usize>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::builder().build()
    }
}

enum Step {
    Continue,
    Stop,
}

impl GraphBuilder {
    pub fn build(&self, posts: &[Post]) -> InteractionGraph {
        let mut graph = InteractionGraph::new();

        for post in posts {
            if let Step::Stop = self.add_post(&mut graph, post) {
                graph.truncated = true;
                tracing::warn!(
                    post_id = post.id,
                    edges = graph.edge_count(),
                    nodes = graph.node_count(),
                    "interaction graph cap reached, remaining posts skipped"
                );
                break;
            }
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built interaction graph"
        );
        graph
    }

    fn add_post(&self, graph: &mut InteractionGraph, post: &Post) -> Step {
        if graph.edge_count() >= self.max_edges {
            return Step::Stop;
        }
        let Some(actor) = post.actor() else {
            return Step::Continue;
        };

        let retweet = post
            .retweet_source
            .as_ref()
            .map(|rt| (rt.handle.as_str(), EdgeKind::Retweet));
        let mentions = mention_edge_targets(post)
            .iter()
            .map(|m| (m.as_str(), EdgeKind::Mention));
        let targets: Vec<(&str, EdgeKind)> = retweet
            .into_iter()
            .chain(mentions)
            .filter(|(target, _)| *target != actor)
            .collect();

        // A post cut at its first edge leaves no trace, author included.
        let first = match targets.first() {
            Some((target, _)) => vec![actor, *target],
            None => vec![actor],
        };
        if !self.nodes_fit(graph, &first) {
            return Step::Stop;
        }
        graph.add_node(actor);

        for (target, kind) in targets {
            if graph.edge_count() >= self.max_edges || !self.nodes_fit(graph, &[actor, target]) {
                return Step::Stop;
            }
            graph.add_edge(actor, target, kind);
        }

        Step::Continue
    }

    fn nodes_fit(&self, graph: &InteractionGraph, handles: &[&str]) -> bool {
        match self.max_nodes {
            Some(max) => graph.node_count() + graph.would_add(handles) <= max,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::annotate_posts;
    use crate::post::Field;
    use pretty_assertions::assert_eq;

    fn posts(rows: &[(&str, &str)]) -> Vec<Post> {
        let raw: Vec<Post> = rows
            .iter()
            .enumerate()
            .map(|(id, (author, text))| Post {
                author: Field::Known(author.to_string()),
                text: Field::Known(text.to_string()),
                ..Post::empty(id)
            })
            .collect();
        annotate_posts(&raw)
    }

    fn edge_list(graph: &InteractionGraph) -> Vec<(String, String, EdgeKind)> {
        graph
            .edges()
            .map(|e| (e.source.to_owned(), e.target.to_owned(), e.kind))
            .collect()
    }

    #[test]
    fn test_mentions_and_retweets() {
        let graph = GraphBuilder::default().build(&posts(&[
            ("alice", "great day! @bob"),
            ("bob", "RT @alice bad news"),
        ]));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(
            edge_list(&graph),
            vec![
                ("alice".into(), "bob".into(), EdgeKind::Mention),
                ("bob".into(), "alice".into(), EdgeKind::Retweet),
            ]
        );
        assert!(!graph.is_truncated());
    }

    #[test]
    fn test_duplicate_mentions_are_parallel_edges() {
        let graph = GraphBuilder::default().build(&posts(&[("alice", "@bob @bob @bob")]));
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.multiplicity("alice", "bob", EdgeKind::Mention), 3);
        assert_eq!(graph.multiplicity("alice", "bob", EdgeKind::Retweet), 0);
        assert_eq!(graph.neighbor_count("alice"), 1);
    }

    #[test]
    fn test_self_references_are_dropped() {
        let graph =
            GraphBuilder::default().build(&posts(&[("alice", "RT @alice note to @alice")]));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec!["alice"]);
    }

    #[test]
    fn test_isolated_authors_are_nodes() {
        let graph = GraphBuilder::default().build(&posts(&[("carol", "just lunch")]));
        assert_eq!(graph.node_count(), 1);
        assert!(graph.contains("carol"));
    }

    #[test]
    fn test_unknown_author_contributes_nothing() {
        let mut rows = posts(&[("x", "@bob")]);
        rows[0].author = Field::Unknown;
        let graph = GraphBuilder::default().build(&rows);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_edge_cap_keeps_first_edges() {
        let rows = posts(&[
            ("a", "@b @c"),
            ("b", "@c"),
            ("c", "@a"),
        ]);
        let graph = GraphBuilder::builder().max_edges(2).build().build(&rows);
        assert_eq!(
            edge_list(&graph),
            vec![
                ("a".into(), "b".into(), EdgeKind::Mention),
                ("a".into(), "c".into(), EdgeKind::Mention),
            ]
        );
        assert!(graph.is_truncated());
    }

    #[test]
    fn test_reached_cap_stops_processing() {
        let mut rows = vec![("a".to_string(), "@b @c".to_string())];
        rows.extend((0..20).map(|i| (format!("late{i}"), "just lunch".to_string())));
        rows.push(("z".to_string(), "@y".to_string()));
        let rows: Vec<(&str, &str)> = rows
            .iter()
            .map(|(a, t)| (a.as_str(), t.as_str()))
            .collect();

        let graph = GraphBuilder::builder().max_edges(2).build().build(&posts(&rows));
        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.is_truncated());
        assert_eq!(crate::centrality::degree_centrality(&graph).get("a"), Some(1.0));
    }

    #[test]
    fn test_post_cut_at_first_edge_adds_no_author() {
        let rows = posts(&[("a", "@b"), ("c", "@d")]);
        let graph = GraphBuilder::builder()
            .max_nodes(Some(3))
            .build()
            .build(&rows);
        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(graph.is_truncated());
    }

    #[test]
    fn test_exact_cap_is_not_truncation() {
        let rows = posts(&[("a", "@b @c")]);
        let graph = GraphBuilder::builder().max_edges(2).build().build(&rows);
        assert_eq!(graph.edge_count(), 2);
        assert!(!graph.is_truncated());
    }

    #[test]
    fn test_node_cap() {
        let rows = posts(&[("a", "@b"), ("c", "@a"), ("a", "@d")]);
        let graph = GraphBuilder::builder()
            .max_nodes(Some(3))
            .build()
            .build(&rows);
        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.is_truncated());
    }

    #[test]
    fn test_empty_input() {
        let graph = GraphBuilder::default().build(&[]);
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let graph = InteractionGraph::from_edges([("a", "b", EdgeKind::Retweet)]);
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "nodes": ["a", "b"],
                "edges": [{"source": "a", "target": "b", "kind": "retweet"}],
                "truncated": false,
            })
        );
    }
}
