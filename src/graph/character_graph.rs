//! CharacterGraph: deduplicated nodes and undirected edges for one chapter view

use super::builder::BuildStats;
use super::edge::{PairKey, RelationshipEdge};
use super::node::CharacterNode;
use crate::analysis::{ChapterAnalysisDocument, NetworkData, NetworkLink, NetworkNode};
use serde::Serialize;
use std::collections::HashMap;

/// Outcome of adding an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    /// A new pair
    Inserted,
    /// The pair existed; the edge was merged into it
    Merged,
    /// An endpoint is not a node
    MissingEndpoint,
}

/// Character relationship graph.
///
/// Nodes keep insertion order and are unique by canonical key. At most one
/// edge exists per unordered pair, and both endpoints of every edge are
/// nodes of the graph.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CharacterGraph {
    nodes: Vec<CharacterNode>,
    edges: Vec<RelationshipEdge>,
    pub stats: BuildStats,
    #[serde(skip)]
    node_index: HashMap<String, usize>,
    #[serde(skip)]
    edge_index: HashMap<PairKey, usize>,
}

impl CharacterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns false, leaving the graph unchanged, when the key exists.
    pub fn add_node(&mut self, node: CharacterNode) -> bool {
        if self.node_index.contains_key(&node.key) {
            return false;
        }
        self.node_index.insert(node.key.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Add an edge, merging into an existing edge for the same pair.
    pub fn add_edge(&mut self, edge: RelationshipEdge) -> EdgeInsert {
        if !self.contains(&edge.source) || !self.contains(&edge.target) {
            return EdgeInsert::MissingEndpoint;
        }
        let key = edge.key();
        match self.edge_index.get(&key) {
            Some(&idx) => {
                self.edges[idx].merge(edge);
                EdgeInsert::Merged
            }
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(edge);
                EdgeInsert::Inserted
            }
        }
    }

    /// Recompute every node's degree from the current edge set.
    pub fn recompute_degrees(&mut self) {
        let mut degrees: HashMap<&str, usize> = HashMap::new();
        for edge in &self.edges {
            *degrees.entry(edge.source.as_str()).or_default() += 1;
            *degrees.entry(edge.target.as_str()).or_default() += 1;
        }
        let degrees: HashMap<String, usize> = degrees
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        for node in &mut self.nodes {
            node.degree = degrees.get(&node.key).copied().unwrap_or(0);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.node_index.contains_key(key)
    }

    pub fn get_node(&self, key: &str) -> Option<&CharacterNode> {
        self.node_index.get(key).map(|&idx| &self.nodes[idx])
    }

    pub fn get_edge(&self, a: &str, b: &str) -> Option<&RelationshipEdge> {
        self.edge_index
            .get(&PairKey::new(a, b))
            .map(|&idx| &self.edges[idx])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CharacterNode> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.edges.iter()
    }

    /// Keys of the nodes sharing an edge with `key`.
    pub fn neighbors<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges.iter().filter_map(move |e| e.other(key))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Force-layout payload: 1-based node ids, one group per distinct role
    /// in order of first appearance, size = degree, link value = weight.
    pub fn to_network_data(&self) -> NetworkData {
        let mut groups: Vec<&str> = Vec::new();
        let nodes: Vec<NetworkNode> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                let group = match groups.iter().position(|r| *r == node.role) {
                    Some(pos) => pos + 1,
                    None => {
                        groups.push(&node.role);
                        groups.len()
                    }
                };
                NetworkNode {
                    id: idx + 1,
                    name: node.name.clone(),
                    group,
                    size: node.degree,
                }
            })
            .collect();

        let links = self
            .edges
            .iter()
            .filter_map(|edge| {
                let source = self.node_index.get(&edge.source)?;
                let target = self.node_index.get(&edge.target)?;
                Some(NetworkLink {
                    source: source + 1,
                    target: target + 1,
                    value: edge.weight,
                    link_type: edge.relationship_type.clone(),
                })
            })
            .collect();

        NetworkData { nodes, links }
    }

    /// Fill the document's network data from this graph when the document
    /// has none of its own. Returns whether the document was changed.
    pub fn fill_network_data(&self, document: &mut ChapterAnalysisDocument) -> bool {
        if !document.character_mapping.network_data.is_empty() || self.is_empty() {
            return false;
        }
        document.character_mapping.network_data = self.to_network_data();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(keys: &[&str]) -> CharacterGraph {
        let mut graph = CharacterGraph::new();
        for key in keys {
            graph.add_node(CharacterNode::new(*key, *key));
        }
        graph
    }

    #[test]
    fn duplicate_node_is_rejected() {
        let mut graph = graph_with(&["Alice"]);
        assert!(!graph.add_node(CharacterNode::new("Alice", "Alice (again)")));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.get_node("Alice").unwrap().name, "Alice");
    }

    #[test]
    fn edge_to_missing_node_is_refused() {
        let mut graph = graph_with(&["Alice"]);
        let outcome = graph.add_edge(RelationshipEdge::new("Alice", "Bob", "Friend"));
        assert_eq!(outcome, EdgeInsert::MissingEndpoint);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn reversed_pair_merges() {
        let mut graph = graph_with(&["Alice", "Bob"]);
        assert_eq!(
            graph.add_edge(RelationshipEdge::new("Alice", "Bob", "Friend")),
            EdgeInsert::Inserted
        );
        assert_eq!(
            graph.add_edge(RelationshipEdge::new("Bob", "Alice", "Rival")),
            EdgeInsert::Merged
        );
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.get_edge("Bob", "Alice").unwrap().relationship_type, "Friend");
    }

    #[test]
    fn degrees_and_neighbors() {
        let mut graph = graph_with(&["A", "B", "C", "D"]);
        graph.add_edge(RelationshipEdge::new("A", "B", "x"));
        graph.add_edge(RelationshipEdge::new("A", "C", "x"));
        graph.recompute_degrees();

        assert_eq!(graph.get_node("A").unwrap().degree, 2);
        assert_eq!(graph.get_node("B").unwrap().degree, 1);
        assert_eq!(graph.get_node("D").unwrap().degree, 0);

        let mut neighbors: Vec<_> = graph.neighbors("A").collect();
        neighbors.sort();
        assert_eq!(neighbors, vec!["B", "C"]);
    }

    #[test]
    fn network_data_uses_one_based_ids_and_role_groups() {
        let mut graph = CharacterGraph::new();
        graph.add_node(CharacterNode::new("A", "Alice").with_role("Lead"));
        graph.add_node(CharacterNode::new("B", "Bob").with_role("Support"));
        graph.add_node(CharacterNode::new("C", "Cara").with_role("Lead"));
        let mut edge = RelationshipEdge::new("C", "A", "Friend");
        edge.weight = 4;
        graph.add_edge(edge);
        graph.recompute_degrees();

        let data = graph.to_network_data();

        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.nodes[0].id, 1);
        assert_eq!(data.nodes[0].group, 1);
        assert_eq!(data.nodes[1].group, 2);
        assert_eq!(data.nodes[2].group, 1);
        assert_eq!(data.nodes[0].size, 1);
        assert_eq!(data.links.len(), 1);
        assert_eq!((data.links[0].source, data.links[0].target), (3, 1));
        assert_eq!(data.links[0].value, 4);
        assert_eq!(data.links[0].link_type, "Friend");
    }

    #[test]
    fn fill_network_data_respects_existing() {
        let mut graph = graph_with(&["A", "B"]);
        graph.add_edge(RelationshipEdge::new("A", "B", "x"));

        let mut document = ChapterAnalysisDocument::default();
        assert!(graph.fill_network_data(&mut document));
        assert_eq!(document.character_mapping.network_data.nodes.len(), 2);

        let before = document.character_mapping.network_data.clone();
        let other = graph_with(&["Z"]);
        assert!(!other.fill_network_data(&mut document));
        assert_eq!(document.character_mapping.network_data, before);
    }
}
