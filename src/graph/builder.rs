//! Character graph construction from character and relationship records
//!
//! Participants are matched by canonical key only (see `canonical_key`).
//! A relationship whose participants do not both resolve to a described
//! character is dropped and counted, never fatal.

use super::character_graph::{CharacterGraph, EdgeInsert};
use super::edge::RelationshipEdge;
use super::node::{canonical_key, CharacterNode};
use crate::analysis::{CharacterMapping, CharacterRecord, RelationshipRecord};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Options for `build_graph_with`.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Add participants missing from the character list as placeholder nodes
    pub include_unresolved: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            include_unresolved: true,
        }
    }
}

/// Counters describing one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub relationships_seen: usize,
    pub edges_inserted: usize,
    /// Later records folded into an existing pair
    pub duplicates_merged: usize,
    /// Fewer than two participants, or both naming the same character
    pub malformed_relationships: usize,
    /// Relationships dropped because a participant did not resolve
    pub unresolved_relationships: usize,
    /// Participant names that did not resolve (match failures)
    pub unresolved_participants: usize,
    pub placeholder_nodes: usize,
}

/// Canonical key to display name for the described characters.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    names: HashMap<String, String>,
}

impl NameIndex {
    pub fn from_characters(characters: &[CharacterRecord]) -> Self {
        let mut names = HashMap::new();
        for character in characters {
            let key = canonical_key(&character.name);
            if !key.is_empty() {
                names.entry(key).or_insert_with(|| character.name.clone());
            }
        }
        Self { names }
    }

    /// Canonical key for a raw participant name, if it names a described character.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        let key = canonical_key(raw);
        self.names.contains_key(&key).then_some(key)
    }

    pub fn display_name(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Build the graph with default options.
pub fn build_graph(characters: &[CharacterRecord], relationships: &[RelationshipRecord]) -> CharacterGraph {
    build_graph_with(characters, relationships, &GraphOptions::default())
}

/// Build the graph for a document's character mapping.
pub fn build_from_mapping(mapping: &CharacterMapping, options: &GraphOptions) -> CharacterGraph {
    build_graph_with(&mapping.characters, &mapping.relationships, options)
}

pub fn build_graph_with(
    characters: &[CharacterRecord],
    relationships: &[RelationshipRecord],
    options: &GraphOptions,
) -> CharacterGraph {
    let mut graph = CharacterGraph::new();
    let index = NameIndex::from_characters(characters);
    let mut stats = BuildStats {
        relationships_seen: relationships.len(),
        ..Default::default()
    };

    // Described characters first; a repeated key keeps its first record.
    for character in characters {
        let key = canonical_key(&character.name);
        if key.is_empty() {
            continue;
        }
        graph.add_node(CharacterNode::from_record(key, character));
    }

    if options.include_unresolved {
        for participant in relationships.iter().flat_map(|r| r.characters.iter()) {
            let key = canonical_key(participant);
            if key.is_empty() || graph.contains(&key) {
                continue;
            }
            graph.add_node(CharacterNode::placeholder(key, participant.trim()));
            stats.placeholder_nodes += 1;
        }
    }

    for relationship in relationships {
        let (first, second) = match relationship.characters.as_slice() {
            [a, b, ..] => (a, b),
            _ => {
                debug!(participants = relationship.characters.len(), "relationship needs two participants");
                stats.malformed_relationships += 1;
                continue;
            }
        };

        if canonical_key(first) == canonical_key(second) {
            debug!(character = %first.trim(), "relationship names one character twice");
            stats.malformed_relationships += 1;
            continue;
        }

        let (source, target) = (index.resolve(first), index.resolve(second));
        let (source, target) = match (source, target) {
            (Some(s), Some(t)) => (s, t),
            (source, target) => {
                let missing = usize::from(source.is_none()) + usize::from(target.is_none());
                warn!(
                    first = %first,
                    second = %second,
                    missing,
                    "relationship participant does not match a character; edge dropped"
                );
                stats.unresolved_participants += missing;
                stats.unresolved_relationships += 1;
                continue;
            }
        };

        match graph.add_edge(RelationshipEdge::from_record(source, target, relationship)) {
            EdgeInsert::Inserted => stats.edges_inserted += 1,
            EdgeInsert::Merged => stats.duplicates_merged += 1,
            EdgeInsert::MissingEndpoint => stats.unresolved_relationships += 1,
        }
    }

    graph.recompute_degrees();
    graph.stats = stats;
    graph
}
