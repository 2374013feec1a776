//! Undirected relationship edges

use crate::analysis::RelationshipRecord;
use serde::{Deserialize, Serialize};

/// Unordered pair of canonical keys. `PairKey::new("b", "a") == PairKey::new("a", "b")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }
}

/// A relationship between two characters.
///
/// `source` and `target` keep the order of the first record that produced
/// the edge; identity is the unordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub relationship_type: String,
    /// `max(1, interaction_count)`; the largest seen when records merge
    pub weight: u32,
    pub dynamics: String,
    pub sentiment: String,
    pub significance: String,
    /// Number of relationship records merged into this edge
    pub record_count: usize,
    /// Relationship types from merged records that differ from `relationship_type`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_types: Vec<String>,
}

impl RelationshipEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, relationship_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship_type: relationship_type.into(),
            weight: 1,
            dynamics: String::new(),
            sentiment: String::new(),
            significance: String::new(),
            record_count: 1,
            additional_types: Vec::new(),
        }
    }

    /// Edge between two resolved keys, carrying the record's attributes.
    pub fn from_record(source: impl Into<String>, target: impl Into<String>, record: &RelationshipRecord) -> Self {
        Self {
            weight: record.interaction_count.max(1),
            dynamics: record.dynamics.clone(),
            sentiment: record.sentiment.clone(),
            significance: record.significance.clone(),
            ..Self::new(source, target, record.relationship_type.clone())
        }
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(&self.source, &self.target)
    }

    pub fn touches(&self, key: &str) -> bool {
        self.source == key || self.target == key
    }

    /// The endpoint opposite `key`, if `key` is an endpoint.
    pub fn other(&self, key: &str) -> Option<&str> {
        if self.source == key {
            Some(&self.target)
        } else if self.target == key {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Fold a later record for the same pair into this edge.
    ///
    /// The first record's type, dynamics and sentiment stand; weight takes
    /// the maximum; a new relationship type is remembered.
    pub fn merge(&mut self, later: RelationshipEdge) {
        self.weight = self.weight.max(later.weight);
        self.record_count += later.record_count;

        let fill = |slot: &mut String, value: String| {
            if slot.is_empty() {
                *slot = value;
            }
        };
        fill(&mut self.dynamics, later.dynamics);
        fill(&mut self.sentiment, later.sentiment);
        fill(&mut self.significance, later.significance);

        for kind in std::iter::once(later.relationship_type).chain(later.additional_types) {
            if !kind.is_empty() && kind != self.relationship_type && !self.additional_types.contains(&kind) {
                self.additional_types.push(kind);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_unordered() {
        assert_eq!(PairKey::new("Bob", "Alice"), PairKey::new("Alice", "Bob"));
        assert_eq!(PairKey::new("Bob", "Alice").first(), "Alice");
    }

    #[test]
    fn weight_floor_is_one() {
        let record = RelationshipRecord::between("A", "B", "Friend");
        let edge = RelationshipEdge::from_record("A", "B", &record);
        assert_eq!(edge.weight, 1);

        let edge = RelationshipEdge::from_record("A", "B", &record.with_interactions(45));
        assert_eq!(edge.weight, 45);
    }

    #[test]
    fn merge_keeps_first_type_and_max_weight() {
        let mut edge = RelationshipEdge::from_record(
            "A",
            "B",
            &RelationshipRecord::between("A", "B", "Friend").with_interactions(5),
        );
        let mut later = RelationshipEdge::from_record(
            "B",
            "A",
            &RelationshipRecord::between("B", "A", "Rival").with_interactions(2),
        );
        later.dynamics = "Competitive".to_string();

        edge.merge(later);

        assert_eq!(edge.relationship_type, "Friend");
        assert_eq!(edge.weight, 5);
        assert_eq!(edge.record_count, 2);
        assert_eq!(edge.additional_types, vec!["Rival".to_string()]);
        assert_eq!(edge.dynamics, "Competitive");
        assert_eq!(edge.source, "A");
    }

    #[test]
    fn merge_same_type_adds_nothing() {
        let mut edge = RelationshipEdge::new("A", "B", "Friend");
        edge.merge(RelationshipEdge::new("A", "B", "Friend"));
        assert!(edge.additional_types.is_empty());
        assert_eq!(edge.record_count, 2);
    }

    #[test]
    fn other_endpoint() {
        let edge = RelationshipEdge::new("A", "B", "Friend");
        assert_eq!(edge.other("A"), Some("B"));
        assert_eq!(edge.other("B"), Some("A"));
        assert_eq!(edge.other("C"), None);
        assert!(edge.touches("B"));
    }
}
