//! Character nodes and canonical name keys

use crate::analysis::CharacterRecord;
use serde::{Deserialize, Serialize};

/// Role given to participants that have no character record.
pub const UNKNOWN_ROLE: &str = "Unknown";

/// Derive the canonical key for a character name.
///
/// Truncates at the first `(` and trims whitespace, so
/// `"Mr. Darcy (love interest)"` keys as `"Mr. Darcy"`. No other folding is
/// applied: `"Darcy"` and `"Mr. Darcy"` are different keys.
pub fn canonical_key(name: &str) -> String {
    let head = match name.find('(') {
        Some(idx) => &name[..idx],
        None => name,
    };
    head.trim().to_string()
}

/// A character in the relationship graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterNode {
    /// Canonical key; unique within a graph
    pub key: String,
    /// Display name as it appeared in the source
    pub name: String,
    pub role: String,
    pub description: String,
    pub key_traits: Vec<String>,
    /// True for participants that were named only in relationship text
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
    /// Number of edges touching this node, recomputed on every build
    pub degree: usize,
}

impl CharacterNode {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            role: String::new(),
            description: String::new(),
            key_traits: Vec::new(),
            placeholder: false,
            degree: 0,
        }
    }

    /// Node for a described character.
    pub fn from_record(key: impl Into<String>, record: &CharacterRecord) -> Self {
        Self {
            role: record.role.clone(),
            description: record.description.clone(),
            key_traits: record.key_traits.clone(),
            ..Self::new(key, record.name.clone())
        }
    }

    /// Node for a participant with no character record.
    pub fn placeholder(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: UNKNOWN_ROLE.to_string(),
            placeholder: true,
            ..Self::new(key, name)
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_key_truncates_qualifier() {
        assert_eq!(canonical_key("Mr. Darcy (love interest)"), "Mr. Darcy");
        assert_eq!(canonical_key("  Jane Bennet  "), "Jane Bennet");
        assert_eq!(canonical_key("Elizabeth Bennet (mentioned) (twice)"), "Elizabeth Bennet");
    }

    #[test]
    fn canonical_key_does_not_fold_variants() {
        assert_ne!(canonical_key("Darcy"), canonical_key("Mr. Darcy"));
        assert_ne!(canonical_key("darcy"), canonical_key("Darcy"));
    }

    #[test]
    fn canonical_key_of_qualifier_only_is_empty() {
        assert_eq!(canonical_key("(narrator)"), "");
        assert_eq!(canonical_key("   "), "");
    }

    #[test]
    fn placeholder_has_unknown_role() {
        let node = CharacterNode::placeholder("Darcy", "Darcy");
        assert_eq!(node.role, UNKNOWN_ROLE);
        assert!(node.placeholder);
        assert_eq!(node.degree, 0);
    }

    #[test]
    fn from_record_copies_profile() {
        let record = CharacterRecord {
            name: "Mr. Darcy (love interest)".to_string(),
            role: "Male Lead".to_string(),
            key_traits: vec!["Proud".to_string()],
            ..Default::default()
        };
        let node = CharacterNode::from_record(canonical_key(&record.name), &record);
        assert_eq!(node.key, "Mr. Darcy");
        assert_eq!(node.name, "Mr. Darcy (love interest)");
        assert_eq!(node.role, "Male Lead");
        assert_eq!(node.key_traits, vec!["Proud".to_string()]);
        assert!(!node.placeholder);
    }
}
