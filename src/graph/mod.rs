//! Character relationship graph
//!
//! Derived per chapter view from the normalized character mapping; never
//! persisted.

mod builder;
mod character_graph;
mod edge;
mod node;


pub use builder::{build_from_mapping, build_graph, build_graph_with, BuildStats, GraphOptions, NameIndex};
pub use character_graph::{CharacterGraph, EdgeInsert};
pub use edge::{PairKey, RelationshipEdge};
pub use node::{canonical_key, CharacterNode, UNKNOWN_ROLE};
