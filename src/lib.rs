//! Novel Companion: chapter analysis and character graphs for readers
//!
//! Reconciles chapter data from a remote analysis service into one canonical
//! chapter-analysis document, derives a character relationship graph from it,
//! and seeds a chat companion with the result.
//!
//! # Core Concepts
//!
//! - **Normalizer**: rich analysis document or bare chapter record in,
//!   fully shaped [`ChapterAnalysisDocument`] out; never fails
//! - **Character graph**: nodes keyed by canonical name, one undirected edge
//!   per character pair, no dangling edges
//! - **Companion**: [`CompanionApi`] fetches, falls back, normalizes and graphs
//!
//! # Example
//!
//! ```
//! use novel_companion::{build_from_mapping, normalize, GraphOptions};
//! use serde_json::json;
//!
//! let chapter = json!({
//!     "id": "ch1",
//!     "title": "Ch1",
//!     "summary": "X happens",
//!     "characters_mentioned": ["Alice", "Bob"]
//! });
//! let document = normalize(&chapter, None, None);
//! let graph = build_from_mapping(&document.character_mapping, &GraphOptions::default());
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 0);
//! ```

pub mod analysis;
pub mod api;
pub mod client;
pub mod companion;
pub mod config;
mod graph;
pub mod session;

pub use analysis::{
    normalize, ChapterAnalysisDocument, ChapterRecord, CharacterMapping, CharacterRecord,
    Completeness, NovelRecord, RelationshipRecord,
};
pub use api::{load_json, ChapterView, CompanionApi, CompanionError, DataSource};
pub use client::{
    chapter_summary, fetch_chapter_analysis, AnalysisApi, ApiError, HttpAnalysisApi, MockAnalysisApi,
};
pub use companion::ChatReply;
pub use config::{CompanionConfig, ConfigError};
pub use graph::{
    build_from_mapping, build_graph, build_graph_with, canonical_key, BuildStats, CharacterGraph,
    CharacterNode, EdgeInsert, GraphOptions, NameIndex, PairKey, RelationshipEdge, UNKNOWN_ROLE,
};
pub use session::{ChatMessage, Role, SessionContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
