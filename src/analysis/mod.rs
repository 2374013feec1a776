//! Chapter analysis: the canonical document and everything that produces it
//!
//! Upstream chapter data arrives in two shapes: a structured analysis
//! document (possibly wrapped in `analysis_data`, possibly nesting its
//! sections under `chapter_analysis`) or a flat chapter record with loosely
//! named fields. [`normalize`] turns either into a fully shaped
//! [`ChapterAnalysisDocument`]; it never fails.
//!
//! - `types`: the canonical document schema
//! - `records`: alias tables and coercion for flat records
//! - `lenient`: tolerant field readers for document leaves
//! - `normalize`: shape detection, back-fill and synthesis
//! - [`heuristics`]: keyword analysis of raw chapter text

pub mod heuristics;
mod lenient;
mod normalize;
mod records;
mod types;

pub use normalize::{
    backfill_metadata, from_document, normalize, reading_minutes, synthesize, ChapterShape, PENDING_EVIDENCE,
    PENDING_RELEVANCE, WORDS_PER_MINUTE,
};
pub use records::{alias, probe, ChapterRecord, NovelRecord};
pub use types::{
    ChapterAnalysisDocument, ChapterContext, ChapterMetadata, ChapterSummary, CharacterMapping,
    CharacterRecord, Completeness, CulturalNote, EmotionPoint, Foreshadowing, InteractiveCompanion,
    LiteraryElements, NetworkData, NetworkLink, NetworkNode, ReadingAnalytics, RelationshipRecord,
    SentimentAnalysis, Symbolism, ThemeEntry, Timestamps, VocabularyNote,
};
