//! Chapter analysis normalization
//!
//! Reconciles the two upstream shapes of chapter data into one
//! `ChapterAnalysisDocument`:
//!
//! - a rich analysis document (possibly wrapped in `analysis_data` and/or
//!   with its core sections nested under `chapter_analysis`), returned as-is
//!   with missing sections back-filled;
//! - a flat chapter record, from which a partial document is synthesized.
//!
//! Normalization never fails. A section that is missing or has the wrong
//! shape becomes its typed default; inside a section, null or mistyped
//! leaves fall back field by field and unreadable list entries are dropped.

use super::lenient::list_entries;
use super::records::{ChapterRecord, NovelRecord};
use super::types::{
    ChapterAnalysisDocument, ChapterMetadata, ChapterSummary, CharacterMapping, CharacterRecord,
    SentimentAnalysis, ThemeEntry, Timestamps,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::warn;

/// Relevance given to themes that have only been named, not analyzed.
pub const PENDING_RELEVANCE: f64 = 0.5;

/// Evidence text for themes that have only been named.
pub const PENDING_EVIDENCE: &str = "Analysis pending";

/// Reading speed used when a record carries no reading time.
pub const WORDS_PER_MINUTE: u64 = 200;

/// Keys that mark a payload as an analysis document rather than a flat record.
const DOCUMENT_KEYS: &[&str] = &[
    "metadata",
    "chapter_analysis",
    "sentiment",
    "sentiment_analysis",
    "literary_elements",
    "character_mapping",
    "interactive_companion",
];

/// The two shapes chapter data arrives in.
#[derive(Debug, Clone, PartialEq)]
pub enum ChapterShape {
    /// A structured analysis document, sections hoisted to top level
    Document(Map<String, Value>),
    /// A flat chapter record
    Record(ChapterRecord),
}

impl ChapterShape {
    /// Decide which shape to normalize from.
    ///
    /// Candidates for a document are, in order: the supplied analysis, an
    /// `analysis_data` envelope inside the chapter, the chapter itself. When
    /// none is a document, a non-empty flat analysis payload (the detailed
    /// chapter endpoint) is used as the record, with gaps filled from the
    /// chapter listing entry.
    pub fn detect(chapter: &Value, analysis: Option<&Value>) -> Self {
        let candidates = [
            analysis.map(unwrap_envelope),
            chapter.get("analysis_data").map(unwrap_envelope),
            Some(chapter),
        ];

        for candidate in candidates.into_iter().flatten() {
            if let Value::Object(map) = candidate {
                if is_document(map) {
                    return ChapterShape::Document(hoist_sections(map));
                }
            }
        }

        let listing = ChapterRecord::from_value(chapter);
        match analysis.map(unwrap_envelope) {
            Some(Value::Object(map)) if !map.is_empty() => {
                let mut detail = ChapterRecord::from_value(&Value::Object(map.clone()));
                detail.fill_from(&listing);
                ChapterShape::Record(detail)
            }
            _ => ChapterShape::Record(listing),
        }
    }
}

fn unwrap_envelope(value: &Value) -> &Value {
    match value.get("analysis_data") {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}

fn is_document(map: &Map<String, Value>) -> bool {
    if map.is_empty() {
        return false;
    }
    DOCUMENT_KEYS.iter().any(|key| map.contains_key(*key))
        || map.get("summary").map(Value::is_object).unwrap_or(false)
}

/// Lift `chapter_analysis` sections to top level and apply section aliases.
/// Top-level keys win over nested ones.
fn hoist_sections(map: &Map<String, Value>) -> Map<String, Value> {
    let mut sections = map.clone();
    if let Some(Value::Object(nested)) = sections.remove("chapter_analysis") {
        for (key, value) in nested {
            sections.entry(key).or_insert(value);
        }
    }
    if let Some(sentiment) = sections.remove("sentiment_analysis") {
        sections.entry("sentiment".to_string()).or_insert(sentiment);
    }
    sections
}

/// Deserialize one section, falling back to its default when absent or malformed.
fn section<T: DeserializeOwned + Default>(sections: &Map<String, Value>, key: &str) -> T {
    match sections.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|err| {
            warn!(section = key, error = %err, "malformed analysis section; using default");
            T::default()
        }),
    }
}

/// A list section, read entry by entry.
fn list_section<T: DeserializeOwned>(sections: &Map<String, Value>, key: &str) -> Vec<T> {
    match sections.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(value @ Value::Array(_)) => list_entries(value.clone(), key),
        Some(_) => {
            warn!(section = key, "malformed analysis section; using default");
            Vec::new()
        }
    }
}

/// Character mapping is read field by field so one bad field does not
/// discard the rest.
fn character_mapping_section(sections: &Map<String, Value>) -> CharacterMapping {
    match sections.get("character_mapping") {
        Some(Value::Object(mapping)) => CharacterMapping {
            characters: list_section(mapping, "characters"),
            relationships: list_section(mapping, "relationships"),
            network_data: section(mapping, "network_data"),
        },
        None | Some(Value::Null) => CharacterMapping::default(),
        Some(_) => {
            warn!(section = "character_mapping", "malformed analysis section; using default");
            CharacterMapping::default()
        }
    }
}

/// Build a document from an analysis payload, back-filling missing sections.
pub fn from_document(sections: &Map<String, Value>) -> ChapterAnalysisDocument {
    ChapterAnalysisDocument {
        metadata: section(sections, "metadata"),
        summary: section(sections, "summary"),
        sentiment: section(sections, "sentiment"),
        themes: list_section(sections, "themes"),
        literary_elements: section(sections, "literary_elements"),
        character_mapping: character_mapping_section(sections),
        interactive_companion: section(sections, "interactive_companion"),
        reading_analytics: section(sections, "reading_analytics"),
    }
}

/// Reading time in whole minutes, rounded up.
pub fn reading_minutes(word_count: u64) -> u32 {
    let minutes = word_count.div_ceil(WORDS_PER_MINUTE);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

fn pending_theme(raw: &Value) -> Option<ThemeEntry> {
    match raw {
        Value::String(name) => {
            let name = name.trim();
            (!name.is_empty()).then(|| ThemeEntry {
                theme: name.to_string(),
                relevance: PENDING_RELEVANCE,
                evidence: PENDING_EVIDENCE.to_string(),
            })
        }
        Value::Object(_) => serde_json::from_value::<ThemeEntry>(raw.clone())
            .ok()
            .filter(|entry| !entry.theme.trim().is_empty()),
        _ => None,
    }
}

fn mentioned_characters(names: &[String]) -> Vec<CharacterRecord> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty() && seen.insert(name.to_string()))
        .map(CharacterRecord::named)
        .collect()
}

/// Metadata as far as a flat record and its novel can tell.
fn record_metadata(record: &ChapterRecord, novel: Option<&NovelRecord>) -> ChapterMetadata {
    let word_count = record.word_count.unwrap_or(0);
    ChapterMetadata {
        novel_id: record
            .novel_id
            .clone()
            .or_else(|| novel.and_then(|n| n.id.clone()))
            .unwrap_or_default(),
        chapter_id: record.id.clone().unwrap_or_default(),
        novel_title: novel.and_then(|n| n.title.clone()).unwrap_or_default(),
        chapter_number: record.chapter_number.unwrap_or(0),
        chapter_title: record.title.clone().unwrap_or_default(),
        word_count,
        estimated_reading_time_minutes: record
            .reading_time_minutes
            .unwrap_or_else(|| reading_minutes(word_count)),
        is_processed: record.is_processed.unwrap_or(false),
        timestamps: Timestamps {
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
            processed_at: record.processed_at.clone(),
        },
    }
}

/// Fill empty identity and size fields of a document's metadata.
///
/// Values the document carries always stand; `is_processed` is never touched.
pub fn backfill_metadata(metadata: &mut ChapterMetadata, from: &ChapterMetadata) {
    fn text(slot: &mut String, other: &str) {
        if slot.trim().is_empty() && !other.is_empty() {
            *slot = other.to_string();
        }
    }
    fn count<T: Copy + Default + PartialEq>(slot: &mut T, other: T) {
        if *slot == T::default() {
            *slot = other;
        }
    }
    fn stamp(slot: &mut Option<String>, other: &Option<String>) {
        if slot.is_none() {
            *slot = other.clone();
        }
    }

    text(&mut metadata.novel_id, &from.novel_id);
    text(&mut metadata.chapter_id, &from.chapter_id);
    text(&mut metadata.novel_title, &from.novel_title);
    text(&mut metadata.chapter_title, &from.chapter_title);
    count(&mut metadata.chapter_number, from.chapter_number);
    count(&mut metadata.word_count, from.word_count);
    count(
        &mut metadata.estimated_reading_time_minutes,
        from.estimated_reading_time_minutes,
    );
    if metadata.estimated_reading_time_minutes == 0 {
        metadata.estimated_reading_time_minutes = reading_minutes(metadata.word_count);
    }
    stamp(&mut metadata.timestamps.created_at, &from.timestamps.created_at);
    stamp(&mut metadata.timestamps.updated_at, &from.timestamps.updated_at);
    stamp(&mut metadata.timestamps.processed_at, &from.timestamps.processed_at);
}

/// Synthesize a partial document from a flat chapter record.
pub fn synthesize(record: &ChapterRecord, novel: Option<&NovelRecord>) -> ChapterAnalysisDocument {
    let metadata = record_metadata(record, novel);
    let summary = record.summary.clone().unwrap_or_default();

    ChapterAnalysisDocument {
        metadata,
        summary: ChapterSummary {
            concise: summary.clone(),
            detailed: summary,
            key_events: record.key_events.clone(),
        },
        sentiment: SentimentAnalysis {
            sentiment_score: record.sentiment_score.map(|s| s.clamp(-1.0, 1.0)),
            ..Default::default()
        },
        themes: record.themes.iter().filter_map(pending_theme).collect(),
        character_mapping: CharacterMapping {
            characters: mentioned_characters(&record.characters_mentioned),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Normalize chapter data into the canonical document.
///
/// `chapter` is the flat chapter record (a listing entry or the chapter
/// endpoint payload), `novel` its parent novel record, and `analysis` an
/// optional pre-computed analysis payload. A document's empty metadata
/// fields are filled from `chapter` and `novel`.
pub fn normalize(
    chapter: &Value,
    novel: Option<&Value>,
    analysis: Option<&Value>,
) -> ChapterAnalysisDocument {
    match ChapterShape::detect(chapter, analysis) {
        ChapterShape::Document(sections) => {
            let mut document = from_document(&sections);
            let record = ChapterRecord::from_value(chapter);
            let novel = novel.map(NovelRecord::from_value);
            backfill_metadata(&mut document.metadata, &record_metadata(&record, novel.as_ref()));
            document
        }
        ChapterShape::Record(record) => {
            let novel = novel.map(NovelRecord::from_value);
            synthesize(&record, novel.as_ref())
        }
    }
}
