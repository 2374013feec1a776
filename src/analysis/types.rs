//! Canonical chapter analysis document
//!
//! Every view consumes this one schema. Each section deserializes with
//! defaults and every leaf through a tolerant reader, so a document read from
//! a partial or sloppy upstream payload is always fully shaped.

use super::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Whether a document carries enough analysis to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Completeness {
    /// Concise summary present plus a tone or a sentiment score
    Complete,
    /// Analysis still processing; render a pending state
    Partial,
}

/// One chapter's analysis in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterAnalysisDocument {
    #[serde(deserialize_with = "lenient::or_default")]
    pub metadata: ChapterMetadata,
    #[serde(deserialize_with = "lenient::or_default")]
    pub summary: ChapterSummary,
    #[serde(deserialize_with = "lenient::or_default")]
    pub sentiment: SentimentAnalysis,
    #[serde(deserialize_with = "lenient::entries")]
    pub themes: Vec<ThemeEntry>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub literary_elements: LiteraryElements,
    #[serde(deserialize_with = "lenient::or_default")]
    pub character_mapping: CharacterMapping,
    #[serde(deserialize_with = "lenient::or_default")]
    pub interactive_companion: InteractiveCompanion,
    #[serde(deserialize_with = "lenient::or_default")]
    pub reading_analytics: ReadingAnalytics,
}

impl ChapterAnalysisDocument {
    /// Classify the document against the completeness invariant.
    pub fn completeness(&self) -> Completeness {
        let has_summary = !self.summary.concise.trim().is_empty();
        let has_sentiment = !self.sentiment.overall_tone.trim().is_empty()
            || self.sentiment.sentiment_score.is_some();
        if has_summary && has_sentiment {
            Completeness::Complete
        } else {
            Completeness::Partial
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completeness() == Completeness::Complete
    }
}

/// Optional ISO-8601 timestamps carried over from the upstream record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timestamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::optional_text")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::optional_text")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::optional_text")]
    pub processed_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterMetadata {
    #[serde(deserialize_with = "lenient::text")]
    pub novel_id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub chapter_id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub novel_title: String,
    #[serde(deserialize_with = "lenient::count_u32")]
    pub chapter_number: u32,
    #[serde(deserialize_with = "lenient::text")]
    pub chapter_title: String,
    #[serde(deserialize_with = "lenient::count_u64")]
    pub word_count: u64,
    #[serde(alias = "estimated_reading_time", deserialize_with = "lenient::count_u32")]
    pub estimated_reading_time_minutes: u32,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_processed: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterSummary {
    #[serde(deserialize_with = "lenient::text")]
    pub concise: String,
    #[serde(deserialize_with = "lenient::text")]
    pub detailed: String,
    #[serde(deserialize_with = "lenient::text_list")]
    pub key_events: Vec<String>,
}

/// A point on the chapter's emotional arc. Intensity is in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionPoint {
    #[serde(deserialize_with = "lenient::text")]
    pub emotion: String,
    #[serde(deserialize_with = "lenient::number")]
    pub intensity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentAnalysis {
    #[serde(deserialize_with = "lenient::text")]
    pub overall_tone: String,
    /// Score in `[-1, 1]`; absent until the chapter has been scored
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::score")]
    pub sentiment_score: Option<f64>,
    #[serde(deserialize_with = "lenient::entries")]
    pub emotional_arc: Vec<EmotionPoint>,
    /// Character name to free-form sentiment info
    #[serde(deserialize_with = "lenient::or_default")]
    pub character_sentiments: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeEntry {
    #[serde(deserialize_with = "lenient::text")]
    pub theme: String,
    /// Relevance in `[0, 1]`
    #[serde(deserialize_with = "lenient::number")]
    pub relevance: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub evidence: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Foreshadowing {
    #[serde(deserialize_with = "lenient::text")]
    pub text: String,
    #[serde(deserialize_with = "lenient::text")]
    pub significance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Symbolism {
    #[serde(deserialize_with = "lenient::text")]
    pub symbol: String,
    #[serde(deserialize_with = "lenient::text")]
    pub meaning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiteraryElements {
    #[serde(deserialize_with = "lenient::entries")]
    pub foreshadowing: Vec<Foreshadowing>,
    #[serde(deserialize_with = "lenient::entries")]
    pub symbolism: Vec<Symbolism>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::optional_text")]
    pub narrative_voice: Option<String>,
    /// Any further element groups, keyed by group name
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// A character as described by the analysis.
///
/// `name` is the canonical identity within a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterRecord {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub role: String,
    #[serde(deserialize_with = "lenient::text")]
    pub first_appearance: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(deserialize_with = "lenient::text_list")]
    pub key_traits: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub quotes: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub development_status: String,
}

impl CharacterRecord {
    /// A record that carries only a name, as synthesized from a mention list.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A relationship between two characters.
///
/// `characters` holds raw name strings which need not match a
/// `CharacterRecord::name` verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipRecord {
    #[serde(deserialize_with = "lenient::text_list")]
    pub characters: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub relationship_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub dynamics: String,
    #[serde(deserialize_with = "lenient::text")]
    pub significance: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sentiment: String,
    #[serde(deserialize_with = "lenient::count_u32")]
    pub interaction_count: u32,
}

impl RelationshipRecord {
    pub fn between(a: impl Into<String>, b: impl Into<String>, relationship_type: impl Into<String>) -> Self {
        Self {
            characters: vec![a.into(), b.into()],
            relationship_type: relationship_type.into(),
            ..Default::default()
        }
    }

    pub fn with_interactions(mut self, count: u32) -> Self {
        self.interaction_count = count;
        self
    }
}

/// Node in the precomputed force-layout payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkNode {
    #[serde(deserialize_with = "lenient::count_usize")]
    pub id: usize,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::count_usize")]
    pub group: usize,
    #[serde(deserialize_with = "lenient::count_usize")]
    pub size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkLink {
    #[serde(deserialize_with = "lenient::count_usize")]
    pub source: usize,
    #[serde(deserialize_with = "lenient::count_usize")]
    pub target: usize,
    #[serde(deserialize_with = "lenient::count_u32")]
    pub value: u32,
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub link_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkData {
    #[serde(deserialize_with = "lenient::entries")]
    pub nodes: Vec<NetworkNode>,
    #[serde(deserialize_with = "lenient::entries")]
    pub links: Vec<NetworkLink>,
}

impl NetworkData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterMapping {
    #[serde(deserialize_with = "lenient::entries")]
    pub characters: Vec<CharacterRecord>,
    #[serde(deserialize_with = "lenient::entries")]
    pub relationships: Vec<RelationshipRecord>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub network_data: NetworkData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterContext {
    #[serde(deserialize_with = "lenient::text")]
    pub setting: String,
    #[serde(deserialize_with = "lenient::text")]
    pub timeline_position: String,
    #[serde(deserialize_with = "lenient::text")]
    pub narrative_importance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyNote {
    #[serde(deserialize_with = "lenient::text")]
    pub term: String,
    #[serde(deserialize_with = "lenient::text")]
    pub definition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CulturalNote {
    #[serde(deserialize_with = "lenient::text")]
    pub reference: String,
    #[serde(deserialize_with = "lenient::text")]
    pub explanation: String,
}

/// Data used to seed the chat companion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveCompanion {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::or_default")]
    pub chapter_context: Option<ChapterContext>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub key_questions: Vec<String>,
    #[serde(alias = "suggested_discussion_points", deserialize_with = "lenient::text_list")]
    pub discussion_points: Vec<String>,
    #[serde(deserialize_with = "lenient::entries")]
    pub vocabulary_notes: Vec<VocabularyNote>,
    #[serde(deserialize_with = "lenient::entries")]
    pub cultural_context: Vec<CulturalNote>,
}

/// Reading metrics, kept loosely typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingAnalytics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity_metrics: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pacing_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement_factors: Option<Value>,
}
