//! Upstream chapter and novel records, read through an alias table
//!
//! Upstream services disagree on key casing (`average_rating` vs
//! `averageRating`, `id` vs `_id`). Each semantic field lists its aliases in
//! probe order; the first alias holding a non-null value wins.

use serde::Serialize;
use serde_json::{Map, Value};

/// Alias lists, probed in order.
pub mod alias {
    pub const ID: &[&str] = &["id", "_id"];
    pub const NOVEL_ID: &[&str] = &["novel_id", "novelId"];
    pub const TITLE: &[&str] = &["title"];
    pub const CHAPTER_NUMBER: &[&str] = &["chapter_number", "chapterNumber"];
    pub const WORD_COUNT: &[&str] = &["word_count", "wordCount"];
    pub const READING_TIME: &[&str] = &["reading_time_minutes", "readingTimeMinutes"];
    pub const IS_PROCESSED: &[&str] = &["is_processed", "isProcessed"];
    pub const SUMMARY: &[&str] = &["summary"];
    pub const KEY_EVENTS: &[&str] = &["key_events", "keyEvents"];
    pub const THEMES: &[&str] = &["themes"];
    pub const CHARACTERS_MENTIONED: &[&str] = &["characters_mentioned", "charactersMentioned"];
    pub const SENTIMENT_SCORE: &[&str] = &["sentiment_score", "sentimentScore"];
    pub const CREATED_AT: &[&str] = &["created_at", "createdAt"];
    pub const UPDATED_AT: &[&str] = &["updated_at", "updatedAt"];
    pub const PROCESSED_AT: &[&str] = &["processed_at", "processedAt"];

    pub const AUTHOR: &[&str] = &["author"];
    pub const NOVEL_TYPE: &[&str] = &["type", "novel_type"];
    pub const YEAR: &[&str] = &["year"];
    pub const DESCRIPTION: &[&str] = &["description"];
    pub const AVERAGE_RATING: &[&str] = &["average_rating", "averageRating"];
    pub const VOTE_COUNT: &[&str] = &["vote_count", "voteCount"];
    pub const STATUS_IN_COO: &[&str] = &["status_in_coo", "statusInCOO"];
    pub const GENRES: &[&str] = &["genres"];
    pub const TAGS: &[&str] = &["tags"];
}

/// Return the first non-null value among `aliases`.
pub fn probe<'a>(record: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    let object = record.as_object()?;
    probe_map(object, aliases)
}

fn probe_map<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

/// Text, accepting numbers and Mongo-style `{"$oid": ..}` / `{"$date": ..}` wrappers.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("$oid")
            .or_else(|| map.get("$date"))
            .and_then(as_text),
        _ => None,
    }
}

/// Non-negative integer; negatives clamp to zero, strings are parsed.
pub(super) fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(u)
            } else {
                n.as_f64().map(|f| if f <= 0.0 { 0 } else { f.round() as u64 })
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .map(|f| if f <= 0.0 { 0 } else { f.round() as u64 }),
        _ => None,
    }
}

pub(super) fn as_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

pub(super) fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// A list of strings. A bare string becomes a one-element list; non-text
/// entries are skipped.
fn as_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        other => as_text(other).into_iter().collect(),
    }
}

fn clamp_u32(count: u64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// A raw chapter record with aliases resolved and values coerced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChapterRecord {
    pub id: Option<String>,
    pub novel_id: Option<String>,
    pub title: Option<String>,
    pub chapter_number: Option<u32>,
    pub word_count: Option<u64>,
    pub reading_time_minutes: Option<u32>,
    pub is_processed: Option<bool>,
    pub summary: Option<String>,
    pub key_events: Vec<String>,
    /// Raw theme entries: plain names or already-structured theme objects
    pub themes: Vec<Value>,
    pub characters_mentioned: Vec<String>,
    pub sentiment_score: Option<f64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub processed_at: Option<String>,
}

impl ChapterRecord {
    pub fn from_value(record: &Value) -> Self {
        let text = |aliases: &[&str]| probe(record, aliases).and_then(as_text);
        let list = |aliases: &[&str]| probe(record, aliases).map(as_string_list).unwrap_or_default();

        Self {
            id: text(alias::ID),
            novel_id: text(alias::NOVEL_ID),
            title: text(alias::TITLE),
            chapter_number: probe(record, alias::CHAPTER_NUMBER)
                .and_then(as_count)
                .map(clamp_u32),
            word_count: probe(record, alias::WORD_COUNT).and_then(as_count),
            reading_time_minutes: probe(record, alias::READING_TIME)
                .and_then(as_count)
                .map(clamp_u32),
            is_processed: probe(record, alias::IS_PROCESSED).and_then(as_flag),
            summary: text(alias::SUMMARY),
            key_events: list(alias::KEY_EVENTS),
            themes: match probe(record, alias::THEMES) {
                Some(Value::Array(items)) => items.clone(),
                Some(Value::String(name)) => vec![Value::String(name.clone())],
                _ => Vec::new(),
            },
            characters_mentioned: list(alias::CHARACTERS_MENTIONED),
            sentiment_score: probe(record, alias::SENTIMENT_SCORE).and_then(as_float),
            created_at: text(alias::CREATED_AT),
            updated_at: text(alias::UPDATED_AT),
            processed_at: text(alias::PROCESSED_AT),
        }
    }

    /// Fill fields this record lacks from `other`.
    pub fn fill_from(&mut self, other: &ChapterRecord) {
        fn fill<T: Clone>(slot: &mut Option<T>, other: &Option<T>) {
            if slot.is_none() {
                *slot = other.clone();
            }
        }
        fn fill_vec<T: Clone>(slot: &mut Vec<T>, other: &[T]) {
            if slot.is_empty() {
                *slot = other.to_vec();
            }
        }

        fill(&mut self.id, &other.id);
        fill(&mut self.novel_id, &other.novel_id);
        fill(&mut self.title, &other.title);
        fill(&mut self.chapter_number, &other.chapter_number);
        fill(&mut self.word_count, &other.word_count);
        fill(&mut self.reading_time_minutes, &other.reading_time_minutes);
        fill(&mut self.is_processed, &other.is_processed);
        fill(&mut self.summary, &other.summary);
        fill_vec(&mut self.key_events, &other.key_events);
        fill_vec(&mut self.themes, &other.themes);
        fill_vec(&mut self.characters_mentioned, &other.characters_mentioned);
        fill(&mut self.sentiment_score, &other.sentiment_score);
        fill(&mut self.created_at, &other.created_at);
        fill(&mut self.updated_at, &other.updated_at);
        fill(&mut self.processed_at, &other.processed_at);
    }

    /// Whether this record is the chapter identified by `chapter_id`.
    pub fn has_id(&self, chapter_id: &str) -> bool {
        self.id.as_deref() == Some(chapter_id)
    }
}

/// A novel record with aliases resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NovelRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub novel_type: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub average_rating: Option<f64>,
    pub vote_count: Option<u64>,
    pub status_in_coo: Option<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
}

impl NovelRecord {
    pub fn from_value(record: &Value) -> Self {
        let text = |aliases: &[&str]| probe(record, aliases).and_then(as_text);
        let list = |aliases: &[&str]| probe(record, aliases).map(as_string_list).unwrap_or_default();

        Self {
            id: text(alias::ID),
            title: text(alias::TITLE),
            author: text(alias::AUTHOR),
            novel_type: text(alias::NOVEL_TYPE),
            year: probe(record, alias::YEAR)
                .and_then(as_float)
                .map(|y| y.round() as i32),
            description: text(alias::DESCRIPTION),
            average_rating: probe(record, alias::AVERAGE_RATING).and_then(as_float),
            vote_count: probe(record, alias::VOTE_COUNT).and_then(as_count),
            status_in_coo: text(alias::STATUS_IN_COO),
            genres: list(alias::GENRES),
            tags: list(alias::TAGS),
        }
    }

    pub fn has_id(&self, novel_id: &str) -> bool {
        self.id.as_deref() == Some(novel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn probe_prefers_first_present_alias() {
        let record = json!({"averageRating": 8.1, "average_rating": 9.2});
        let value = probe(&record, alias::AVERAGE_RATING).unwrap();
        assert_eq!(value.as_f64(), Some(9.2));
    }

    #[test]
    fn probe_skips_null_aliases() {
        let record = json!({"average_rating": null, "averageRating": 8.1});
        let novel = NovelRecord::from_value(&record);
        assert_eq!(novel.average_rating, Some(8.1));
    }

    #[test]
    fn probe_on_non_object_is_none() {
        assert!(probe(&json!("chapter"), alias::ID).is_none());
        assert!(probe(&Value::Null, alias::ID).is_none());
    }

    #[test]
    fn underscore_id_and_oid_wrapper() {
        let chapter = ChapterRecord::from_value(&json!({"_id": {"$oid": "665f"}}));
        assert_eq!(chapter.id.as_deref(), Some("665f"));

        let chapter = ChapterRecord::from_value(&json!({"id": 4}));
        assert_eq!(chapter.id.as_deref(), Some("4"));
    }

    #[test]
    fn counts_are_coerced_and_clamped() {
        let chapter = ChapterRecord::from_value(&json!({
            "word_count": "1500",
            "reading_time_minutes": -3,
            "chapterNumber": 4.0
        }));
        assert_eq!(chapter.word_count, Some(1500));
        assert_eq!(chapter.reading_time_minutes, Some(0));
        assert_eq!(chapter.chapter_number, Some(4));
    }

    #[test]
    fn unparseable_values_become_absent() {
        let chapter = ChapterRecord::from_value(&json!({
            "word_count": "many",
            "is_processed": "maybe",
            "sentiment_score": "NaN"
        }));
        assert_eq!(chapter.word_count, None);
        assert_eq!(chapter.is_processed, None);
        assert_eq!(chapter.sentiment_score, None);
    }

    #[test]
    fn flags_accept_common_spellings() {
        let chapter = ChapterRecord::from_value(&json!({"isProcessed": "true"}));
        assert_eq!(chapter.is_processed, Some(true));
        let chapter = ChapterRecord::from_value(&json!({"is_processed": 0}));
        assert_eq!(chapter.is_processed, Some(false));
    }

    #[test]
    fn lists_skip_non_text_entries() {
        let chapter = ChapterRecord::from_value(&json!({
            "characters_mentioned": ["Alice", null, "  ", "Bob", 7],
            "key_events": "The door opens"
        }));
        assert_eq!(chapter.characters_mentioned, vec!["Alice", "Bob", "7"]);
        assert_eq!(chapter.key_events, vec!["The door opens"]);
    }

    #[test]
    fn novel_status_alias() {
        let novel = NovelRecord::from_value(&json!({
            "_id": "683a",
            "title": "Omniscient Reader's Viewpoint",
            "statusInCOO": "Completed",
            "voteCount": 15000,
            "year": 2018,
            "genres": ["Fantasy", "Action"]
        }));
        assert!(novel.has_id("683a"));
        assert_eq!(novel.status_in_coo.as_deref(), Some("Completed"));
        assert_eq!(novel.vote_count, Some(15000));
        assert_eq!(novel.year, Some(2018));
        assert_eq!(novel.genres.len(), 2);
    }

    #[test]
    fn fill_from_keeps_existing_values() {
        let mut detail = ChapterRecord::from_value(&json!({"id": "ch1", "summary": "Detailed"}));
        let listing = ChapterRecord::from_value(&json!({
            "id": "other",
            "summary": "Listing",
            "word_count": 1500
        }));
        detail.fill_from(&listing);

        assert_eq!(detail.id.as_deref(), Some("ch1"));
        assert_eq!(detail.summary.as_deref(), Some("Detailed"));
        assert_eq!(detail.word_count, Some(1500));
    }
}
