//! Keyword heuristics for raw chapter text
//!
//! Stand-ins for a real NLP backend: capitalized-name extraction, keyword
//! sentiment and theme detection, extractive summaries and sentence-level
//! co-occurrence. Their output can be fed through the normalizer like any
//! other chapter record.

use super::normalize::{reading_minutes, WORDS_PER_MINUTE};
use super::types::RelationshipRecord;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

const NAME_STOPWORDS: &[&str] = &["The", "This", "That", "When", "Where", "What", "Who", "How", "Chapter"];

const POSITIVE_WORDS: &[&str] = &["love", "joy", "happy", "wonderful", "excellent", "beautiful", "amazing"];
const NEGATIVE_WORDS: &[&str] = &["hate", "sad", "terrible", "awful", "horrible", "bad", "angry"];

const THEME_KEYWORDS: &[(&str, &[&str])] = &[
    ("Love & Romance", &["love", "romance", "marriage", "courtship", "affection", "heart"]),
    ("Social Class", &["class", "society", "wealth", "status", "gentleman", "lady"]),
    ("Pride & Prejudice", &["pride", "prejudice", "judgment", "opinion", "first impression"]),
    ("Family", &["family", "sister", "brother", "father", "mother", "parent"]),
    ("Friendship", &["friend", "friendship", "companion", "acquaintance"]),
];

/// Most candidate names kept by `extract_characters`.
pub const MAX_CHARACTERS: usize = 10;

/// Sentences kept by `reading_insights` summaries.
pub const SUMMARY_SENTENCES: usize = 3;

/// Relationship type given to sentence co-occurrence pairs.
pub const COOCCURRENCE_TYPE: &str = "Co-occurrence";

/// Whether `word` is a capital ASCII letter followed by lowercase ASCII letters.
fn is_capitalized_word(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            let rest = chars.as_str();
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_lowercase())
        }
        _ => false,
    }
}

/// Runs of whitespace-separated capitalized words. Punctuation ends a run.
fn capitalized_runs(text: &str) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let flush = |current: &mut Vec<&str>, runs: &mut Vec<String>| {
        if !current.is_empty() {
            runs.push(current.join(" "));
            current.clear();
        }
    };

    for token in text.split_whitespace() {
        let start = token.find(|c: char| c.is_ascii_alphabetic()).unwrap_or(token.len());
        if start > 0 {
            flush(&mut current, &mut runs);
        }
        let body = &token[start..];
        let end = body.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(body.len());
        let word = &body[..end];

        if is_capitalized_word(word) {
            current.push(word);
        } else {
            flush(&mut current, &mut runs);
        }
        if end < body.len() {
            flush(&mut current, &mut runs);
        }
    }
    flush(&mut current, &mut runs);
    runs
}

/// Candidate character names: capitalized word runs seen more than once,
/// most frequent first (ties keep first-seen order).
pub fn extract_characters(text: &str) -> Vec<String> {
    let stopwords: HashSet<&str> = NAME_STOPWORDS.iter().copied().collect();
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for (position, run) in capitalized_runs(text).into_iter().enumerate() {
        if stopwords.contains(run.as_str()) {
            continue;
        }
        counts.entry(run).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(name, (count, first))| (name, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(MAX_CHARACTERS)
        .filter(|(_, count, _)| *count > 1)
        .map(|(name, _, _)| name)
        .collect()
}

/// Share of positive, negative and neutral signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentRatios {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl SentimentRatios {
    /// Positive minus negative, in `[-1, 1]`.
    pub fn score(&self) -> f64 {
        (self.positive - self.negative).clamp(-1.0, 1.0)
    }
}

/// Keyword sentiment. Each keyword counts once if it occurs anywhere in the text.
pub fn analyze_sentiment(text: &str) -> SentimentRatios {
    let lower = text.to_lowercase();
    let present = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count() as f64;
    let positive = present(POSITIVE_WORDS);
    let negative = present(NEGATIVE_WORDS);
    let total = text.split_whitespace().count().max(1) as f64;

    SentimentRatios {
        positive: positive / total,
        negative: negative / total,
        neutral: 1.0 - (positive + negative) / total,
    }
}

/// Theme names whose keywords occur in the text, in table order.
pub fn extract_themes(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    THEME_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(theme, _)| theme.to_string())
        .collect()
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Extractive summary.
///
/// Keeps sentences longer than 20 characters. Sentences near either end
/// score higher, as do sentences of 50 to 200 characters; the best
/// `max_sentences` are joined in score order.
pub fn summarize(text: &str, max_sentences: usize) -> String {
    let candidates: Vec<&str> = sentences(text).filter(|s| s.chars().count() > 20).collect();
    if candidates.len() <= max_sentences {
        return candidates.join(" ");
    }

    let n = candidates.len();
    let mut scored: Vec<(&str, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(i, sentence)| {
            let position = if i < 2 || i + 2 >= n { 1.0 } else { 0.5 };
            let len = sentence.chars().count();
            let length = if (50..=200).contains(&len) { 1.0 } else { 0.7 };
            (*sentence, position * length)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(max_sentences)
        .map(|(s, _)| s)
        .collect::<Vec<_>>()
        .join(" ")
}

/// For each character, the characters it shares at least one sentence with.
pub fn cooccurrence(text: &str, characters: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut related: BTreeMap<String, Vec<String>> =
        characters.iter().map(|c| (c.clone(), Vec::new())).collect();

    for sentence in sentences(text) {
        let present: Vec<&String> = characters.iter().filter(|c| sentence.contains(c.as_str())).collect();
        for (i, a) in present.iter().enumerate() {
            for b in &present[i + 1..] {
                if a == b {
                    continue;
                }
                let list = related.entry((*a).clone()).or_default();
                if !list.contains(*b) {
                    list.push((*b).clone());
                }
                let list = related.entry((*b).clone()).or_default();
                if !list.contains(*a) {
                    list.push((*a).clone());
                }
            }
        }
    }
    related
}

/// Everything the heuristics can say about one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextInsights {
    pub characters: Vec<String>,
    pub sentiment: SentimentRatios,
    pub themes: Vec<String>,
    pub summary: String,
    pub relationships: BTreeMap<String, Vec<String>>,
    pub word_count: usize,
    /// Minutes at the standard reading speed, unrounded
    pub reading_time: f64,
}

pub fn reading_insights(text: &str) -> TextInsights {
    let characters = extract_characters(text);
    let relationships = cooccurrence(text, &characters);
    let word_count = text.split_whitespace().count();

    TextInsights {
        sentiment: analyze_sentiment(text),
        themes: extract_themes(text),
        summary: summarize(text, SUMMARY_SENTENCES),
        relationships,
        characters,
        word_count,
        reading_time: word_count as f64 / WORDS_PER_MINUTE as f64,
    }
}

impl TextInsights {
    /// A flat chapter record the normalizer accepts.
    pub fn to_chapter_record(&self, title: &str) -> Value {
        json!({
            "title": title,
            "word_count": self.word_count,
            "reading_time_minutes": reading_minutes(self.word_count as u64),
            "is_processed": true,
            "summary": self.summary,
            "themes": self.themes,
            "characters_mentioned": self.characters,
            "sentiment_score": self.sentiment.score(),
        })
    }

    /// One relationship per co-occurring pair, each pair once.
    pub fn relationship_records(&self) -> Vec<RelationshipRecord> {
        let mut seen = BTreeSet::new();
        let mut records = Vec::new();
        for (a, others) in &self.relationships {
            for b in others {
                let pair = if a <= b { (a, b) } else { (b, a) };
                if seen.insert(pair) {
                    records.push(RelationshipRecord::between(pair.0.clone(), pair.1.clone(), COOCCURRENCE_TYPE));
                }
            }
        }
        records
    }
}

/// A chapter in which a character appears.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterAppearance {
    pub chapter: String,
    pub sentiment: SentimentRatios,
    pub themes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NovelStatistics {
    pub total_chapters: usize,
    pub total_characters: usize,
    pub total_themes: usize,
    pub total_words: usize,
    pub estimated_reading_time: f64,
    pub characters: Vec<String>,
    pub themes: Vec<String>,
}

/// Accumulates insights across the chapters of one novel.
#[derive(Debug, Clone, Default)]
pub struct NovelTracker {
    chapters: Vec<(String, TextInsights)>,
    characters: BTreeSet<String>,
    themes: BTreeSet<String>,
}

impl NovelTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze a chapter. Re-adding a chapter id replaces its insights.
    pub fn add_chapter(&mut self, chapter_id: &str, text: &str) -> &TextInsights {
        let insights = reading_insights(text);
        self.characters.extend(insights.characters.iter().cloned());
        self.themes.extend(insights.themes.iter().cloned());

        let idx = match self.chapters.iter().position(|(id, _)| id == chapter_id) {
            Some(idx) => {
                self.chapters[idx].1 = insights;
                idx
            }
            None => {
                self.chapters.push((chapter_id.to_string(), insights));
                self.chapters.len() - 1
            }
        };
        &self.chapters[idx].1
    }

    pub fn chapter(&self, chapter_id: &str) -> Option<&TextInsights> {
        self.chapters
            .iter()
            .find(|(id, _)| id == chapter_id)
            .map(|(_, insights)| insights)
    }

    /// Chapters in which `character` was detected, in insertion order.
    pub fn character_development(&self, character: &str) -> Vec<CharacterAppearance> {
        self.chapters
            .iter()
            .filter(|(_, insights)| insights.characters.iter().any(|c| c == character))
            .map(|(id, insights)| CharacterAppearance {
                chapter: id.clone(),
                sentiment: insights.sentiment,
                themes: insights.themes.clone(),
            })
            .collect()
    }

    /// Totals across all chapters; `None` before any chapter is added.
    pub fn statistics(&self) -> Option<NovelStatistics> {
        if self.chapters.is_empty() {
            return None;
        }
        Some(NovelStatistics {
            total_chapters: self.chapters.len(),
            total_characters: self.characters.len(),
            total_themes: self.themes.len(),
            total_words: self.chapters.iter().map(|(_, i)| i.word_count).sum(),
            estimated_reading_time: self.chapters.iter().map(|(_, i)| i.reading_time).sum(),
            characters: self.characters.iter().cloned().collect(),
            themes: self.themes.iter().cloned().collect(),
        })
    }
}
