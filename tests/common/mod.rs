//! Shared fixtures for companion integration tests
//!
//! Payloads mirror what the analysis service returns: a novel record, the
//! chapter listing, and chapter endpoint payloads in both shapes.

#![allow(dead_code)]

use novel_companion::{CompanionApi, CompanionConfig, MockAnalysisApi};
use serde_json::{json, Value};
use std::sync::Arc;

pub const NOVEL_ID: &str = "683a3adcf4943c13b3ffb951";

pub fn novel() -> Value {
    json!({
        "_id": {"$oid": NOVEL_ID},
        "title": "Omniscient Reader's Viewpoint",
        "author": "Sing Shong",
        "type": "Web Novel",
        "year": 2018,
        "averageRating": "9.2",
        "voteCount": 15000,
        "statusInCOO": "Completed",
        "genres": ["Fantasy", "Action", "Drama"],
        "tags": ["Apocalypse", "Survival"]
    })
}

pub fn chapter_listing() -> Vec<Value> {
    vec![
        json!({
            "id": "ch0",
            "novel_id": NOVEL_ID,
            "title": "Prologue",
            "chapter_number": 0,
            "word_count": 785,
            "is_processed": true
        }),
        json!({
            "id": "ch1",
            "novelId": NOVEL_ID,
            "title": "Chapter 1: End",
            "chapterNumber": "1",
            "wordCount": 1500,
            "readingTimeMinutes": 7,
            "isProcessed": true,
            "summary": "Kim Dokja reads the last chapter",
            "themes": ["Solitude"],
            "characters_mentioned": ["Kim Dokja", "Yoo Joonghyuk"]
        }),
    ]
}

/// Chapter endpoint payload wrapping a full analysis document.
pub fn wrapped_analysis() -> Value {
    json!({
        "id": "ch4",
        "analysis_data": {
            "chapter_analysis": {
                "metadata": {
                    "novel_id": NOVEL_ID,
                    "chapter_id": "ch4",
                    "chapter_number": 4,
                    "chapter_title": "Starting the Paid Service, III",
                    "word_count": 1727,
                    "estimated_reading_time": 8
                },
                "summary": {
                    "concise": "The subway scenario begins.",
                    "detailed": "Passengers face the first scenario.",
                    "key_events": ["Scenario announced", "First kill"]
                },
                "sentiment_analysis": {
                    "overall_tone": "Tense",
                    "emotional_arc": [{"emotion": "Fear", "intensity": 0.9}]
                },
                "themes": [{"theme": "Survival", "relevance": 0.8, "evidence": "Passengers fight"}]
            },
            "character_mapping": {
                "characters": [
                    {"name": "Kim Dokja (protagonist)", "role": "Protagonist"},
                    {"name": "Yoo Sangah", "role": "Supporting"},
                    {"name": "Han Myungoh", "role": "Antagonist"}
                ],
                "relationships": [
                    {"characters": ["Kim Dokja", "Yoo Sangah"], "relationship_type": "Colleague", "interaction_count": 6},
                    {"characters": ["Yoo Sangah", "Kim Dokja (reader)"], "relationship_type": "Ally", "interaction_count": 2},
                    {"characters": ["Han Myungoh", "Dokkaebi"], "relationship_type": "Subject", "interaction_count": 1}
                ]
            },
            "interactive_companion": {
                "key_questions": ["Why does Kim Dokja stay calm?"],
                "suggested_discussion_points": ["Reader versus protagonist"]
            }
        }
    })
}

/// Listing with the analysed chapter added.
pub fn listing_with_ch4() -> Vec<Value> {
    let mut chapters = chapter_listing();
    chapters.push(json!({"id": "ch4", "novel_id": NOVEL_ID, "title": "Chapter 4", "chapter_number": 4}));
    chapters
}

pub fn mock_api() -> MockAnalysisApi {
    MockAnalysisApi::available()
        .with_novel(novel())
        .with_chapters(NOVEL_ID, listing_with_ch4())
        .with_chapter("ch4", wrapped_analysis())
}

pub fn companion(client: MockAnalysisApi) -> CompanionApi {
    CompanionApi::new(Arc::new(client), CompanionConfig::default())
}
