//! Chat companion replies
//!
//! The remote service answers chat turns when it can. When it cannot, a
//! local reply is routed by keyword and answered from the chapter document.

use crate::analysis::ChapterAnalysisDocument;
use serde::{Deserialize, Serialize};

/// Questions offered when the document has none of its own.
pub const DEFAULT_QUESTIONS: &[&str] = &[
    "Can you tell me more about the characters?",
    "What are the main themes?",
    "How does this chapter advance the plot?",
];

/// How many names or themes a local reply lists.
const LISTED: usize = 5;

/// One assistant turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatReply {
    pub response: String,
    pub references: Vec<String>,
    pub suggested_questions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Characters,
    Themes,
    Summary,
    Other,
}

impl Topic {
    fn of(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("character") {
            Topic::Characters
        } else if lower.contains("theme") {
            Topic::Themes
        } else if lower.contains("summary") || lower.contains("summarize") {
            Topic::Summary
        } else {
            Topic::Other
        }
    }
}

/// Suggested questions: the document's key questions, else the defaults.
pub fn conversation_starters(document: Option<&ChapterAnalysisDocument>) -> Vec<String> {
    match document {
        Some(doc) if !doc.interactive_companion.key_questions.is_empty() => {
            doc.interactive_companion.key_questions.clone()
        }
        _ => DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect(),
    }
}

fn listing(items: &[String]) -> String {
    let shown: Vec<&str> = items.iter().take(LISTED).map(String::as_str).collect();
    let mut text = shown.join(", ");
    if items.len() > LISTED {
        text.push_str(&format!(" and {} more", items.len() - LISTED));
    }
    text
}

/// A reply built without the remote service.
pub fn fallback_reply(message: &str, document: Option<&ChapterAnalysisDocument>) -> ChatReply {
    let suggested_questions = conversation_starters(document);
    let generic = || {
        format!(
            "That's an interesting question about '{}'. Pick a chapter and I can point you to its characters, themes and events.",
            message.trim()
        )
    };

    let Some(doc) = document else {
        return ChatReply {
            response: generic(),
            references: Vec::new(),
            suggested_questions,
        };
    };

    let (response, reference) = match Topic::of(message) {
        Topic::Characters if !doc.character_mapping.characters.is_empty() => {
            let names: Vec<String> = doc.character_mapping.characters.iter().map(|c| c.name.clone()).collect();
            (
                format!("Characters in this chapter: {}.", listing(&names)),
                "Character analysis",
            )
        }
        Topic::Themes if !doc.themes.is_empty() => {
            let themes: Vec<String> = doc.themes.iter().map(|t| t.theme.clone()).collect();
            (format!("Main themes: {}.", listing(&themes)), "Theme analysis")
        }
        Topic::Summary if !doc.summary.concise.trim().is_empty() => {
            (doc.summary.concise.trim().to_string(), "Chapter summary")
        }
        _ => (
            format!(
                "That's an interesting question about '{}'. Based on the chapter context, I can help you explore it further.",
                message.trim()
            ),
            "Chapter context",
        ),
    };

    ChatReply {
        response,
        references: vec![reference.to_string()],
        suggested_questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{CharacterRecord, ThemeEntry};

    fn document() -> ChapterAnalysisDocument {
        let mut doc = ChapterAnalysisDocument::default();
        doc.summary.concise = "Elizabeth visits Netherfield.".to_string();
        doc.character_mapping.characters = vec![
            CharacterRecord::named("Elizabeth Bennet"),
            CharacterRecord::named("Jane Bennet"),
        ];
        doc.themes = vec![ThemeEntry {
            theme: "Family".to_string(),
            relevance: 0.8,
            evidence: String::new(),
        }];
        doc
    }

    #[test]
    fn routes_character_questions() {
        let reply = fallback_reply("Who are the Characters here?", Some(&document()));
        assert_eq!(reply.response, "Characters in this chapter: Elizabeth Bennet, Jane Bennet.");
        assert_eq!(reply.references, vec!["Character analysis"]);
        assert_eq!(reply.suggested_questions.len(), DEFAULT_QUESTIONS.len());
    }

    #[test]
    fn routes_theme_and_summary_questions() {
        let doc = document();
        assert_eq!(fallback_reply("main themes?", Some(&doc)).response, "Main themes: Family.");
        assert_eq!(
            fallback_reply("give me a summary", Some(&doc)).response,
            "Elizabeth visits Netherfield."
        );
    }

    #[test]
    fn empty_section_falls_through_to_generic() {
        let reply = fallback_reply("themes?", Some(&ChapterAnalysisDocument::default()));
        assert!(reply.response.starts_with("That's an interesting question about 'themes?'"));
        assert_eq!(reply.references, vec!["Chapter context"]);
    }

    #[test]
    fn no_document_has_no_references() {
        let reply = fallback_reply("hello", None);
        assert!(reply.references.is_empty());
        assert!(reply.response.contains("'hello'"));
    }

    #[test]
    fn key_questions_become_suggestions() {
        let mut doc = document();
        doc.interactive_companion.key_questions = vec!["Why Netherfield?".to_string()];
        assert_eq!(conversation_starters(Some(&doc)), vec!["Why Netherfield?"]);
    }

    #[test]
    fn long_lists_are_shortened() {
        let names: Vec<String> = (1..=7).map(|i| format!("C{i}")).collect();
        assert_eq!(listing(&names), "C1, C2, C3, C4, C5 and 2 more");
    }

    #[test]
    fn reply_deserializes_with_missing_fields() {
        let reply: ChatReply = serde_json::from_value(serde_json::json!({"response": "Hi"})).unwrap();
        assert_eq!(reply.response, "Hi");
        assert!(reply.suggested_questions.is_empty());
    }
}
