//! Per-user session state: current selection and bounded chat history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The novel and chapter a session is looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub novel_id: Option<String>,
    pub chapter_id: Option<String>,
}

/// State for one reader.
///
/// Passed explicitly to every handler that needs it; nothing here is global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub id: Uuid,
    pub selection: Selection,
    history: VecDeque<ChatMessage>,
    max_messages: usize,
}

impl SessionContext {
    /// A fresh session keeping at most `max_messages` chat messages.
    pub fn new(max_messages: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            selection: Selection::default(),
            history: VecDeque::new(),
            max_messages,
        }
    }

    /// Change the selection. Returns whether anything changed; a new novel
    /// clears the chapter unless one is given.
    pub fn select(&mut self, novel_id: Option<&str>, chapter_id: Option<&str>) -> bool {
        let novel_changed = self.selection.novel_id.as_deref() != novel_id;
        let next = Selection {
            novel_id: novel_id.map(str::to_string),
            chapter_id: match chapter_id {
                Some(id) => Some(id.to_string()),
                None if novel_changed => None,
                None => self.selection.chapter_id.clone(),
            },
        };
        if next == self.selection {
            return false;
        }
        tracing::debug!(session = %self.id, novel = ?next.novel_id, chapter = ?next.chapter_id, "selection changed");
        self.selection = next;
        true
    }

    /// Append a message, dropping the oldest beyond the bound.
    pub fn push(&mut self, message: ChatMessage) {
        self.history.push_back(message);
        while self.history.len() > self.max_messages {
            self.history.pop_front();
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
