//! Transport-independent companion API.
//!
//! `CompanionApi` is the single entry point for reader-facing operations.
//! The CLI (or any other front end) calls `CompanionApi` methods; it never
//! reaches into the analysis client, normalizer or graph builder directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::analysis::{normalize, ChapterAnalysisDocument, ChapterRecord, Completeness, NovelRecord};
use crate::client::{chapter_summary, fetch_chapter_analysis, AnalysisApi, ApiError};
use crate::companion::{fallback_reply, ChatReply};
use crate::config::{CompanionConfig, ConfigError};
use crate::graph::{build_from_mapping, BuildStats, CharacterGraph, GraphOptions};
use crate::session::{ChatMessage, SessionContext};

/// Errors surfaced by the companion.
#[derive(Debug, thiserror::Error)]
pub enum CompanionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("chapter '{chapter_id}' of novel '{novel_id}' not found")]
    ChapterNotFound { novel_id: String, chapter_id: String },
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a JSON file.
pub fn load_json(path: &Path) -> Result<Value, CompanionError> {
    let text = std::fs::read_to_string(path).map_err(|source| CompanionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CompanionError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Where a chapter view's analysis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// The analysis endpoint answered
    Remote,
    /// Built from the bare chapter listing entry
    Fallback,
}

/// Everything needed to render one chapter.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterView {
    pub document: ChapterAnalysisDocument,
    pub graph: CharacterGraph,
    pub stats: BuildStats,
    pub completeness: Completeness,
    pub source: DataSource,
}

impl ChapterView {
    /// Normalize, build the graph, and fill network data when the document has none.
    pub fn assemble(
        chapter: &Value,
        novel: Option<&Value>,
        analysis: Option<&Value>,
        options: &GraphOptions,
        source: DataSource,
    ) -> Self {
        let mut document = normalize(chapter, novel, analysis);
        let graph = build_from_mapping(&document.character_mapping, options);
        graph.fill_network_data(&mut document);
        Self {
            completeness: document.completeness(),
            stats: graph.stats.clone(),
            document,
            graph,
            source,
        }
    }
}

/// Single entry point for all reader-facing operations.
#[derive(Clone)]
pub struct CompanionApi {
    client: Arc<dyn AnalysisApi>,
    config: CompanionConfig,
    graph_options: GraphOptions,
}

impl CompanionApi {
    pub fn new(client: Arc<dyn AnalysisApi>, config: CompanionConfig) -> Self {
        Self {
            client,
            config,
            graph_options: GraphOptions::default(),
        }
    }

    pub fn with_graph_options(mut self, options: GraphOptions) -> Self {
        self.graph_options = options;
        self
    }

    pub fn config(&self) -> &CompanionConfig {
        &self.config
    }

    /// A session sized by the configured chat history bound.
    pub fn new_session(&self) -> SessionContext {
        SessionContext::new(self.config.max_chat_messages)
    }

    // --- Read ---

    /// Novels from the API; empty when it cannot be reached.
    pub async fn novels(&self) -> Vec<NovelRecord> {
        match self.client.list_novels(self.config.novel_list_limit, 0).await {
            Ok(novels) => novels.iter().map(NovelRecord::from_value).collect(),
            Err(e) => {
                warn!(error = %e, "novel list unavailable");
                Vec::new()
            }
        }
    }

    /// Chapters of a novel; empty when the API cannot be reached.
    pub async fn chapters(&self, novel_id: &str) -> Vec<ChapterRecord> {
        self.chapter_listing(novel_id)
            .await
            .iter()
            .map(ChapterRecord::from_value)
            .collect()
    }

    async fn chapter_listing(&self, novel_id: &str) -> Vec<Value> {
        match self
            .client
            .list_chapters(novel_id, self.config.chapter_list_limit)
            .await
        {
            Ok(chapters) => chapters,
            Err(e) => {
                warn!(novel = novel_id, error = %e, "chapter list unavailable");
                Vec::new()
            }
        }
    }

    /// Fetch, normalize and graph one chapter.
    ///
    /// When the analysis endpoint fails the view is built from the chapter's
    /// listing entry and marked `Fallback`. Fails only when neither source
    /// knows the chapter.
    pub async fn chapter_view(&self, novel_id: &str, chapter_id: &str) -> Result<ChapterView, CompanionError> {
        let novel = match self.client.get_novel(novel_id).await {
            Ok(novel) => Some(novel),
            Err(e) => {
                warn!(novel = novel_id, error = %e, "novel record unavailable");
                None
            }
        };

        let listing = self
            .chapter_listing(novel_id)
            .await
            .into_iter()
            .find(|c| ChapterRecord::from_value(c).has_id(chapter_id));

        let (analysis, source) = match fetch_chapter_analysis(self.client.as_ref(), chapter_id).await {
            Ok(analysis) => (Some(analysis), DataSource::Remote),
            Err(e) => {
                warn!(chapter = chapter_id, error = %e, "chapter analysis unavailable; using chapter record");
                (None, DataSource::Fallback)
            }
        };

        if listing.is_none() && analysis.is_none() {
            return Err(CompanionError::ChapterNotFound {
                novel_id: novel_id.to_string(),
                chapter_id: chapter_id.to_string(),
            });
        }

        let chapter = listing.unwrap_or_else(|| json!({ "id": chapter_id, "novel_id": novel_id }));
        let view = ChapterView::assemble(
            &chapter,
            novel.as_ref(),
            analysis.as_ref(),
            &self.graph_options,
            source,
        );

        info!(
            novel = novel_id,
            chapter = chapter_id,
            source = ?view.source,
            completeness = ?view.completeness,
            nodes = view.graph.node_count(),
            edges = view.graph.edge_count(),
            "chapter view ready"
        );
        Ok(view)
    }

    /// A chapter's summary without normalizing the rest of its analysis.
    pub async fn chapter_summary(&self, chapter_id: &str) -> Result<Option<Value>, CompanionError> {
        Ok(chapter_summary(self.client.as_ref(), chapter_id).await?)
    }

    // --- Chat ---

    /// One chat turn for the session's selected novel.
    ///
    /// Both the question and the reply are recorded in the session history.
    /// Without a selected novel, or when the API fails, the reply is built
    /// locally from `document`.
    pub async fn chat(
        &self,
        session: &mut SessionContext,
        message: &str,
        document: Option<&ChapterAnalysisDocument>,
    ) -> ChatReply {
        session.push(ChatMessage::user(message));

        let remote = match session.selection.novel_id.as_deref() {
            Some(novel_id) => match self.client.chat(novel_id, message).await {
                Ok(reply) if !reply.response.trim().is_empty() => Some(reply),
                Ok(_) => {
                    warn!(novel = novel_id, "empty chat reply; answering locally");
                    None
                }
                Err(e) => {
                    warn!(novel = novel_id, error = %e, "chat unavailable; answering locally");
                    None
                }
            },
            None => None,
        };

        let reply = remote.unwrap_or_else(|| fallback_reply(message, document));
        session.push(ChatMessage::assistant(reply.response.clone()));
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockAnalysisApi;
    use crate::session::Role;

    fn api(client: MockAnalysisApi) -> CompanionApi {
        CompanionApi::new(Arc::new(client), CompanionConfig::default())
    }

    fn listing() -> Vec<Value> {
        vec![json!({
            "id": "ch1",
            "novel_id": "n1",
            "title": "Chapter 1: End",
            "chapter_number": 1,
            "word_count": 1500,
            "summary": "X happens",
            "characters_mentioned": ["Alice", "Bob"]
        })]
    }

    // === Scenario: analysis endpoint down, chapter listed ===
    #[tokio::test]
    async fn falls_back_to_listing_entry() {
        let client = MockAnalysisApi::available()
            .with_novel(json!({"id": "n1", "title": "Novel"}))
            .with_chapters("n1", listing());

        let view = api(client).chapter_view("n1", "ch1").await.unwrap();

        assert_eq!(view.source, DataSource::Fallback);
        assert_eq!(view.document.summary.concise, "X happens");
        assert_eq!(view.document.metadata.novel_title, "Novel");
        assert_eq!(view.graph.node_count(), 2);
        assert_eq!(view.completeness, Completeness::Partial);
    }

    // === Scenario: analysis endpoint answers with a wrapped document ===
    #[tokio::test]
    async fn remote_document_wins() {
        let client = MockAnalysisApi::available()
            .with_chapters("n1", listing())
            .with_chapter(
                "ch1",
                json!({"analysis_data": {
                    "summary": {"concise": "Remote summary"},
                    "sentiment": {"overall_tone": "Tense"},
                    "character_mapping": {
                        "characters": [{"name": "Alice"}, {"name": "Bob"}],
                        "relationships": [{"characters": ["Alice", "Bob"], "relationship_type": "Friend", "interaction_count": 3}]
                    }
                }}),
            );

        let view = api(client).chapter_view("n1", "ch1").await.unwrap();

        assert_eq!(view.source, DataSource::Remote);
        assert_eq!(view.completeness, Completeness::Complete);
        assert_eq!(view.stats.edges_inserted, 1);
        let links = &view.document.character_mapping.network_data.links;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].value, 3);
    }

    #[tokio::test]
    async fn summary_reads_nested_document() {
        let client = MockAnalysisApi::available().with_chapter(
            "ch1",
            json!({"analysis_data": {"chapter_analysis": {"summary": {"concise": "Remote summary"}}}}),
        );

        let summary = api(client).chapter_summary("ch1").await.unwrap();
        assert_eq!(summary, Some(json!({"concise": "Remote summary"})));

        let err = api(MockAnalysisApi::available()).chapter_summary("ch9").await.unwrap_err();
        assert!(matches!(err, CompanionError::Api(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn unknown_chapter_is_an_error() {
        let err = api(MockAnalysisApi::unavailable())
            .chapter_view("n1", "ch9")
            .await
            .unwrap_err();
        assert!(matches!(err, CompanionError::ChapterNotFound { .. }));
    }

    #[tokio::test]
    async fn lists_are_empty_when_unavailable() {
        let api = api(MockAnalysisApi::unavailable());
        assert!(api.novels().await.is_empty());
        assert!(api.chapters("n1").await.is_empty());
    }

    #[tokio::test]
    async fn chat_uses_remote_reply_and_records_history() {
        let client = MockAnalysisApi::available().with_chat_reply(ChatReply {
            response: "Remote answer".into(),
            ..Default::default()
        });
        let api = api(client);
        let mut session = api.new_session();
        session.select(Some("n1"), None);

        let reply = api.chat(&mut session, "Who is Alice?", None).await;

        assert_eq!(reply.response, "Remote answer");
        let roles: Vec<Role> = session.history().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn chat_without_selection_answers_locally() {
        let api = api(MockAnalysisApi::available());
        let mut session = api.new_session();

        let reply = api.chat(&mut session, "hello", None).await;

        assert!(reply.response.contains("'hello'"));
        assert_eq!(session.history_len(), 2);
    }

    #[test]
    fn load_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_json(&path).unwrap_err();
        assert!(matches!(err, CompanionError::Json { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
