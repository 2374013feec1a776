//! Analysis API client
//!
//! Defines the client trait for the remote novel analysis service and two
//! implementations:
//! - `HttpAnalysisApi`: JSON over HTTP with reqwest (production)
//! - `MockAnalysisApi`: returns preconfigured payloads (testing)
//!
//! Payloads are returned as raw JSON; shaping them is the normalizer's job.

use crate::companion::ChatReply;
use crate::config::CompanionConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Errors from analysis API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("analysis API not available: {0}")]
    Unavailable(String),
    #[error("analysis API returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("response parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            ApiError::Unavailable(err.to_string())
        }
    }
}

/// Client trait for the analysis service.
///
/// Abstracts over transport so the companion does not depend on how the
/// service is reached.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn list_novels(&self, limit: usize, skip: usize) -> Result<Vec<Value>, ApiError>;

    async fn get_novel(&self, novel_id: &str) -> Result<Value, ApiError>;

    async fn list_chapters(&self, novel_id: &str, limit: usize) -> Result<Vec<Value>, ApiError>;

    /// The chapter endpoint payload, which may carry an `analysis_data` envelope.
    async fn get_chapter(&self, chapter_id: &str) -> Result<Value, ApiError>;

    async fn chat(&self, novel_id: &str, message: &str) -> Result<ChatReply, ApiError>;
}

/// Analysis payload for a chapter: the `analysis_data` envelope when
/// present, otherwise the whole chapter payload.
pub async fn fetch_chapter_analysis(api: &dyn AnalysisApi, chapter_id: &str) -> Result<Value, ApiError> {
    let mut chapter = api.get_chapter(chapter_id).await?;
    match chapter.get_mut("analysis_data").map(Value::take) {
        Some(analysis) if !analysis.is_null() => Ok(analysis),
        _ => Ok(chapter),
    }
}

/// Just a chapter's summary: the flat `summary` field, else the one nested in
/// the analysis document. `None` when the chapter has no summary yet.
pub async fn chapter_summary(api: &dyn AnalysisApi, chapter_id: &str) -> Result<Option<Value>, ApiError> {
    const SUMMARY_PATHS: &[&str] = &[
        "/summary",
        "/analysis_data/chapter_analysis/summary",
        "/analysis_data/summary",
    ];
    let chapter = api.get_chapter(chapter_id).await?;
    Ok(SUMMARY_PATHS
        .iter()
        .filter_map(|path| chapter.pointer(path))
        .find(|summary| !summary.is_null())
        .cloned())
}

/// reqwest-backed client.
pub struct HttpAnalysisApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisApi {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &CompanionConfig) -> Result<Self, ApiError> {
        Self::new(config.api_base_url.clone(), config.api_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let url = response.url().to_string();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(format!("{url}: {e}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self.client.get(&url).query(query).send().await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl AnalysisApi for HttpAnalysisApi {
    async fn list_novels(&self, limit: usize, skip: usize) -> Result<Vec<Value>, ApiError> {
        self.get_json(
            "/api/novels/",
            &[("limit", limit.to_string()), ("skip", skip.to_string())],
        )
        .await
    }

    async fn get_novel(&self, novel_id: &str) -> Result<Value, ApiError> {
        self.get_json(&format!("/api/novels/{novel_id}"), &[]).await
    }

    async fn list_chapters(&self, novel_id: &str, limit: usize) -> Result<Vec<Value>, ApiError> {
        self.get_json(
            &format!("/api/novels/{novel_id}/chapters"),
            &[("limit", limit.to_string())],
        )
        .await
    }

    async fn get_chapter(&self, chapter_id: &str) -> Result<Value, ApiError> {
        self.get_json(&format!("/api/chapters/{chapter_id}"), &[]).await
    }

    async fn chat(&self, novel_id: &str, message: &str) -> Result<ChatReply, ApiError> {
        let url = self.url(&format!("/api/novels/{novel_id}/chat"));
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(&json!({ "message": message }))
            .send()
            .await?;
        Self::read_json(response).await
    }
}

/// Mock client for testing. Unregistered ids answer `NotFound`.
#[derive(Default)]
pub struct MockAnalysisApi {
    unavailable: bool,
    novels: Vec<Value>,
    chapters: HashMap<String, Vec<Value>>,
    chapter_payloads: HashMap<String, Value>,
    chat_reply: Option<ChatReply>,
}

impl MockAnalysisApi {
    /// A mock that answers from its registered payloads.
    pub fn available() -> Self {
        Self::default()
    }

    /// A mock whose every call fails with `Unavailable`.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_novel(mut self, novel: Value) -> Self {
        self.novels.push(novel);
        self
    }

    pub fn with_chapters(mut self, novel_id: impl Into<String>, chapters: Vec<Value>) -> Self {
        self.chapters.insert(novel_id.into(), chapters);
        self
    }

    /// Register the chapter endpoint payload for `chapter_id`.
    pub fn with_chapter(mut self, chapter_id: impl Into<String>, payload: Value) -> Self {
        self.chapter_payloads.insert(chapter_id.into(), payload);
        self
    }

    pub fn with_chat_reply(mut self, reply: ChatReply) -> Self {
        self.chat_reply = Some(reply);
        self
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.unavailable {
            return Err(ApiError::Unavailable(
                "mock client configured as unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AnalysisApi for MockAnalysisApi {
    async fn list_novels(&self, limit: usize, skip: usize) -> Result<Vec<Value>, ApiError> {
        self.check()?;
        Ok(self.novels.iter().skip(skip).take(limit).cloned().collect())
    }

    async fn get_novel(&self, novel_id: &str) -> Result<Value, ApiError> {
        self.check()?;
        self.novels
            .iter()
            .find(|n| crate::analysis::NovelRecord::from_value(n).has_id(novel_id))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("novel '{novel_id}'")))
    }

    async fn list_chapters(&self, novel_id: &str, limit: usize) -> Result<Vec<Value>, ApiError> {
        self.check()?;
        let chapters = self
            .chapters
            .get(novel_id)
            .ok_or_else(|| ApiError::NotFound(format!("chapters for novel '{novel_id}'")))?;
        Ok(chapters.iter().take(limit).cloned().collect())
    }

    async fn get_chapter(&self, chapter_id: &str) -> Result<Value, ApiError> {
        self.check()?;
        self.chapter_payloads
            .get(chapter_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("chapter '{chapter_id}'")))
    }

    async fn chat(&self, novel_id: &str, _message: &str) -> Result<ChatReply, ApiError> {
        self.check()?;
        self.chat_reply
            .clone()
            .ok_or_else(|| ApiError::NotFound(format!("chat for novel '{novel_id}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn novel(id: &str, title: &str) -> Value {
        json!({"id": id, "title": title})
    }

    #[tokio::test]
    async fn mock_lists_with_limit_and_skip() {
        let api = MockAnalysisApi::available()
            .with_novel(novel("n1", "One"))
            .with_novel(novel("n2", "Two"))
            .with_novel(novel("n3", "Three"));

        let page = api.list_novels(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["id"], "n2");
    }

    #[tokio::test]
    async fn mock_finds_novel_by_either_id_alias() {
        let api = MockAnalysisApi::available().with_novel(json!({"_id": "abc", "title": "Aliased"}));
        let found = api.get_novel("abc").await.unwrap();
        assert_eq!(found["title"], "Aliased");

        let err = api.get_novel("zzz").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn unavailable_mock_fails_every_call() {
        let api = MockAnalysisApi::unavailable().with_novel(novel("n1", "One"));

        assert!(matches!(api.list_novels(10, 0).await, Err(ApiError::Unavailable(_))));
        assert!(matches!(api.get_chapter("ch1").await, Err(ApiError::Unavailable(_))));
        assert!(matches!(api.chat("n1", "hi").await, Err(ApiError::Unavailable(_))));
    }

    #[tokio::test]
    async fn fetch_analysis_unwraps_envelope() {
        let api = MockAnalysisApi::available()
            .with_chapter(
                "ch1",
                json!({"id": "ch1", "analysis_data": {"summary": {"concise": "Wrapped"}}}),
            )
            .with_chapter("ch2", json!({"id": "ch2", "summary": "Flat"}));

        let wrapped = fetch_chapter_analysis(&api, "ch1").await.unwrap();
        assert_eq!(wrapped, json!({"summary": {"concise": "Wrapped"}}));

        let flat = fetch_chapter_analysis(&api, "ch2").await.unwrap();
        assert_eq!(flat["summary"], "Flat");
    }

    #[tokio::test]
    async fn summary_prefers_flat_field_then_nested_document() {
        let api = MockAnalysisApi::available()
            .with_chapter("ch1", json!({"id": "ch1", "summary": "Flat"}))
            .with_chapter(
                "ch2",
                json!({"id": "ch2", "summary": null, "analysis_data": {"chapter_analysis": {"summary": {"concise": "Nested"}}}}),
            )
            .with_chapter("ch3", json!({"id": "ch3"}));

        assert_eq!(chapter_summary(&api, "ch1").await.unwrap(), Some(json!("Flat")));
        assert_eq!(
            chapter_summary(&api, "ch2").await.unwrap(),
            Some(json!({"concise": "Nested"}))
        );
        assert_eq!(chapter_summary(&api, "ch3").await.unwrap(), None);
        assert!(chapter_summary(&MockAnalysisApi::unavailable(), "ch1").await.is_err());
    }

    #[tokio::test]
    async fn null_envelope_returns_whole_payload() {
        let api = MockAnalysisApi::available().with_chapter("ch1", json!({"id": "ch1", "analysis_data": null}));
        let payload = fetch_chapter_analysis(&api, "ch1").await.unwrap();
        assert_eq!(payload["id"], "ch1");
    }

    #[test]
    fn http_client_trims_base_url() {
        let api = HttpAnalysisApi::new("http://localhost:8000/", std::time::Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/api/novels/"), "http://localhost:8000/api/novels/");
    }
}
