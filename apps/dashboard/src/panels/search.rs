//! Semantic search over resume and job embeddings.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::AppError;
use crate::models::{SearchHit, SearchQuery};
use crate::panels::jobs::FieldError;
use crate::panels::non_blank;
use crate::shell::session::Session;
use crate::shell::{page_context, Tab};
use crate::state::AppState;

pub const MIN_QUERY_CHARS: usize = 3;
const DEFAULT_TOP_K: u32 = 20;
const MAX_TOP_K: u32 = 50;
const SNIPPET_CHARS: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Resumes,
    Jobs,
}

impl SearchKind {
    fn tab(&self) -> Tab {
        match self {
            Self::Resumes => Tab::Resumes,
            Self::Jobs => Tab::Jobs,
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Self::Resumes => "/resumes/search",
            Self::Jobs => "/jobs/search",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Resumes => "Search resumes",
            Self::Jobs => "Search jobs",
        }
    }

    /// Metadata key holding the owning entity's id.
    fn id_key(&self) -> &'static str {
        match self {
            Self::Resumes => "resume_id",
            Self::Jobs => "job_id",
        }
    }

    fn link(&self, id: &str) -> String {
        match self {
            Self::Resumes => format!("/resumes/{id}/analytics"),
            Self::Jobs => format!("/jobs/{id}"),
        }
    }

    /// The job endpoint has no filter parameter.
    fn takes_filters(&self) -> bool {
        matches!(self, Self::Resumes)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Form
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchForm {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
}

impl SearchForm {
    /// Result count, 1–50. Blank or unparsable falls back to 20.
    pub fn top_k(&self) -> u32 {
        self.top_k
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_TOP_K)
            .clamp(1, MAX_TOP_K)
    }

    /// Checks the query length and, when `with_filters`, that the filters
    /// are a JSON object. Nothing reaches the backend unless this passes.
    pub fn validate(&self, with_filters: bool) -> Result<SearchQuery, Vec<FieldError>> {
        let mut errors = Vec::new();

        let query = self.query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            errors.push(FieldError::new(
                "query",
                format!("Search query must be at least {MIN_QUERY_CHARS} characters"),
            ));
        }

        let filters = if with_filters {
            non_blank(self.filters.as_deref())
        } else {
            None
        };
        if let Some(raw) = &filters {
            if serde_json::from_str::<Map<String, Value>>(raw).is_err() {
                errors.push(FieldError::new(
                    "filters",
                    "Filters must be a JSON object, for example {\"experience_level\": \"senior\"}",
                ));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(SearchQuery {
            query: query.to_string(),
            top_k: self.top_k(),
            filters,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// View models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct HitRow {
    entity_id: Option<String>,
    link: Option<String>,
    snippet: String,
    distance: Option<String>,
}

impl HitRow {
    fn new(kind: SearchKind, hit: &SearchHit) -> Self {
        let entity_id = hit.entity_id(kind.id_key());
        Self {
            link: entity_id.as_deref().map(|id| kind.link(id)),
            entity_id,
            snippet: snippet(hit.document.as_deref().unwrap_or_default()),
            distance: hit.distance.map(|d| format!("{d:.3}")),
        }
    }
}

fn snippet(document: &str) -> String {
    let document = document.trim();
    if document.chars().count() <= SNIPPET_CHARS {
        return document.to_string();
    }
    let cut: String = document.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}

#[derive(Debug, Serialize)]
struct SearchPage {
    kind: SearchKind,
    title: &'static str,
    action: &'static str,
    with_filters: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /resumes/search
pub async fn handle_search_resumes(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(form): Query<SearchForm>,
) -> Result<Response, AppError> {
    render_search(&state, &session, SearchKind::Resumes, form).await
}

/// GET /jobs/search
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(form): Query<SearchForm>,
) -> Result<Response, AppError> {
    render_search(&state, &session, SearchKind::Jobs, form).await
}

async fn render_search(
    state: &AppState,
    session: &Session,
    kind: SearchKind,
    form: SearchForm,
) -> Result<Response, AppError> {
    let mut status = StatusCode::OK;
    let mut errors = Vec::new();
    let mut hits = Vec::new();
    let mut search_error = None;
    let mut searched = false;

    match form.validate(kind.takes_filters()) {
        Err(field_errors) => {
            status = StatusCode::UNPROCESSABLE_ENTITY;
            errors = field_errors;
        }
        Ok(query) => {
            let outcome = {
                let _busy = state.activity.begin("semantic_search");
                match kind {
                    SearchKind::Resumes => state.api.search_resumes(&query).await,
                    SearchKind::Jobs => state.api.search_jobs(&query).await,
                }
            };
            match outcome {
                Ok(response) => {
                    searched = true;
                    hits = response
                        .hits()
                        .iter()
                        .map(|hit| HitRow::new(kind, hit))
                        .collect();
                    debug!(?kind, query = %query.query, hits = hits.len(), "search finished");
                }
                Err(e) => {
                    session
                        .notifications
                        .error(format!("Search failed: {e}"))
                        .await;
                    search_error = Some(e.to_string());
                }
            }
        }
    }

    let mut context = page_context(state, session, kind.tab()).await;
    context.insert(
        "page",
        &SearchPage {
            kind,
            title: kind.title(),
            action: kind.action(),
            with_filters: kind.takes_filters(),
        },
    );
    context.insert("search", &form);
    context.insert("search_errors", &errors);
    context.insert("searched", &searched);
    context.insert("search_error", &search_error);
    context.insert("hits", &hits);

    let html = state.templates.render("search.html", &context)?;
    Ok((status, html).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::api::fake::FakeApi;
    use crate::routes::testing::{get, session, test_state};
    use crate::shell::notifications::NotificationLevel;

    fn form(query: &str) -> SearchForm {
        SearchForm {
            query: query.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_query_needs_three_characters() {
        let errors = form(" ab ").validate(false).unwrap_err();
        assert_eq!(errors[0].field, "query");
        assert!(errors[0].message.contains("at least 3"));

        let query = form(" rust ").validate(false).unwrap();
        assert_eq!(query.query, "rust");
        assert_eq!(query.top_k, DEFAULT_TOP_K);
        // counts characters, not bytes
        assert!(form("日本語").validate(false).is_ok());
    }

    #[test]
    fn test_top_k_is_clamped() {
        let mut f = form("rust");
        f.top_k = Some("500".to_string());
        assert_eq!(f.top_k(), MAX_TOP_K);
        f.top_k = Some("0".to_string());
        assert_eq!(f.top_k(), 1);
        f.top_k = Some("ten".to_string());
        assert_eq!(f.top_k(), DEFAULT_TOP_K);
    }

    #[test]
    fn test_filters_must_be_a_json_object() {
        let mut f = form("rust");
        f.filters = Some("[1, 2]".to_string());
        let errors = f.validate(true).unwrap_err();
        assert_eq!(errors[0].field, "filters");

        f.filters = Some(r#"{"experience_level": "senior"}"#.to_string());
        let query = f.validate(true).unwrap();
        assert_eq!(query.filters.as_deref(), Some(r#"{"experience_level": "senior"}"#));

        // job search ignores them
        f.filters = Some("not json".to_string());
        assert!(f.validate(false).unwrap().filters.is_none());
    }

    #[test]
    fn test_long_documents_are_cut() {
        let long = "x".repeat(SNIPPET_CHARS + 10);
        let cut = snippet(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), SNIPPET_CHARS + 3);
        assert_eq!(snippet("  short  "), "short");
    }

    #[tokio::test]
    async fn test_short_query_never_reaches_backend() {
        let api = Arc::new(FakeApi::new());
        let state = test_state(api.clone());

        let response = get(&state, "/resumes/search?query=go").await;

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.body.contains("at least 3 characters"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_resume_search_lists_hits_with_analytics_links() {
        let api = Arc::new(FakeApi::new().with_search_hits(&[
            ("r-1", "Senior Rust engineer, 8 years", 0.12),
            ("r-2", "Go and Kubernetes", 0.4),
        ]));
        let state = test_state(api.clone());

        let response = get(&state, "/resumes/search?query=rust+engineer&top_k=1").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("Senior Rust engineer"));
        assert!(!response.body.contains("Kubernetes"));
        assert!(response.body.contains("r-1"));
        assert!(response.body.contains("analytics"));
        assert!(response.body.contains("0.120"));
        assert_eq!(api.calls(), vec!["GET /api/v2/search/resumes rust engineer"]);
    }

    #[tokio::test]
    async fn test_job_search_and_empty_result() {
        let api = Arc::new(FakeApi::new());
        let state = test_state(api.clone());

        let response = get(&state, "/jobs/search?query=data+platform").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("No results for data platform"));
        assert!(response.body.contains("class=\"active\">Jobs<"));
        assert_eq!(api.calls(), vec!["GET /api/v2/search/jobs data platform"]);
    }

    #[tokio::test]
    async fn test_backend_failure_is_reported() {
        let api = Arc::new(FakeApi::new());
        api.fail_next("/api/v2/search/jobs", "vector store unavailable");
        let state = test_state(api);

        let response = get(&state, "/jobs/search?query=backend").await;

        assert!(response
            .body
            .contains("Search failed: vector store unavailable"));
        let notes = session(&state).await.notifications.active().await;
        assert_eq!(notes[0].level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_panels_offer_search_forms() {
        let state = test_state(Arc::new(FakeApi::new()));
        let jobs = get(&state, "/jobs").await;
        assert!(jobs.body.contains("name=\"query\""));
        assert!(jobs.body.contains("minlength=\"3\""));
        assert!(!jobs.body.contains("name=\"filters\""));

        let resumes = get(&state, "/resumes").await;
        assert!(resumes.body.contains("name=\"filters\""));
    }
}
