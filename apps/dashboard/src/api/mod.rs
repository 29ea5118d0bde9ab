//! Screening backend client. Every call the dashboard makes to the REST API
//! goes through the `ScreeningApi` trait.
//!
//! `AppState` carries an `Arc<dyn ScreeningApi>`; production uses
//! `HttpScreeningApi`, tests swap in an in-memory fake.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    AnalyticsOverview, BulkProcessing, CreateJobRequest, HealthReport, Job, JobCreated, JobQuery,
    Match, MatchHistory, MatchParams, PerformanceMetrics, Resume, ResumeAnalytics, ResumeQuery,
    ResumeUpload, ResumeUploaded, SearchQuery, SearchResponse,
};

pub mod client;
#[cfg(test)]
pub mod fake;

pub use client::HttpScreeningApi;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx answer. `detail` is what the user sees, verbatim.
    #[error("{detail}")]
    Backend { status: u16, detail: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from backend: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ScreeningApi: Send + Sync {
    /// `GET /health`
    async fn health(&self) -> Result<HealthReport, ApiError>;

    /// `GET /health/detailed`
    async fn health_detailed(&self) -> Result<HealthReport, ApiError>;

    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, ApiError>;

    async fn get_job(&self, job_id: &str) -> Result<Job, ApiError>;

    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobCreated, ApiError>;

    async fn list_resumes(&self, query: &ResumeQuery) -> Result<Vec<Resume>, ApiError>;

    /// Uploads one file. `progress` advances as body chunks are handed to the
    /// transport.
    async fn upload_resume(
        &self,
        upload: ResumeUpload,
        progress: UploadProgress,
    ) -> Result<ResumeUploaded, ApiError>;

    async fn find_matches(&self, params: &MatchParams) -> Result<Vec<Match>, ApiError>;

    async fn match_history(&self, job_id: &str) -> Result<MatchHistory, ApiError>;

    async fn analytics_overview(&self) -> Result<AnalyticsOverview, ApiError>;

    async fn resume_analytics(&self, resume_id: &str) -> Result<ResumeAnalytics, ApiError>;

    async fn performance_metrics(&self) -> Result<PerformanceMetrics, ApiError>;

    async fn process_pending(&self) -> Result<BulkProcessing, ApiError>;

    /// `GET /api/v2/search/resumes`
    async fn search_resumes(&self, query: &SearchQuery) -> Result<SearchResponse, ApiError>;

    /// `GET /api/v2/search/jobs`
    async fn search_jobs(&self, query: &SearchQuery) -> Result<SearchResponse, ApiError>;

    /// Absolute URL of a resume's processing-status document. The dashboard
    /// links to it and never parses it.
    fn resume_status_url(&self, resume_id: &str) -> String;
}

/// Shared byte counter for one in-flight upload.
#[derive(Debug, Clone)]
pub struct UploadProgress {
    sent: Arc<AtomicU64>,
    total: u64,
}

impl UploadProgress {
    pub fn new(total: u64) -> Self {
        Self {
            sent: Arc::new(AtomicU64::new(0)),
            total,
        }
    }

    pub fn advance(&self, bytes: u64) {
        self.sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed).min(self.total)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.sent() as f64 / self.total as f64) * 100.0).round() as u32
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// Pulls the user-facing message out of a FastAPI error body.
///
/// `{"detail": "..."}` yields the string verbatim; request-validation bodies
/// (`{"detail": [{"loc": [...], "msg": "..."}]}`) are flattened to
/// `field: msg` pairs joined by `; `. Anything else yields `None`.
pub fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail),
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| {
                    let msg = item.get("msg")?.as_str()?;
                    let field = item
                        .get("loc")
                        .and_then(Value::as_array)
                        .and_then(|loc| loc.iter().rev().find_map(Value::as_str))
                        .filter(|field| *field != "body");
                    Some(match field {
                        Some(field) => format!("{field}: {msg}"),
                        None => msg.to_string(),
                    })
                })
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_detail_string() {
        let body = r#"{"detail": "Job not found"}"#;
        assert_eq!(extract_detail(body).as_deref(), Some("Job not found"));
    }

    #[test]
    fn test_extract_detail_validation_list() {
        let body = r#"{"detail": [
            {"loc": ["body", "title"], "msg": "Field cannot be empty", "type": "value_error"},
            {"loc": ["body", "requirements"], "msg": "At least one item required", "type": "value_error"}
        ]}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("title: Field cannot be empty; requirements: At least one item required")
        );
    }

    #[test]
    fn test_extract_detail_not_json() {
        assert!(extract_detail("<html>Bad Gateway</html>").is_none());
        assert!(extract_detail(r#"{"error": "x"}"#).is_none());
    }

    #[test]
    fn test_backend_error_displays_detail_verbatim() {
        let err = ApiError::Backend {
            status: 500,
            detail: "duplicate key value violates unique constraint".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_upload_progress_percent() {
        let progress = UploadProgress::new(200);
        assert_eq!(progress.percent(), 0);
        progress.advance(50);
        assert_eq!(progress.percent(), 25);
        progress.advance(500);
        assert_eq!(progress.sent(), 200);
        assert_eq!(progress.percent(), 100);
        assert_eq!(UploadProgress::new(0).percent(), 0);
    }
}
