use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{extract_detail, ApiError, ScreeningApi, UploadProgress};
use crate::models::{
    AnalyticsOverview, BulkProcessing, CreateJobRequest, HealthReport, Job, JobCreated, JobQuery,
    Match, MatchHistory, MatchParams, PerformanceMetrics, Resume, ResumeAnalytics, ResumeQuery,
    ResumeUpload, ResumeUploaded, SearchQuery, SearchResponse,
};

const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;
/// Raw error bodies longer than this are replaced by the status line.
const MAX_RAW_DETAIL_LEN: usize = 500;

/// reqwest-backed client for the screening backend.
#[derive(Clone)]
pub struct HttpScreeningApi {
    client: Client,
    base_url: Url,
}

impl HttpScreeningApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Appends `segments` to the base URL. Each segment is percent-encoded,
    /// so an id containing `/`, `?` or `#` stays inside its own segment.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request and decodes a 2xx JSON body. Non-2xx answers become
    /// `ApiError::Backend` carrying the backend's own error detail.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Backend request failed");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let path = response.url().path().to_string();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = extract_detail(&body).unwrap_or_else(|| fallback_detail(status, &body));
            warn!(%status, %path, %detail, "Backend returned an error");
            return Err(ApiError::Backend {
                status: status.as_u16(),
                detail,
            });
        }

        let body = response.bytes().await?;
        debug!(%status, %path, bytes = body.len(), "Backend call succeeded");
        Ok(serde_json::from_slice(&body)?)
    }
}

fn fallback_detail(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if !body.is_empty() && body.len() <= MAX_RAW_DETAIL_LEN {
        return body.to_string();
    }
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => format!("Request failed with status {}", status.as_u16()),
    }
}

/// Streams the file in fixed-size chunks so `progress` tracks what the
/// transport has actually pulled.
fn upload_body(data: Bytes, progress: UploadProgress) -> Body {
    let len = data.len();
    let chunks: Vec<Result<Bytes, std::io::Error>> = (0..len)
        .step_by(UPLOAD_CHUNK_BYTES)
        .map(|start| Ok(data.slice(start..(start + UPLOAD_CHUNK_BYTES).min(len))))
        .collect();

    let stream = futures::stream::iter(chunks).inspect(move |chunk| {
        if let Ok(chunk) = chunk {
            progress.advance(chunk.len() as u64);
        }
    });

    Body::wrap_stream(stream)
}

#[async_trait]
impl ScreeningApi for HttpScreeningApi {
    async fn health(&self) -> Result<HealthReport, ApiError> {
        self.send(self.client.get(self.url(&["health"])?)).await
    }

    async fn health_detailed(&self) -> Result<HealthReport, ApiError> {
        self.send(self.client.get(self.url(&["health", "detailed"])?))
            .await
    }

    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, ApiError> {
        self.send(self.client.get(self.url(&["api", "v2", "jobs"])?).query(query))
            .await
    }

    async fn get_job(&self, job_id: &str) -> Result<Job, ApiError> {
        self.send(self.client.get(self.url(&["api", "v2", "jobs", job_id])?))
            .await
    }

    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobCreated, ApiError> {
        self.send(self.client.post(self.url(&["api", "v2", "jobs"])?).json(request))
            .await
    }

    async fn list_resumes(&self, query: &ResumeQuery) -> Result<Vec<Resume>, ApiError> {
        self.send(self.client.get(self.url(&["api", "v2", "resumes"])?).query(query))
            .await
    }

    async fn upload_resume(
        &self,
        upload: ResumeUpload,
        progress: UploadProgress,
    ) -> Result<ResumeUploaded, ApiError> {
        let total = upload.data.len() as u64;
        let mut part = Part::stream_with_length(upload_body(upload.data, progress), total)
            .file_name(upload.filename);
        if let Some(content_type) = upload.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("file", part);

        self.send(
            self.client
                .post(self.url(&["api", "v2", "resumes", "upload"])?)
                .multipart(form),
        )
        .await
    }

    async fn find_matches(&self, params: &MatchParams) -> Result<Vec<Match>, ApiError> {
        self.send(
            self.client
                .post(self.url(&["api", "v2", "match", "advanced"])?)
                .query(params),
        )
        .await
    }

    async fn match_history(&self, job_id: &str) -> Result<MatchHistory, ApiError> {
        self.send(
            self.client
                .get(self.url(&["api", "v2", "match", "history", job_id])?),
        )
        .await
    }

    async fn analytics_overview(&self) -> Result<AnalyticsOverview, ApiError> {
        self.send(self.client.get(self.url(&["api", "v2", "analytics", "overview"])?))
            .await
    }

    async fn resume_analytics(&self, resume_id: &str) -> Result<ResumeAnalytics, ApiError> {
        self.send(
            self.client
                .get(self.url(&["api", "v2", "analytics", "resume", resume_id])?),
        )
        .await
    }

    async fn performance_metrics(&self) -> Result<PerformanceMetrics, ApiError> {
        self.send(self.client.get(self.url(&["api", "v2", "performance", "metrics"])?))
            .await
    }

    async fn process_pending(&self) -> Result<BulkProcessing, ApiError> {
        self.send(self.client.post(self.url(&["api", "v2", "bulk", "process-pending"])?))
            .await
    }

    async fn search_resumes(&self, query: &SearchQuery) -> Result<SearchResponse, ApiError> {
        self.send(
            self.client
                .get(self.url(&["api", "v2", "search", "resumes"])?)
                .query(query),
        )
        .await
    }

    async fn search_jobs(&self, query: &SearchQuery) -> Result<SearchResponse, ApiError> {
        self.send(
            self.client
                .get(self.url(&["api", "v2", "search", "jobs"])?)
                .query(query),
        )
        .await
    }

    fn resume_status_url(&self, resume_id: &str) -> String {
        match self.url(&["api", "v2", "resumes", resume_id, "status"]) {
            Ok(url) => url.to_string(),
            Err(_) => self.base_url.to_string(),
        }
    }
}
