//! In-memory stand-in for the screening backend, used by handler tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{ApiError, ScreeningApi, UploadProgress};
use crate::models::{
    AnalyticsOverview, BulkProcessing, CreateJobRequest, HealthReport, HealthStatus, Job,
    JobCreated, JobQuery, Match, MatchHistory, MatchParams, PerformanceMetrics, ProcessingStatus,
    Resume, ResumeAnalytics, ResumeQuery, ResumeUpload, ResumeUploaded, SearchQuery,
    SearchResponse,
};

#[derive(Default)]
pub struct FakeState {
    pub jobs: Vec<Job>,
    pub resumes: Vec<Resume>,
    pub matches: Vec<Match>,
    pub overview: Option<AnalyticsOverview>,
    pub metrics: Option<PerformanceMetrics>,
    /// Every call, in order, as `"METHOD path"`.
    pub calls: Vec<String>,
    /// Queued failures, consumed by the next call whose path starts with the key.
    pub failures: VecDeque<(String, ApiError)>,
    /// Per-job artificial latency for match requests.
    pub match_delays: Vec<(String, Duration)>,
    /// Artificial latency for every upload.
    pub upload_delay: Option<Duration>,
    pub uploaded: Vec<String>,
    /// `(id, document, distance)` rows returned by both search endpoints.
    pub search_hits: Vec<(String, String, f64)>,
}

#[derive(Default)]
pub struct FakeApi {
    pub state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(self, jobs: Vec<Job>) -> Self {
        self.state.lock().unwrap().jobs = jobs;
        self
    }

    pub fn with_matches(self, matches: Vec<Match>) -> Self {
        self.state.lock().unwrap().matches = matches;
        self
    }

    pub fn fail_next(&self, path_prefix: &str, detail: &str) {
        self.state.lock().unwrap().failures.push_back((
            path_prefix.to_string(),
            ApiError::Backend {
                status: 500,
                detail: detail.to_string(),
            },
        ));
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn with_search_hits(self, hits: &[(&str, &str, f64)]) -> Self {
        self.state.lock().unwrap().search_hits = hits
            .iter()
            .map(|(id, doc, distance)| (id.to_string(), doc.to_string(), *distance))
            .collect();
        self
    }

    fn search_response(&self, query: &SearchQuery, id_key: &str) -> SearchResponse {
        let state = self.state.lock().unwrap();
        let hits: Vec<_> = state.search_hits.iter().take(query.top_k as usize).collect();
        serde_json::from_value(serde_json::json!({
            "query": query.query,
            "total_results": hits.len(),
            "results": {
                "ids": [hits.iter().map(|(id, _, _)| format!("{id}_chunk_0")).collect::<Vec<_>>()],
                "documents": [hits.iter().map(|(_, doc, _)| doc).collect::<Vec<_>>()],
                "metadatas": [hits.iter().map(|(id, _, _)| serde_json::json!({ id_key: id })).collect::<Vec<_>>()],
                "distances": [hits.iter().map(|(_, _, d)| d).collect::<Vec<_>>()]
            }
        }))
        .unwrap()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let path = call.split_whitespace().nth(1).unwrap_or_default().to_string();
        state.calls.push(call);
        if let Some(pos) = state
            .failures
            .iter()
            .position(|(prefix, _)| path.starts_with(prefix.as_str()))
        {
            if let Some((_, err)) = state.failures.remove(pos) {
                return Err(err);
            }
        }
        Ok(())
    }
}

pub fn job(id: &str, title: &str, embedding_status: ProcessingStatus) -> Job {
    serde_json::from_value(serde_json::json!({
        "job_id": id,
        "title": title,
        "company": "Acme",
        "location": "Remote",
        "experience_level": "mid",
        "job_type": "full_time",
        "remote_allowed": true,
        "status": "active",
        "embedding_status": embedding_status.as_str(),
        "required_skills_count": 2,
        "created_at": "2024-05-01T10:00:00"
    }))
    .unwrap()
}

pub fn scored_match(resume_id: &str, overall_score: f64) -> Match {
    serde_json::from_value(serde_json::json!({
        "resume_id": resume_id,
        "filename": format!("{resume_id}.pdf"),
        "overall_score": overall_score,
        "skill_match_score": overall_score,
        "experience_match_score": overall_score,
        "matched_skills": ["rust"],
        "missing_skills": ["kafka"],
        "explanation": "fits",
        "confidence_level": "high",
        "recommendation": "recommended"
    }))
    .unwrap()
}

#[async_trait]
impl ScreeningApi for FakeApi {
    async fn health(&self) -> Result<HealthReport, ApiError> {
        self.record("GET /health".to_string())?;
        Ok(HealthReport {
            status: HealthStatus::Healthy,
            ..Default::default()
        })
    }

    async fn health_detailed(&self) -> Result<HealthReport, ApiError> {
        self.record("GET /health/detailed".to_string())?;
        Ok(HealthReport {
            status: HealthStatus::Healthy,
            ..Default::default()
        })
    }

    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, ApiError> {
        self.record("GET /api/v2/jobs".to_string())?;
        let state = self.state.lock().unwrap();
        Ok(state
            .jobs
            .iter()
            .filter(|j| {
                query
                    .company
                    .as_deref()
                    .map_or(true, |c| j.company.to_lowercase().contains(&c.to_lowercase()))
            })
            .cloned()
            .collect())
    }

    async fn get_job(&self, job_id: &str) -> Result<Job, ApiError> {
        self.record(format!("GET /api/v2/jobs/{job_id}"))?;
        let state = self.state.lock().unwrap();
        state
            .jobs
            .iter()
            .find(|j| j.job_id == job_id)
            .cloned()
            .ok_or(ApiError::Backend {
                status: 404,
                detail: "Job not found".to_string(),
            })
    }

    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobCreated, ApiError> {
        self.record("POST /api/v2/jobs".to_string())?;
        let mut state = self.state.lock().unwrap();
        let job_id = format!("job-{}", state.jobs.len() + 1);
        let mut created = job(&job_id, &request.title, ProcessingStatus::Pending);
        created.company = request.company.clone();
        created.location = Some(request.location.clone());
        state.jobs.push(created);
        Ok(JobCreated {
            job_id,
            status: "created".to_string(),
            message: "Job created successfully and is being processed".to_string(),
        })
    }

    async fn list_resumes(&self, _query: &ResumeQuery) -> Result<Vec<Resume>, ApiError> {
        self.record("GET /api/v2/resumes".to_string())?;
        Ok(self.state.lock().unwrap().resumes.clone())
    }

    async fn upload_resume(
        &self,
        upload: ResumeUpload,
        progress: UploadProgress,
    ) -> Result<ResumeUploaded, ApiError> {
        self.record("POST /api/v2/resumes/upload".to_string())?;
        let delay = self.state.lock().unwrap().upload_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        progress.advance(upload.data.len() as u64);
        let mut state = self.state.lock().unwrap();
        state.uploaded.push(upload.filename.clone());
        Ok(ResumeUploaded {
            resume_id: format!("resume-{}", state.uploaded.len()),
            filename: upload.filename,
            status: "uploaded".to_string(),
            message: "Resume uploaded successfully and is being processed".to_string(),
        })
    }

    async fn find_matches(&self, params: &MatchParams) -> Result<Vec<Match>, ApiError> {
        self.record(format!("POST /api/v2/match/advanced {}", params.job_id))?;
        let delay = self
            .state
            .lock()
            .unwrap()
            .match_delays
            .iter()
            .find(|(job_id, _)| *job_id == params.job_id)
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .matches
            .iter()
            .filter(|m| m.overall_score >= params.min_score * 100.0)
            .take(params.top_k as usize)
            .cloned()
            .collect())
    }

    async fn match_history(&self, job_id: &str) -> Result<MatchHistory, ApiError> {
        self.record(format!("GET /api/v2/match/history/{job_id}"))?;
        Ok(MatchHistory {
            job_id: Some(job_id.to_string()),
            ..Default::default()
        })
    }

    async fn analytics_overview(&self) -> Result<AnalyticsOverview, ApiError> {
        self.record("GET /api/v2/analytics/overview".to_string())?;
        Ok(self.state.lock().unwrap().overview.clone().unwrap_or_default())
    }

    async fn resume_analytics(&self, resume_id: &str) -> Result<ResumeAnalytics, ApiError> {
        self.record(format!("GET /api/v2/analytics/resume/{resume_id}"))?;
        serde_json::from_value(serde_json::json!({
            "resume_id": resume_id,
            "filename": format!("{resume_id}.pdf"),
            "total_matches": 2,
            "average_score": 71.5,
            "best_score": 90.0,
            "skill_frequency": {"rust": 2},
            "processing_status": "completed",
            "quality_score": 0.9
        }))
        .map_err(ApiError::from)
    }

    async fn performance_metrics(&self) -> Result<PerformanceMetrics, ApiError> {
        self.record("GET /api/v2/performance/metrics".to_string())?;
        Ok(self.state.lock().unwrap().metrics.clone().unwrap_or_default())
    }

    async fn process_pending(&self) -> Result<BulkProcessing, ApiError> {
        self.record("POST /api/v2/bulk/process-pending".to_string())?;
        Ok(BulkProcessing {
            message: "Bulk processing initiated".to_string(),
            pending_resumes: 2,
            pending_jobs: 1,
            total_tasks: 3,
        })
    }

    async fn search_resumes(&self, query: &SearchQuery) -> Result<SearchResponse, ApiError> {
        self.record(format!("GET /api/v2/search/resumes {}", query.query))?;
        Ok(self.search_response(query, "resume_id"))
    }

    async fn search_jobs(&self, query: &SearchQuery) -> Result<SearchResponse, ApiError> {
        self.record(format!("GET /api/v2/search/jobs {}", query.query))?;
        Ok(self.search_response(query, "job_id"))
    }

    fn resume_status_url(&self, resume_id: &str) -> String {
        format!("http://backend.test/api/v2/resumes/{resume_id}/status")
    }
}
