use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::health::HealthStatus;
use crate::models::job::ExperienceLevel;
use crate::models::resume::ProcessingStatus;
use crate::models::timestamp;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCount {
    pub skill: String,
    pub count: u64,
}

/// `GET /api/v2/analytics/overview`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsOverview {
    #[serde(default)]
    pub total_jobs: u64,
    #[serde(default)]
    pub total_resumes: u64,
    #[serde(default)]
    pub total_matches: u64,
    #[serde(default)]
    pub resume_status_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub job_status_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_skills: Vec<SkillCount>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceWindow {
    #[serde(default)]
    pub total_operations: u64,
    #[serde(default)]
    pub successful_operations: u64,
    #[serde(default)]
    pub failed_operations: u64,
    #[serde(default)]
    pub average_processing_time: f64,
    #[serde(default)]
    pub max_processing_time: f64,
    #[serde(default)]
    pub min_processing_time: f64,
}

/// `GET /api/v2/performance/metrics`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    #[serde(default)]
    pub last_24_hours: PerformanceWindow,
    #[serde(default)]
    pub system_status: HealthStatus,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// `GET /api/v2/analytics/resume/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeAnalytics {
    pub resume_id: String,
    pub filename: String,
    #[serde(default)]
    pub total_matches: u64,
    #[serde(default)]
    pub average_score: f64,
    #[serde(default)]
    pub best_score: f64,
    #[serde(default)]
    pub skill_frequency: BTreeMap<String, u64>,
    #[serde(default)]
    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub extracted_skills: Option<Vec<String>>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `POST /api/v2/bulk/process-pending`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkProcessing {
    pub message: String,
    #[serde(default)]
    pub pending_resumes: u64,
    #[serde(default)]
    pub pending_jobs: u64,
    #[serde(default)]
    pub total_tasks: u64,
}
