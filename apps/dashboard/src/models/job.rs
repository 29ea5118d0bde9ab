use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::resume::ProcessingStatus;
use crate::models::timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    #[default]
    Mid,
    Senior,
    Lead,
    #[serde(other)]
    Unknown,
}

impl ExperienceLevel {
    /// Selectable levels, in seniority order.
    pub const ALL: [ExperienceLevel; 4] = [
        ExperienceLevel::Entry,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
        ExperienceLevel::Lead,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "entry" => Some(Self::Entry),
            "mid" => Some(Self::Mid),
            "senior" => Some(Self::Senior),
            "lead" => Some(Self::Lead),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Mid => "mid",
            Self::Senior => "senior",
            Self::Lead => "lead",
            Self::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Entry => "Entry Level",
            Self::Mid => "Mid Level",
            Self::Senior => "Senior Level",
            Self::Lead => "Lead / Principal",
            Self::Unknown => "Unspecified",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Remote,
    #[serde(other)]
    Unknown,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Contract,
        JobType::Remote,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "full_time" => Some(Self::FullTime),
            "part_time" => Some(Self::PartTime),
            "contract" => Some(Self::Contract),
            "remote" => Some(Self::Remote),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullTime => "full_time",
            Self::PartTime => "part_time",
            Self::Contract => "contract",
            Self::Remote => "remote",
            Self::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FullTime => "Full-time",
            Self::PartTime => "Part-time",
            Self::Contract => "Contract",
            Self::Remote => "Remote",
            Self::Unknown => "Other",
        }
    }
}

/// Lifecycle status of a posting. The backend only ever writes `active`
/// today; anything else is shown as-is through the fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Active,
    Inactive,
    Closed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

fn default_priority() -> i32 {
    1
}

/// A job posting as returned by both the list endpoint (`job_id`, skill
/// count only) and the detail endpoint (`id`, full text fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(alias = "id")]
    pub job_id: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<Vec<String>>,
    #[serde(default)]
    pub required_skills: Option<Vec<String>>,
    #[serde(default)]
    pub required_skills_count: Option<usize>,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub job_type: JobType,
    #[serde(default)]
    pub remote_allowed: bool,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub embedding_status: ProcessingStatus,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn skill_count(&self) -> usize {
        self.required_skills_count
            .or_else(|| self.required_skills.as_ref().map(Vec::len))
            .unwrap_or(0)
    }

    /// Only postings with a computed embedding can be matched against.
    pub fn is_ready_for_matching(&self) -> bool {
        self.embedding_status == ProcessingStatus::Completed
    }
}

/// Body of `POST /api/v2/jobs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub required_skills: Vec<String>,
    pub experience_level: ExperienceLevel,
    pub location: String,
    pub salary_range: Option<String>,
    pub department: Option<String>,
    pub job_type: JobType,
    pub remote_allowed: bool,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreated {
    pub job_id: String,
    pub status: String,
    pub message: String,
}

/// Query filters for `GET /api/v2/jobs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}
