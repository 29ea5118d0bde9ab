use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::job::ExperienceLevel;
use crate::models::timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ConfidenceLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low confidence",
            Self::Medium => "Medium confidence",
            Self::High => "High confidence",
            Self::Unknown => "Confidence n/a",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StronglyRecommended,
    Recommended,
    Consider,
    NotRecommended,
    #[default]
    #[serde(other)]
    Other,
}

/// A ranked match returned by `POST /api/v2/match/advanced`.
/// Scores are percentages (0–100).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub resume_id: String,
    #[serde(default)]
    pub filename: String,
    pub overall_score: f64,
    #[serde(default)]
    pub skill_match_score: f64,
    #[serde(default)]
    pub experience_match_score: f64,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub confidence_level: ConfidenceLevel,
    #[serde(default)]
    pub recommendation: Recommendation,
}

/// Parameters of a ranked match request. `min_score` is the fraction
/// (0–1) the backend expects; the UI works in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchParams {
    pub job_id: String,
    pub top_k: u32,
    pub min_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_filter: Option<ExperienceLevel>,
}

/// A match persisted by the backend, from `GET /api/v2/match/history/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalMatch {
    pub resume_id: String,
    pub overall_score: f64,
    #[serde(default)]
    pub skill_match_score: Option<f64>,
    #[serde(default)]
    pub experience_match_score: Option<f64>,
    #[serde(default)]
    pub matched_skills: Option<Vec<String>>,
    #[serde(default)]
    pub missing_skills: Option<Vec<String>>,
    #[serde(default)]
    pub confidence_level: Option<ConfidenceLevel>,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The history endpoint answers `{message, matches: []}` when nothing is
/// stored, and `{job_id, total_matches, matches}` otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchHistory {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub total_matches: usize,
    #[serde(default)]
    pub matches: Vec<HistoricalMatch>,
    #[serde(default)]
    pub message: Option<String>,
}
