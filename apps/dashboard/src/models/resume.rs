use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::job::ExperienceLevel;
use crate::models::timestamp;

/// Processing and embedding lifecycle shared by resumes and jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }

    /// Badge color class for the status pill.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Completed => "green",
            Self::Processing => "blue",
            Self::Pending => "amber",
            Self::Failed => "red",
            Self::Unknown => "gray",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resume {
    #[serde(alias = "id")]
    pub resume_id: String,
    pub filename: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub embedding_status: ProcessingStatus,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub extracted_skills: Option<Vec<String>>,
    #[serde(default)]
    pub extracted_skills_count: Option<usize>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Resume {
    pub fn skill_count(&self) -> usize {
        self.extracted_skills_count
            .or_else(|| self.extracted_skills.as_ref().map(Vec::len))
            .unwrap_or(0)
    }

    /// Quality score (0–1) as a whole percentage, clamped.
    pub fn quality_percent(&self) -> Option<u32> {
        self.quality_score
            .map(|q| (q.clamp(0.0, 1.0) * 100.0).round() as u32)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeUploaded {
    pub resume_id: String,
    pub filename: String,
    pub status: String,
    pub message: String,
}

/// Query filters for `GET /api/v2/resumes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResumeQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// One file ready to be forwarded to `POST /api/v2/resumes/upload`.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_item_with_nulls() {
        let resume: Resume = serde_json::from_value(json!({
            "resume_id": "r1",
            "filename": "jane.pdf",
            "file_size": 2048,
            "file_type": null,
            "processing_status": "completed",
            "embedding_status": "processing",
            "quality_score": 0.876,
            "experience_level": null,
            "experience_years": null,
            "extracted_skills_count": 7,
            "created_at": "2024-05-01T10:00:00"
        }))
        .unwrap();

        assert_eq!(resume.processing_status, ProcessingStatus::Completed);
        assert_eq!(resume.embedding_status.color(), "blue");
        assert_eq!(resume.quality_percent(), Some(88));
        assert_eq!(resume.skill_count(), 7);
        assert!(resume.experience_level.is_none());
    }

    #[test]
    fn test_quality_percent_clamps() {
        let resume: Resume = serde_json::from_value(json!({
            "id": "r2",
            "filename": "x.txt",
            "quality_score": 1.7
        }))
        .unwrap();
        assert_eq!(resume.quality_percent(), Some(100));
        assert_eq!(resume.processing_status, ProcessingStatus::Pending);
    }
}
