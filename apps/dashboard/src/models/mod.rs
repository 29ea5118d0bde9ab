//! Wire types for the screening backend's JSON API.
//!
//! The dashboard mirrors backend state and never enforces the backend's
//! invariants itself. Enumerated strings are closed variants with an
//! `Unknown`/`Other` fallback so a new backend value degrades to a neutral
//! badge instead of a decode error.

pub mod analytics;
pub mod health;
pub mod job;
pub mod matching;
pub mod resume;
pub mod search;
pub mod timestamp;

pub use analytics::{
    AnalyticsOverview, BulkProcessing, PerformanceMetrics, PerformanceWindow, ResumeAnalytics,
    SkillCount,
};
pub use health::{HealthReport, HealthStatus};
pub use job::{CreateJobRequest, ExperienceLevel, Job, JobCreated, JobQuery, JobStatus, JobType};
pub use matching::{
    ConfidenceLevel, HistoricalMatch, Match, MatchHistory, MatchParams, Recommendation,
};
pub use resume::{ProcessingStatus, Resume, ResumeQuery, ResumeUpload, ResumeUploaded};
pub use search::{SearchHit, SearchQuery, SearchResponse};
