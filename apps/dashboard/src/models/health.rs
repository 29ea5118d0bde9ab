use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    #[default]
    #[serde(other)]
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
            Self::Unknown => "unknown",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Healthy => "green",
            Self::Degraded => "amber",
            Self::Unhealthy => "red",
            Self::Unknown => "gray",
        }
    }
}

/// Body of `GET /health` and `GET /health/detailed`. The basic check only
/// fills `status`, `service` and `version`; the detailed one adds per-service
/// states and a timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub status: HealthStatus,
    #[serde(default)]
    pub services: BTreeMap<String, String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detailed_report() {
        let report: HealthReport = serde_json::from_value(json!({
            "status": "degraded",
            "timestamp": "2024-05-01T10:00:00",
            "services": {"database": "healthy", "job_service": "not_initialized"}
        }))
        .unwrap();

        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.services.len(), 2);
        assert_eq!(report.status.color(), "amber");
    }

    #[test]
    fn test_basic_health_body() {
        let report: HealthReport = serde_json::from_value(json!({
            "status": "healthy",
            "service": "smart-resume-screening-api",
            "version": "2.0.0"
        }))
        .unwrap();

        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.services.is_empty());
    }
}
