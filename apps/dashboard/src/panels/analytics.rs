//! Analytics panel: aggregate counts, distributions, top skills and the
//! last-24h processing metrics.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::{
    timestamp, AnalyticsOverview, JobStatus, PerformanceMetrics, ProcessingStatus, SkillCount,
};
use crate::panels::jobs::job_status_color;
use crate::panels::{bar_width, format_percent, percentage};
use crate::shell::session::Session;
use crate::shell::{page_context, Tab};
use crate::state::AppState;

/// Matches per resume as a percentage, capped at 100.
pub fn match_rate(overview: &AnalyticsOverview) -> f64 {
    percentage(overview.total_matches, overview.total_resumes).min(100.0)
}

pub fn success_rate(metrics: &PerformanceMetrics) -> f64 {
    let window = &metrics.last_24_hours;
    percentage(window.successful_operations, window.total_operations)
}

/// Distribution keys are backend status strings; unknown ones land on the
/// enum's fallback variant.
fn status_from_key<T: DeserializeOwned + Default>(key: &str) -> T {
    serde_json::from_value(serde_json::Value::String(key.to_string())).unwrap_or_default()
}

#[derive(Debug, Serialize)]
struct DistributionBar {
    status: String,
    color: &'static str,
    count: u64,
    percent: String,
    width: f64,
}

fn distribution_bars(
    distribution: &BTreeMap<String, u64>,
    total: u64,
    color: impl Fn(&str) -> &'static str,
) -> Vec<DistributionBar> {
    distribution
        .iter()
        .map(|(status, count)| {
            let share = percentage(*count, total);
            DistributionBar {
                status: status.clone(),
                color: color(status),
                count: *count,
                percent: format_percent(share),
                width: bar_width(share),
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct SkillBar {
    skill: String,
    count: u64,
    width: f64,
}

/// Top skills with widths relative to the most frequent one.
fn skill_bars(top_skills: &[SkillCount]) -> Vec<SkillBar> {
    let max = top_skills.iter().map(|s| s.count).max().unwrap_or(0);
    top_skills
        .iter()
        .map(|s| SkillBar {
            skill: s.skill.clone(),
            count: s.count,
            width: bar_width(percentage(s.count, max)),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct OverviewView {
    total_jobs: u64,
    total_resumes: u64,
    total_matches: u64,
    match_rate: String,
    match_rate_width: f64,
    resume_statuses: Vec<DistributionBar>,
    job_statuses: Vec<DistributionBar>,
    top_skills: Vec<SkillBar>,
    generated: String,
}

impl From<&AnalyticsOverview> for OverviewView {
    fn from(overview: &AnalyticsOverview) -> Self {
        let rate = match_rate(overview);
        Self {
            total_jobs: overview.total_jobs,
            total_resumes: overview.total_resumes,
            total_matches: overview.total_matches,
            match_rate: format_percent(rate),
            match_rate_width: bar_width(rate),
            resume_statuses: distribution_bars(
                &overview.resume_status_distribution,
                overview.total_resumes,
                |key| status_from_key::<ProcessingStatus>(key).color(),
            ),
            job_statuses: distribution_bars(
                &overview.job_status_distribution,
                overview.total_jobs,
                |key| job_status_color(status_from_key::<JobStatus>(key)),
            ),
            top_skills: skill_bars(&overview.top_skills),
            generated: timestamp::display(overview.generated_at),
        }
    }
}

#[derive(Debug, Serialize)]
struct MetricsView {
    total_operations: u64,
    successful_operations: u64,
    failed_operations: u64,
    success_rate: String,
    success_width: f64,
    average_time: String,
    max_time: String,
    min_time: String,
    system_status: &'static str,
    system_color: &'static str,
    measured: String,
}

impl From<&PerformanceMetrics> for MetricsView {
    fn from(metrics: &PerformanceMetrics) -> Self {
        let window = &metrics.last_24_hours;
        let rate = success_rate(metrics);
        Self {
            total_operations: window.total_operations,
            successful_operations: window.successful_operations,
            failed_operations: window.failed_operations,
            success_rate: format_percent(rate),
            success_width: bar_width(rate),
            average_time: format!("{:.2}s", window.average_processing_time),
            max_time: format!("{:.2}s", window.max_processing_time),
            min_time: format!("{:.2}s", window.min_processing_time),
            system_status: metrics.system_status.as_str(),
            system_color: metrics.system_status.color(),
            measured: timestamp::display(metrics.timestamp),
        }
    }
}

/// GET /analytics
///
/// Both halves load concurrently; either can fail on its own and is then
/// replaced by a placeholder carrying the error.
pub async fn handle_analytics(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppError> {
    let (overview, metrics) = tokio::join!(
        state.api.analytics_overview(),
        state.api.performance_metrics()
    );

    let (overview, overview_error) = match overview {
        Ok(overview) => (Some(OverviewView::from(&overview)), None),
        Err(e) => {
            session
                .notifications
                .warning(format!("Analytics overview unavailable: {e}"))
                .await;
            (None, Some(e.to_string()))
        }
    };

    let (metrics, metrics_error) = match metrics {
        Ok(metrics) => (Some(MetricsView::from(&metrics)), None),
        Err(e) => {
            session
                .notifications
                .warning(format!("Performance metrics unavailable: {e}"))
                .await;
            (None, Some(e.to_string()))
        }
    };

    let mut context = page_context(&state, &session, Tab::Analytics).await;
    context.insert("overview", &overview);
    context.insert("overview_error", &overview_error);
    context.insert("metrics", &metrics);
    context.insert("metrics_error", &metrics_error);
    Ok(state.templates.render("analytics.html", &context)?.into_response())
}

/// POST /analytics/process-pending
pub async fn handle_process_pending(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppError> {
    let outcome = {
        let _busy = state.activity.begin("process_pending");
        state.api.process_pending().await
    };

    match outcome {
        Ok(queued) => {
            info!(
                resumes = queued.pending_resumes,
                jobs = queued.pending_jobs,
                "Bulk processing queued"
            );
            session
                .notifications
                .success(format!(
                    "{}: {} resumes and {} jobs queued ({} tasks)",
                    queued.message, queued.pending_resumes, queued.pending_jobs, queued.total_tasks
                ))
                .await;
        }
        Err(e) => {
            session
                .notifications
                .error(format!("Failed to start bulk processing: {e}"))
                .await;
        }
    }

    Ok(Redirect::to(Tab::Analytics.path()).into_response())
}
