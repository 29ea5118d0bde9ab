//! Matching panel: ranked candidates for one job.
//!
//! Match requests go through a [`LatestOnly`] store keyed by the selection
//! that triggered them, so a slow response for an earlier selection can
//! never replace the results of a newer one.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{
    timestamp, ExperienceLevel, Job, JobQuery, Match, MatchHistory, MatchParams, ProcessingStatus,
    Recommendation,
};
use crate::panels::{bar_width, non_blank};
use crate::shell::request_gate::LatestOnly;
use crate::shell::session::Session;
use crate::shell::{page_context, Tab};
use crate::state::AppState;

pub const DEFAULT_TOP_K: u32 = 10;
pub const MAX_TOP_K: u32 = 50;
const JOB_PICKER_LIMIT: u32 = 100;

/// What the user asked to match. `min_score_percent` is what the form shows;
/// [`MatchSelection::params`] converts it to the backend's fraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSelection {
    pub job_id: String,
    pub top_k: u32,
    pub min_score_percent: u32,
    pub experience_filter: Option<ExperienceLevel>,
}

impl MatchSelection {
    pub fn params(&self) -> MatchParams {
        MatchParams {
            job_id: self.job_id.clone(),
            top_k: self.top_k,
            min_score: f64::from(self.min_score_percent) / 100.0,
            experience_filter: self.experience_filter,
        }
    }
}

pub type MatchingStore = LatestOnly<MatchSelection, Vec<Match>>;

/// Query string of `GET /matching`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchForm {
    pub job_id: Option<String>,
    pub top_k: Option<String>,
    pub min_score: Option<String>,
    pub experience_filter: Option<String>,
    /// Any value asks for the stored match history below the live results.
    pub history: Option<String>,
}

impl MatchForm {
    /// `None` until a job is chosen. Out-of-range numbers are clamped,
    /// unparsable ones fall back to the defaults.
    pub fn selection(&self) -> Option<MatchSelection> {
        let job_id = non_blank(self.job_id.as_deref())?;

        let top_k = self
            .top_k
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_TOP_K)
            .clamp(1, MAX_TOP_K);

        let min_score_percent = self
            .min_score
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|score| score.is_finite())
            .map(|score| score.clamp(0.0, 100.0).round() as u32)
            .unwrap_or(0);

        let experience_filter = self
            .experience_filter
            .as_deref()
            .and_then(ExperienceLevel::parse);

        Some(MatchSelection {
            job_id,
            top_k,
            min_score_percent,
            experience_filter,
        })
    }
}

/// Only jobs whose embeddings are computed can be matched.
pub fn ready_jobs(jobs: Vec<Job>) -> Vec<Job> {
    jobs.into_iter()
        .filter(|job| job.embedding_status == ProcessingStatus::Completed)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Badges
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::Strong
        } else if score >= 60.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Weak
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ScoreBand::Strong => "green",
            ScoreBand::Fair => "amber",
            ScoreBand::Weak => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecommendationBadge {
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

pub fn recommendation_badge(recommendation: Recommendation) -> RecommendationBadge {
    let (label, color, icon) = match recommendation {
        Recommendation::StronglyRecommended => ("Strongly recommended", "green", "★"),
        Recommendation::Recommended => ("Recommended", "blue", "✓"),
        Recommendation::Consider => ("Consider", "amber", "?"),
        Recommendation::NotRecommended => ("Not recommended", "red", "✗"),
        Recommendation::Other => ("Unrated", "gray", "•"),
    };
    RecommendationBadge { label, color, icon }
}

// ────────────────────────────────────────────────────────────────────────────
// View models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MatchCard {
    rank: usize,
    resume_id: String,
    filename: String,
    overall_score: String,
    band: &'static str,
    skill_score: String,
    skill_width: f64,
    experience_score: String,
    experience_width: f64,
    matched_skills: Vec<String>,
    missing_skills: Vec<String>,
    explanation: String,
    confidence: &'static str,
    badge: RecommendationBadge,
}

impl MatchCard {
    fn new(rank: usize, m: &Match) -> Self {
        Self {
            rank,
            resume_id: m.resume_id.clone(),
            filename: m.filename.clone(),
            overall_score: format!("{:.1}", m.overall_score),
            band: ScoreBand::from_score(m.overall_score).color(),
            skill_score: format!("{:.1}", m.skill_match_score),
            skill_width: bar_width(m.skill_match_score),
            experience_score: format!("{:.1}", m.experience_match_score),
            experience_width: bar_width(m.experience_match_score),
            matched_skills: m.matched_skills.clone(),
            missing_skills: m.missing_skills.clone(),
            explanation: m.explanation.clone(),
            confidence: m.confidence_level.label(),
            badge: recommendation_badge(m.recommendation),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum MatchResults {
    /// The job list itself could not be loaded.
    JobsUnavailable { error: String },
    NoReadyJobs,
    SelectJob,
    /// The requested job is not among the ready ones.
    NotReady { job_id: String },
    /// A newer selection is in flight and has nothing committed yet.
    Superseded,
    Failed { error: String },
    Empty,
    Matches { cards: Vec<MatchCard> },
}

#[derive(Debug, Serialize)]
struct JobOption {
    job_id: String,
    title: String,
    company: String,
}

#[derive(Debug, Serialize)]
struct FormView {
    job_id: String,
    top_k: u32,
    min_score: u32,
    experience_filter: &'static str,
}

impl From<Option<&MatchSelection>> for FormView {
    fn from(selection: Option<&MatchSelection>) -> Self {
        match selection {
            Some(s) => Self {
                job_id: s.job_id.clone(),
                top_k: s.top_k,
                min_score: s.min_score_percent,
                experience_filter: s.experience_filter.map(|l| l.as_str()).unwrap_or(""),
            },
            None => Self {
                job_id: String::new(),
                top_k: DEFAULT_TOP_K,
                min_score: 0,
                experience_filter: "",
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct HistoryRow {
    resume_id: String,
    overall_score: String,
    band: &'static str,
    badge: Option<RecommendationBadge>,
    matched_at: String,
}

fn history_rows(history: &MatchHistory) -> Vec<HistoryRow> {
    history
        .matches
        .iter()
        .map(|m| HistoryRow {
            resume_id: m.resume_id.clone(),
            overall_score: format!("{:.1}", m.overall_score),
            band: ScoreBand::from_score(m.overall_score).color(),
            badge: m.recommendation.map(recommendation_badge),
            matched_at: timestamp::display(m.created_at),
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Handler
// ────────────────────────────────────────────────────────────────────────────

async fn run_match(state: &AppState, session: &Session, selection: MatchSelection) -> MatchResults {
    let token = session.matching.begin(selection.clone()).await;

    let outcome = {
        let _busy = state.activity.begin("find_matches");
        state.api.find_matches(&selection.params()).await
    };

    match outcome {
        Ok(matches) => {
            let found = matches.len();
            if session.matching.commit(token, matches).await {
                info!(job_id = %selection.job_id, found, "Matches loaded");
            }
        }
        Err(e) => {
            session
                .notifications
                .error(format!("Failed to find matches: {e}"))
                .await;
            if session.matching.is_current(token).await {
                return MatchResults::Failed {
                    error: e.to_string(),
                };
            }
        }
    }

    committed_results(session).await
}

/// Results of the store's current selection, or `Superseded` when that
/// selection has not committed yet.
async fn committed_results(session: &Session) -> MatchResults {
    let selection = session.matching.selection().await;
    match session.matching.committed().await {
        Some(committed) if Some(&committed.key) == selection.as_ref() => {
            if committed.value.is_empty() {
                MatchResults::Empty
            } else {
                MatchResults::Matches {
                    cards: committed
                        .value
                        .iter()
                        .enumerate()
                        .map(|(i, m)| MatchCard::new(i + 1, m))
                        .collect(),
                }
            }
        }
        _ => MatchResults::Superseded,
    }
}

/// GET /matching
pub async fn handle_matching(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(form): Query<MatchForm>,
) -> Result<Response, AppError> {
    let query = JobQuery {
        limit: Some(JOB_PICKER_LIMIT),
        ..Default::default()
    };
    let (jobs, jobs_error) = match state.api.list_jobs(&query).await {
        Ok(jobs) => (ready_jobs(jobs), None),
        Err(e) => {
            session
                .notifications
                .error(format!("Failed to load jobs: {e}"))
                .await;
            (Vec::new(), Some(e.to_string()))
        }
    };

    let requested = form.selection();
    let (results, shown) = match requested {
        _ if jobs_error.is_some() => (
            MatchResults::JobsUnavailable {
                error: jobs_error.clone().unwrap_or_default(),
            },
            None,
        ),
        _ if jobs.is_empty() => (MatchResults::NoReadyJobs, None),
        None => (MatchResults::SelectJob, None),
        Some(selection) if !jobs.iter().any(|job| job.job_id == selection.job_id) => {
            warn!(job_id = %selection.job_id, "Match requested for a job that is not ready");
            session
                .notifications
                .warning(format!(
                    "Job {} is not ready for matching. Pick one from the list.",
                    selection.job_id
                ))
                .await;
            (
                MatchResults::NotReady {
                    job_id: selection.job_id,
                },
                None,
            )
        }
        Some(selection) => {
            let results = run_match(&state, &session, selection).await;
            (results, session.matching.selection().await)
        }
    };

    let show_history = shown.is_some() && form.history.is_some();
    let history = match (&shown, show_history) {
        (Some(selection), true) => match state.api.match_history(&selection.job_id).await {
            Ok(history) => Some(history_rows(&history)),
            Err(e) => {
                session
                    .notifications
                    .warning(format!("Failed to load match history: {e}"))
                    .await;
                None
            }
        },
        _ => None,
    };

    let selected_job = shown
        .as_ref()
        .and_then(|s| jobs.iter().find(|job| job.job_id == s.job_id))
        .map(|job| job.title.clone());

    let job_options: Vec<JobOption> = jobs
        .iter()
        .map(|job| JobOption {
            job_id: job.job_id.clone(),
            title: job.title.clone(),
            company: job.company.clone(),
        })
        .collect();

    let experience_levels: Vec<(&str, &str)> = ExperienceLevel::ALL
        .iter()
        .map(|level| (level.as_str(), level.label()))
        .collect();

    let mut context = page_context(&state, &session, Tab::Matching).await;
    context.insert("jobs", &job_options);
    context.insert("jobs_error", &jobs_error);
    context.insert("form", &FormView::from(shown.as_ref()));
    context.insert("selected_job", &selected_job);
    context.insert("results", &results);
    context.insert("history", &history);
    context.insert("show_history", &show_history);
    context.insert("experience_levels", &experience_levels);
    context.insert("max_top_k", &MAX_TOP_K);
    Ok(state.templates.render("matching.html", &context)?.into_response())
}
