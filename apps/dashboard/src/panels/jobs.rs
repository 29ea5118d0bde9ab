//! Job panel: create-job form and the filterable list of postings.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::{
    timestamp, CreateJobRequest, ExperienceLevel, Job, JobQuery, JobStatus, JobType,
};
use crate::panels::non_blank;
use crate::panels::search::SearchForm;
use crate::shell::session::Session;
use crate::shell::{page_context, Tab};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const MAX_SKIP: u32 = 1_000_000;

// ────────────────────────────────────────────────────────────────────────────
// List filters
// ────────────────────────────────────────────────────────────────────────────

/// Query string of `GET /jobs`. Everything arrives as text so a stray value
/// never rejects the whole page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    /// Client-side title search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

impl JobListParams {
    /// Offset into the list, capped so paging arithmetic cannot overflow.
    fn skip(&self) -> u32 {
        self.skip
            .as_deref()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(0)
            .min(MAX_SKIP)
    }

    fn limit(&self) -> u32 {
        self.limit
            .as_deref()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn to_query(&self) -> JobQuery {
        let skip = self.skip();
        JobQuery {
            company: non_blank(self.company.as_deref()),
            status: non_blank(self.status.as_deref()),
            skip: (skip > 0).then_some(skip),
            limit: Some(self.limit()),
        }
    }
}

/// Case-insensitive substring search over job titles. A blank needle keeps
/// every job.
pub fn filter_by_title(jobs: Vec<Job>, needle: Option<&str>) -> Vec<Job> {
    match non_blank(needle) {
        None => jobs,
        Some(needle) => {
            let needle = needle.to_lowercase();
            jobs.into_iter()
                .filter(|job| job.title.to_lowercase().contains(&needle))
                .collect()
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Create form
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    /// Comma-separated.
    #[serde(default)]
    pub requirements: String,
    /// Comma-separated.
    #[serde(default)]
    pub required_skills: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary_range: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub job_type: String,
    /// HTML checkbox: present ("on") when ticked, absent otherwise.
    #[serde(default)]
    pub remote_allowed: Option<String>,
    #[serde(default)]
    pub priority: String,
}

impl Default for JobForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            company: String::new(),
            description: String::new(),
            requirements: String::new(),
            required_skills: String::new(),
            location: String::new(),
            salary_range: String::new(),
            department: String::new(),
            experience_level: ExperienceLevel::default().as_str().to_string(),
            job_type: JobType::default().as_str().to_string(),
            remote_allowed: None,
            priority: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Splits comma-separated form text into trimmed, non-empty items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn required(
    value: &str,
    field: &'static str,
    label: &str,
    errors: &mut Vec<FieldError>,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, format!("{label} is required")));
    }
    value.to_string()
}

impl JobForm {
    /// Client-side validation. Nothing reaches the backend unless this passes.
    pub fn validate(&self) -> Result<CreateJobRequest, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = required(&self.title, "title", "Job title", &mut errors);
        let company = required(&self.company, "company", "Company", &mut errors);
        let description = required(&self.description, "description", "Description", &mut errors);
        let location = required(&self.location, "location", "Location", &mut errors);

        let requirements = split_list(&self.requirements);
        if requirements.is_empty() {
            errors.push(FieldError::new(
                "requirements",
                "At least one requirement is required",
            ));
        }

        let required_skills = split_list(&self.required_skills);
        if required_skills.is_empty() {
            errors.push(FieldError::new(
                "required_skills",
                "At least one required skill is required",
            ));
        }

        let experience_level = ExperienceLevel::parse(&self.experience_level).unwrap_or_else(|| {
            errors.push(FieldError::new(
                "experience_level",
                "Choose an experience level",
            ));
            ExperienceLevel::default()
        });

        let job_type = JobType::parse(&self.job_type).unwrap_or_else(|| {
            errors.push(FieldError::new("job_type", "Choose a job type"));
            JobType::default()
        });

        let priority = match self.priority.trim() {
            "" => 1,
            raw => match raw.parse::<i32>() {
                Ok(p) if p >= 1 => p,
                _ => {
                    errors.push(FieldError::new(
                        "priority",
                        "Priority must be a positive whole number",
                    ));
                    1
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CreateJobRequest {
            title,
            company,
            description,
            requirements,
            required_skills,
            experience_level,
            location,
            salary_range: non_blank(Some(&self.salary_range)),
            department: non_blank(Some(&self.department)),
            job_type,
            remote_allowed: self.remote_allowed.is_some(),
            priority,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// View models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OptionView {
    value: &'static str,
    label: &'static str,
}

fn experience_options() -> Vec<OptionView> {
    ExperienceLevel::ALL
        .iter()
        .map(|level| OptionView {
            value: level.as_str(),
            label: level.label(),
        })
        .collect()
}

fn job_type_options() -> Vec<OptionView> {
    JobType::ALL
        .iter()
        .map(|job_type| OptionView {
            value: job_type.as_str(),
            label: job_type.label(),
        })
        .collect()
}

pub fn job_status_color(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Active => "green",
        JobStatus::Inactive => "amber",
        JobStatus::Closed => "red",
        JobStatus::Unknown => "gray",
    }
}

#[derive(Debug, Serialize)]
struct JobRow {
    job_id: String,
    title: String,
    company: String,
    location: String,
    experience: &'static str,
    job_type: &'static str,
    remote_allowed: bool,
    status: &'static str,
    status_color: &'static str,
    embedding_status: &'static str,
    embedding_color: &'static str,
    ready_for_matching: bool,
    skills: usize,
    created: String,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone().unwrap_or_default(),
            experience: job.experience_level.label(),
            job_type: job.job_type.label(),
            remote_allowed: job.remote_allowed,
            status: job.status.as_str(),
            status_color: job_status_color(job.status),
            embedding_status: job.embedding_status.as_str(),
            embedding_color: job.embedding_status.color(),
            ready_for_matching: job.is_ready_for_matching(),
            skills: job.skill_count(),
            created: timestamp::display(job.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
struct Pagination {
    prev_skip: Option<u32>,
    next_skip: Option<u32>,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct JobDetailView {
    row: JobRow,
    description: String,
    requirements: Vec<String>,
    required_skills: Vec<String>,
    salary_range: Option<String>,
    department: Option<String>,
    priority: i32,
    updated: String,
}

async fn render_jobs_page(
    state: &AppState,
    session: &Session,
    params: &JobListParams,
    form: &JobForm,
    field_errors: &[FieldError],
    status: StatusCode,
) -> Result<Response, AppError> {
    let query = params.to_query();
    let (jobs, load_error) = match state.api.list_jobs(&query).await {
        Ok(jobs) => (jobs, None),
        Err(e) => {
            session
                .notifications
                .error(format!("Failed to load jobs: {e}"))
                .await;
            (Vec::new(), Some(e.to_string()))
        }
    };

    let limit = params.limit();
    let skip = params.skip();
    let page_full = jobs.len() as u32 >= limit;
    let rows: Vec<JobRow> = filter_by_title(jobs, params.q.as_deref())
        .iter()
        .map(JobRow::from)
        .collect();

    let mut context = page_context(state, session, Tab::Jobs).await;
    context.insert("jobs", &rows);
    context.insert("filters", params);
    context.insert(
        "pagination",
        &Pagination {
            prev_skip: (skip > 0).then(|| skip.saturating_sub(limit)),
            next_skip: page_full.then(|| skip.saturating_add(limit)),
            limit,
        },
    );
    context.insert("load_error", &load_error);
    context.insert("form", form);
    context.insert("field_errors", field_errors);
    context.insert("experience_levels", &experience_options());
    context.insert("job_types", &job_type_options());
    context.insert("search", &SearchForm::default());
    context.insert("search_errors", &Vec::<FieldError>::new());

    let html = state.templates.render("jobs.html", &context)?;
    Ok((status, html).into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<JobListParams>,
) -> Result<Response, AppError> {
    render_jobs_page(
        &state,
        &session,
        &params,
        &JobForm::default(),
        &[],
        StatusCode::OK,
    )
    .await
}

/// POST /jobs
///
/// Validates first; on success the backend creates the posting and starts
/// embedding it in the background, and the browser is redirected to a fresh
/// list with an empty form.
pub async fn handle_create_job(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<JobForm>,
) -> Result<Response, AppError> {
    let params = JobListParams::default();

    let request = match form.validate() {
        Ok(request) => request,
        Err(errors) => {
            let summary: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            session
                .notifications
                .warning(format!("Please complete the job form: {}", summary.join("; ")))
                .await;
            return render_jobs_page(
                &state,
                &session,
                &params,
                &form,
                &errors,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    let outcome = {
        let _busy = state.activity.begin("create_job");
        state.api.create_job(&request).await
    };

    match outcome {
        Ok(created) => {
            info!(job_id = %created.job_id, title = %request.title, "Job created");
            session
                .notifications
                .success(format!(
                    "Job \"{}\" created. Embeddings are being computed.",
                    request.title
                ))
                .await;
            Ok(Redirect::to(Tab::Jobs.path()).into_response())
        }
        Err(e) => {
            session
                .notifications
                .error(format!("Failed to create job: {e}"))
                .await;
            render_jobs_page(
                &state,
                &session,
                &params,
                &form,
                &[],
                StatusCode::BAD_GATEWAY,
            )
            .await
        }
    }
}

/// GET /jobs/:id
pub async fn handle_job_detail(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(job_id): Path<String>,
) -> Result<Response, AppError> {
    let job = match state.api.get_job(&job_id).await {
        Ok(job) => job,
        Err(e) => {
            session
                .notifications
                .error(format!("Failed to load job {job_id}: {e}"))
                .await;
            return Ok(Redirect::to(Tab::Jobs.path()).into_response());
        }
    };

    let detail = JobDetailView {
        row: JobRow::from(&job),
        description: job.description.clone().unwrap_or_default(),
        requirements: job.requirements.clone().unwrap_or_default(),
        required_skills: job.required_skills.clone().unwrap_or_default(),
        salary_range: job.salary_range.clone(),
        department: job.department.clone(),
        priority: job.priority,
        updated: timestamp::display(job.updated_at),
    };

    let mut context = page_context(&state, &session, Tab::Jobs).await;
    context.insert("job", &detail);
    Ok(state
        .templates
        .render("job_detail.html", &context)?
        .into_response())
}
