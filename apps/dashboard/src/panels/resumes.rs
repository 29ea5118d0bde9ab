//! Resume panel: multi-file upload with per-file progress and the list of
//! processed resumes.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, Path, Query, State,
    },
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::{ApiError, UploadProgress};
use crate::errors::AppError;
use crate::models::{timestamp, Resume, ResumeAnalytics, ResumeQuery, ResumeUpload, ResumeUploaded};
use crate::panels::jobs::FieldError;
use crate::panels::search::SearchForm;
use crate::panels::{bar_width, human_size, non_blank, percentage};
use crate::shell::session::Session;
use crate::shell::{page_context, Tab};
use crate::state::AppState;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

const UPLOAD_FIELD: &str = "files";

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum UploadRejection {
    #[error("{filename}: unsupported file type. Allowed types: PDF, DOCX, TXT")]
    UnsupportedType { filename: String },

    #[error("{filename}: file is larger than the 10 MB limit")]
    TooLarge { filename: String },
}

pub fn check_file_type(filename: &str) -> Result<(), UploadRejection> {
    let extension = FsPath::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(UploadRejection::UnsupportedType {
            filename: filename.to_string(),
        }),
    }
}

pub fn check_file_size(filename: &str, size: u64) -> Result<(), UploadRejection> {
    if size > MAX_FILE_BYTES {
        return Err(UploadRejection::TooLarge {
            filename: filename.to_string(),
        });
    }
    Ok(())
}

/// Reads a multipart field, stopping as soon as more than `cap` bytes have
/// arrived. An oversized file therefore yields `cap + 1` or more bytes but
/// is never buffered in full.
async fn read_capped(field: &mut Field<'_>, cap: u64) -> Result<Bytes, MultipartError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        buf.extend_from_slice(&chunk);
        if buf.len() as u64 > cap {
            break;
        }
    }
    Ok(buf.freeze())
}

// ────────────────────────────────────────────────────────────────────────────
// Progress tracking
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct UploadStatus {
    pub id: Uuid,
    pub filename: String,
    pub sent: String,
    pub total: String,
    pub percent: u32,
}

/// Uploads currently in flight, keyed by an id minted per file.
#[derive(Clone, Default)]
pub struct UploadTracker {
    inflight: Arc<RwLock<Vec<(Uuid, String, UploadProgress)>>>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn start(&self, filename: &str, total: u64) -> (Uuid, UploadProgress) {
        let id = Uuid::new_v4();
        let progress = UploadProgress::new(total);
        self.inflight
            .write()
            .await
            .push((id, filename.to_string(), progress.clone()));
        (id, progress)
    }

    pub async fn finish(&self, id: Uuid) {
        self.inflight.write().await.retain(|(entry, _, _)| *entry != id);
    }

    pub async fn snapshot(&self) -> Vec<UploadStatus> {
        self.inflight
            .read()
            .await
            .iter()
            .map(|(id, filename, progress)| UploadStatus {
                id: *id,
                filename: filename.clone(),
                sent: human_size(progress.sent()),
                total: human_size(progress.total()),
                percent: progress.percent(),
            })
            .collect()
    }
}

/// Uploads one file with its own progress entry, removed again whether the
/// upload succeeds or fails.
async fn upload_one(
    state: &AppState,
    session: &Session,
    upload: ResumeUpload,
) -> Result<ResumeUploaded, ApiError> {
    let (id, progress) = session
        .uploads
        .start(&upload.filename, upload.data.len() as u64)
        .await;
    let result = state.api.upload_resume(upload, progress).await;
    session.uploads.finish(id).await;
    result
}

// ────────────────────────────────────────────────────────────────────────────
// View models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResumeListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

impl ResumeListParams {
    pub fn to_query(&self) -> ResumeQuery {
        let parse = |raw: &Option<String>| raw.as_deref().and_then(|s| s.trim().parse::<u32>().ok());
        ResumeQuery {
            status: non_blank(self.status.as_deref()),
            skip: parse(&self.skip).filter(|skip| *skip > 0),
            limit: parse(&self.limit).map(|limit| limit.clamp(1, 100)),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResumeRow {
    resume_id: String,
    filename: String,
    size: Option<String>,
    file_type: Option<String>,
    processing_status: &'static str,
    processing_color: &'static str,
    embedding_status: &'static str,
    embedding_color: &'static str,
    quality: Option<u32>,
    experience: Option<&'static str>,
    experience_years: Option<u32>,
    skills: usize,
    uploaded: String,
    status_url: String,
}

impl ResumeRow {
    fn new(resume: &Resume, status_url: String) -> Self {
        Self {
            resume_id: resume.resume_id.clone(),
            filename: resume.filename.clone(),
            size: resume.file_size.map(human_size),
            file_type: resume.file_type.clone(),
            processing_status: resume.processing_status.as_str(),
            processing_color: resume.processing_status.color(),
            embedding_status: resume.embedding_status.as_str(),
            embedding_color: resume.embedding_status.color(),
            quality: resume.quality_percent(),
            experience: resume.experience_level.map(|level| level.label()),
            experience_years: resume.experience_years,
            skills: resume.skill_count(),
            uploaded: timestamp::display(resume.created_at),
            status_url,
        }
    }
}

#[derive(Debug, Serialize)]
struct SkillBar {
    skill: String,
    count: u64,
    width: f64,
}

/// Skills by descending frequency, widths relative to the most frequent.
fn skill_bars(analytics: &ResumeAnalytics) -> Vec<SkillBar> {
    let mut skills: Vec<(&String, &u64)> = analytics.skill_frequency.iter().collect();
    skills.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let max = skills.first().map(|(_, count)| **count).unwrap_or(0);

    skills
        .into_iter()
        .map(|(skill, count)| SkillBar {
            skill: skill.clone(),
            count: *count,
            width: bar_width(percentage(*count, max)),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct ResumeAnalyticsView {
    resume_id: String,
    filename: String,
    total_matches: u64,
    average_score: String,
    best_score: String,
    processing_status: &'static str,
    processing_color: &'static str,
    quality: Option<u32>,
    experience: Option<&'static str>,
    extracted_skills: Vec<String>,
    skill_bars: Vec<SkillBar>,
    uploaded: String,
    status_url: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<ResumeListParams>,
) -> Result<Response, AppError> {
    let (resumes, load_error) = match state.api.list_resumes(&params.to_query()).await {
        Ok(resumes) => (resumes, None),
        Err(e) => {
            session
                .notifications
                .error(format!("Failed to load resumes: {e}"))
                .await;
            (Vec::new(), Some(e.to_string()))
        }
    };

    let rows: Vec<ResumeRow> = resumes
        .iter()
        .map(|resume| ResumeRow::new(resume, state.api.resume_status_url(&resume.resume_id)))
        .collect();

    let mut context = page_context(&state, &session, Tab::Resumes).await;
    context.insert("resumes", &rows);
    context.insert("filters", &params);
    context.insert("load_error", &load_error);
    context.insert("uploads", &session.uploads.snapshot().await);
    context.insert("search", &SearchForm::default());
    context.insert("search_errors", &Vec::<FieldError>::new());
    context.insert("allowed_extensions", &ALLOWED_EXTENSIONS);
    context.insert(
        "accept",
        &ALLOWED_EXTENSIONS
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(","),
    );
    Ok(state.templates.render("resumes.html", &context)?.into_response())
}

/// POST /resumes/upload
///
/// Files are checked and forwarded one at a time. A rejected or failed file
/// produces a notification and the batch moves on to the next one.
pub async fn handle_upload(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let busy = state.activity.begin("upload_resumes");
    let mut seen = 0usize;
    let mut uploaded = 0usize;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                session
                    .notifications
                    .error(format!("Upload interrupted: {e}"))
                    .await;
                break;
            }
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        // browsers send an empty part when no file was chosen
        let Some(filename) = non_blank(field.file_name()) else {
            continue;
        };
        seen += 1;

        if let Err(rejection) = check_file_type(&filename) {
            session.notifications.warning(rejection.to_string()).await;
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let data = match read_capped(&mut field, MAX_FILE_BYTES).await {
            Ok(data) => data,
            Err(e) => {
                session
                    .notifications
                    .error(format!("Upload interrupted while reading {filename}: {e}"))
                    .await;
                break;
            }
        };

        if let Err(rejection) = check_file_size(&filename, data.len() as u64) {
            session.notifications.warning(rejection.to_string()).await;
            continue;
        }

        debug!(%filename, bytes = data.len(), "forwarding resume");
        let upload = ResumeUpload {
            filename: filename.clone(),
            content_type,
            data,
        };
        match upload_one(&state, &session, upload).await {
            Ok(done) => {
                uploaded += 1;
                info!(resume_id = %done.resume_id, %filename, "Resume uploaded");
                session
                    .notifications
                    .success(format!("{filename} uploaded. Processing has started."))
                    .await;
            }
            Err(e) => {
                session
                    .notifications
                    .error(format!("Failed to upload {filename}: {e}"))
                    .await;
            }
        }
    }
    drop(busy);

    if seen == 0 {
        session
            .notifications
            .info("Choose one or more files to upload")
            .await;
    }

    if uploaded > 0 {
        tokio::time::sleep(state.config.upload_refresh_delay).await;
    }

    Ok(Redirect::to(Tab::Resumes.path()).into_response())
}

/// GET /resumes/:id/analytics
pub async fn handle_resume_analytics(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(resume_id): Path<String>,
) -> Result<Response, AppError> {
    let analytics = match state.api.resume_analytics(&resume_id).await {
        Ok(analytics) => analytics,
        Err(e) => {
            session
                .notifications
                .error(format!("Failed to load analytics for resume {resume_id}: {e}"))
                .await;
            return Ok(Redirect::to(Tab::Resumes.path()).into_response());
        }
    };

    let view = ResumeAnalyticsView {
        skill_bars: skill_bars(&analytics),
        status_url: state.api.resume_status_url(&analytics.resume_id),
        resume_id: analytics.resume_id,
        filename: analytics.filename,
        total_matches: analytics.total_matches,
        average_score: format!("{:.1}", analytics.average_score),
        best_score: format!("{:.1}", analytics.best_score),
        processing_status: analytics.processing_status.as_str(),
        processing_color: analytics.processing_status.color(),
        quality: analytics
            .quality_score
            .map(|q| (q.clamp(0.0, 1.0) * 100.0).round() as u32),
        experience: analytics.experience_level.map(|level| level.label()),
        extracted_skills: analytics.extracted_skills.unwrap_or_default(),
        uploaded: timestamp::display(analytics.created_at),
    };

    let mut context = page_context(&state, &session, Tab::Resumes).await;
    context.insert("analytics", &view);
    Ok(state
        .templates
        .render("resume_analytics.html", &context)?
        .into_response())
}
