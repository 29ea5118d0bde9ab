pub mod health;
pub mod notifications;
#[cfg(test)]
pub mod testing;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::{get, post},
    Router,
};

use crate::panels::{analytics, jobs, matching, resumes, search};
use crate::shell::session::session_layer;
use crate::shell::Tab;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_batch_bytes;

    // Every page carries a session; /health and the root redirect do not.
    let pages = Router::new()
        // Job panel
        .route(
            "/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/jobs/search", get(search::handle_search_jobs))
        .route("/jobs/:id", get(jobs::handle_job_detail))
        // Resume panel
        .route("/resumes", get(resumes::handle_list_resumes))
        .route("/resumes/search", get(search::handle_search_resumes))
        .route(
            "/resumes/upload",
            post(resumes::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/resumes/:id/analytics",
            get(resumes::handle_resume_analytics),
        )
        // Matching panel
        .route("/matching", get(matching::handle_matching))
        // Analytics panel
        .route("/analytics", get(analytics::handle_analytics))
        .route(
            "/analytics/process-pending",
            post(analytics::handle_process_pending),
        )
        // Shell
        .route(
            "/notifications/:id/dismiss",
            post(notifications::handle_dismiss),
        )
        .route("/notifications/clear", post(notifications::handle_clear))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_layer));

    Router::new()
        .route("/", get(|| async { Redirect::to(Tab::Jobs.path()) }))
        .route("/health", get(health::health_handler))
        .merge(pages)
        .with_state(state)
}
