use axum::{extract::Path, response::Redirect, Extension, Form};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::shell::session::Session;

#[derive(Debug, Default, Deserialize)]
pub struct ReturnTo {
    pub return_to: Option<String>,
}

/// Local paths only; anything else sends the browser home.
fn return_path(raw: Option<&str>) -> &str {
    match raw {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") => {
            path
        }
        _ => "/",
    }
}

/// POST /notifications/:id/dismiss
pub async fn handle_dismiss(
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Form(form): Form<ReturnTo>,
) -> Result<Redirect, AppError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::BadRequest(format!("Invalid notification id: {id}")))?;
    // already expired is fine
    session.notifications.dismiss(id).await;
    Ok(Redirect::to(return_path(form.return_to.as_deref())))
}

/// POST /notifications/clear
pub async fn handle_clear(
    Extension(session): Extension<Session>,
    Form(form): Form<ReturnTo>,
) -> Redirect {
    session.notifications.clear().await;
    Redirect::to(return_path(form.return_to.as_deref()))
}
