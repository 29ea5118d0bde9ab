//! The dashboard shell: tab bar, loading flag, notifications and the backend
//! health badge shared by every panel.

pub mod activity;
pub mod notifications;
pub mod request_gate;
pub mod session;

use serde::Serialize;
use tera::Context;

use crate::health::HealthSnapshot;
use crate::shell::notifications::Notification;
use crate::shell::session::Session;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Jobs,
    Resumes,
    Matching,
    Analytics,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Jobs, Tab::Resumes, Tab::Matching, Tab::Analytics];

    pub fn path(&self) -> &'static str {
        match self {
            Tab::Jobs => "/jobs",
            Tab::Resumes => "/resumes",
            Tab::Matching => "/matching",
            Tab::Analytics => "/analytics",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Jobs => "Jobs",
            Tab::Resumes => "Resumes",
            Tab::Matching => "Matching",
            Tab::Analytics => "Analytics",
        }
    }
}

#[derive(Debug, Serialize)]
struct TabView {
    path: &'static str,
    label: &'static str,
    active: bool,
}

#[derive(Debug, Serialize)]
struct ShellView {
    tabs: Vec<TabView>,
    active_path: &'static str,
    notifications: Vec<Notification>,
    busy: bool,
    health: Option<HealthSnapshot>,
}

/// Template context with the `shell` key filled in. Call it after the
/// handler's own work so notifications raised by that work are included.
/// Rendering starts the auto-dismiss timer of the session's notifications.
pub async fn page_context(state: &AppState, session: &Session, active: Tab) -> Context {
    let shell = ShellView {
        tabs: Tab::ALL
            .iter()
            .map(|tab| TabView {
                path: tab.path(),
                label: tab.label(),
                active: *tab == active,
            })
            .collect(),
        active_path: active.path(),
        notifications: session.notifications.active().await,
        busy: state.activity.is_busy(),
        health: state.health.latest().await,
    };

    let mut context = Context::new();
    context.insert("shell", &shell);
    context
}
