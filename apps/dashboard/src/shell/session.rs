use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::panels::matching::MatchingStore;
use crate::panels::resumes::UploadTracker;
use crate::shell::notifications::NotificationStore;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "dashboard_session";

/// Per-browser state: what one user has been told, what they are uploading
/// and which match request they are waiting on.
#[derive(Clone)]
pub struct Session {
    pub id: Uuid,
    pub notifications: NotificationStore,
    pub uploads: UploadTracker,
    pub matching: MatchingStore,
}

impl Session {
    fn new(id: Uuid, notification_ttl: Duration) -> Self {
        Self {
            id,
            notifications: NotificationStore::new(notification_ttl),
            uploads: UploadTracker::new(),
            matching: MatchingStore::new(),
        }
    }
}

/// Sessions keyed by the id in the `dashboard_session` cookie. Sessions idle
/// longer than `idle_timeout` are dropped on the next lookup.
#[derive(Clone)]
pub struct Sessions {
    entries: Arc<RwLock<HashMap<Uuid, (Session, Instant)>>>,
    notification_ttl: Duration,
    idle_timeout: Duration,
}

impl Sessions {
    pub fn new(notification_ttl: Duration, idle_timeout: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            notification_ttl,
            idle_timeout,
        }
    }

    /// Returns the session for `id`, creating it when missing. A well-formed
    /// id the store no longer knows (restart, idle expiry) is reused so the
    /// browser keeps its cookie.
    pub async fn resolve(&self, id: Option<Uuid>) -> Session {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let idle_timeout = self.idle_timeout;
        entries.retain(|_, (_, last_seen)| now.duration_since(*last_seen) < idle_timeout);

        let id = id.unwrap_or_else(Uuid::new_v4);
        let (session, last_seen) = entries.entry(id).or_insert_with(|| {
            debug!(session = %id, "session started");
            (Session::new(id, self.notification_ttl), now)
        });
        *last_seen = now;
        session.clone()
    }

    #[cfg(test)]
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Attaches the caller's [`Session`] to the request extensions and issues a
/// cookie when the request did not carry a usable one.
pub async fn session_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let requested = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

    let session = state.sessions.resolve(requested).await;
    let issue_cookie = requested != Some(session.id);
    let id = session.id;
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;
    if issue_cookie {
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Could not encode session cookie"),
        }
    }
    response
}
