use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    /// First time the notification went out in a rendered page.
    #[serde(skip)]
    shown_at: Option<Instant>,
}

/// Transient user-facing messages, one store per session.
///
/// The auto-dismiss timer (`ttl`) starts when an entry is first rendered, so
/// messages raised during a long request survive until the page that
/// follows it. Entries can also be dismissed or cleared explicitly.
#[derive(Clone)]
pub struct NotificationStore {
    entries: Arc<RwLock<Vec<Notification>>>,
    ttl: Duration,
}

impl NotificationStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            ttl,
        }
    }

    pub async fn push(&self, level: NotificationLevel, message: impl Into<String>) -> Uuid {
        let message = message.into();
        match level {
            NotificationLevel::Error | NotificationLevel::Warning => {
                warn!(?level, %message, "notification")
            }
            _ => info!(?level, %message, "notification"),
        }
        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            message,
            shown_at: None,
        };
        let id = notification.id;
        self.entries.write().await.push(notification);
        id
    }

    pub async fn success(&self, message: impl Into<String>) -> Uuid {
        self.push(NotificationLevel::Success, message).await
    }

    pub async fn info(&self, message: impl Into<String>) -> Uuid {
        self.push(NotificationLevel::Info, message).await
    }

    pub async fn warning(&self, message: impl Into<String>) -> Uuid {
        self.push(NotificationLevel::Warning, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(NotificationLevel::Error, message).await
    }

    /// Live notifications, oldest first. Entries shown longer than `ttl` ago
    /// are pruned and the rest are marked as shown now if they were not yet.
    pub async fn active(&self) -> Vec<Notification> {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;
        entries.retain(|n| n.shown_at.map_or(true, |shown| now.duration_since(shown) < ttl));
        for entry in entries.iter_mut() {
            entry.shown_at.get_or_insert(now);
        }
        entries.clone()
    }

    pub async fn dismiss(&self, id: Uuid) -> bool {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notifications_expire_after_ttl() {
        let store = NotificationStore::new(Duration::from_secs(5));
        store.error("Upload failed").await;
        assert_eq!(store.active().await.len(), 1);

        tokio::time::advance(Duration::from_secs(3)).await;
        store.success("Job created").await;
        assert_eq!(store.active().await.len(), 2);

        tokio::time::advance(Duration::from_secs(3)).await;
        let active = store.active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "Job created");
        assert_eq!(active[0].level, NotificationLevel::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unseen_notifications_wait_for_first_render() {
        let store = NotificationStore::new(Duration::from_secs(5));
        store.warning("virus.exe: unsupported file type").await;

        // a slow request keeps the page from rendering for a while
        tokio::time::advance(Duration::from_secs(9)).await;
        let active = store.active().await;
        assert_eq!(active.len(), 1);
        assert!(active[0].message.starts_with("virus.exe"));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(store.active().await.len(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.active().await.is_empty());
    }

    #[tokio::test]
    async fn test_dismiss_and_clear() {
        let store = NotificationStore::new(Duration::from_secs(60));
        let first = store.info("one").await;
        store.warning("two").await;

        assert!(store.dismiss(first).await);
        assert!(!store.dismiss(first).await);
        assert_eq!(store.active().await.len(), 1);

        store.clear().await;
        assert!(store.active().await.is_empty());
    }
}
