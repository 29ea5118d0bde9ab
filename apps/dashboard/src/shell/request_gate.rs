use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

/// Ticket handed out by [`LatestOnly::begin`]. Only the most recent ticket
/// may commit a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// A result together with the selection that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed<K, V> {
    pub key: K,
    pub value: V,
}

#[derive(Debug)]
struct GateState<K, V> {
    latest: u64,
    selection: Option<K>,
    committed: Option<Committed<K, V>>,
}

/// Last-write-wins holder for on-demand fetches.
///
/// Each request is tagged with the selection that triggered it. A response
/// whose token has been superseded by a newer `begin` is discarded, so a
/// slow answer for an old selection never replaces a newer one.
#[derive(Debug)]
pub struct LatestOnly<K, V> {
    state: Arc<RwLock<GateState<K, V>>>,
}

impl<K, V> Clone for LatestOnly<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<K, V> Default for LatestOnly<K, V> {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(GateState {
                latest: 0,
                selection: None,
                committed: None,
            })),
        }
    }
}

impl<K: Clone, V: Clone> LatestOnly<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn begin(&self, selection: K) -> RequestToken {
        let mut state = self.state.write().await;
        state.latest += 1;
        state.selection = Some(selection);
        RequestToken(state.latest)
    }

    pub async fn is_current(&self, token: RequestToken) -> bool {
        self.state.read().await.latest == token.0
    }

    /// Stores `value` if `token` is still the latest. Returns whether it did.
    pub async fn commit(&self, token: RequestToken, value: V) -> bool {
        let mut state = self.state.write().await;
        if state.latest != token.0 {
            debug!(token = token.0, latest = state.latest, "discarding stale response");
            return false;
        }
        let Some(key) = state.selection.clone() else {
            return false;
        };
        state.committed = Some(Committed { key, value });
        true
    }

    /// The selection of the newest request, committed or not.
    pub async fn selection(&self) -> Option<K> {
        self.state.read().await.selection.clone()
    }

    pub async fn committed(&self) -> Option<Committed<K, V>> {
        self.state.read().await.committed.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stale_commit_is_discarded() {
        let gate: LatestOnly<&str, u32> = LatestOnly::new();
        let first = gate.begin("job-a").await;
        let second = gate.begin("job-b").await;

        assert!(gate.commit(second, 2).await);
        assert!(!gate.commit(first, 1).await);

        let committed = gate.committed().await.unwrap();
        assert_eq!(committed.key, "job-b");
        assert_eq!(committed.value, 2);
    }

    #[tokio::test]
    async fn test_in_order_commits_apply() {
        let gate: LatestOnly<&str, u32> = LatestOnly::new();
        let first = gate.begin("job-a").await;
        assert!(gate.is_current(first).await);
        assert!(gate.commit(first, 1).await);

        let second = gate.begin("job-b").await;
        assert!(!gate.is_current(first).await);
        assert_eq!(gate.selection().await, Some("job-b"));
        // the old result stays visible, tagged with its own selection
        assert_eq!(gate.committed().await.unwrap().key, "job-a");
        assert!(gate.commit(second, 2).await);
        assert_eq!(gate.committed().await.unwrap().value, 2);
    }
}
