//! Backend health monitor: a periodic poller writing the latest snapshot of
//! backend health and aggregate counts into a store the shell header reads.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ScreeningApi;
use crate::models::HealthStatus;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardCounts {
    pub total_jobs: u64,
    pub total_resumes: u64,
    pub total_matches: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    pub color: &'static str,
    pub reachable: bool,
    pub services: BTreeMap<String, String>,
    pub error: Option<String>,
    pub counts: Option<DashboardCounts>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct HealthMonitor {
    latest: Arc<RwLock<Option<HealthSnapshot>>>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn latest(&self) -> Option<HealthSnapshot> {
        self.latest.read().await.clone()
    }

    /// Polls the backend once and stores the result. The detailed check is
    /// preferred; the basic one is the fallback when it fails.
    pub async fn refresh(&self, api: &dyn ScreeningApi) -> HealthSnapshot {
        let (detailed, overview) = tokio::join!(api.health_detailed(), api.analytics_overview());

        let report = match detailed {
            Ok(report) => Ok(report),
            Err(e) => {
                debug!(error = %e, "detailed health check failed, trying basic check");
                api.health().await
            }
        };

        let counts = overview.ok().map(|o| DashboardCounts {
            total_jobs: o.total_jobs,
            total_resumes: o.total_resumes,
            total_matches: o.total_matches,
        });

        let snapshot = match report {
            Ok(report) => HealthSnapshot {
                status: report.status,
                color: report.status.color(),
                reachable: true,
                services: report.services,
                error: None,
                counts,
                checked_at: Utc::now(),
            },
            Err(e) => HealthSnapshot {
                status: HealthStatus::Unhealthy,
                color: HealthStatus::Unhealthy.color(),
                reachable: false,
                services: BTreeMap::new(),
                error: Some(e.to_string()),
                counts,
                checked_at: Utc::now(),
            },
        };

        *self.latest.write().await = Some(snapshot.clone());
        snapshot
    }

    /// Re-polls every `every` until `shutdown` fires. The first poll runs
    /// immediately.
    pub fn spawn_poller(
        &self,
        api: Arc<dyn ScreeningApi>,
        every: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = every.as_secs(), "Health poller started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Health poller stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let snapshot = monitor.refresh(api.as_ref()).await;
                        if snapshot.reachable {
                            debug!(status = snapshot.status.as_str(), "backend health polled");
                        } else {
                            warn!(error = ?snapshot.error, "backend unreachable");
                        }
                    }
                }
            }
        })
    }
}
