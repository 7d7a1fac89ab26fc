//! The sync scheduler: independent cadences over one shared pipeline.
//!
//! Each cadence is a tokio interval loop with its own retry policy. One
//! global in-flight guard serializes runs across cadences and manual
//! triggers, which is what keeps the store's replace-whole-collection
//! writes safe: there is never more than one pipeline run mutating it.
//!
//! The scheduler is an explicitly constructed object owned by the
//! composition root and passed by handle; there is no global singleton to
//! reach for. `destroy()` cancels every timer task so a fresh instance can
//! be built afterwards (hot reload, test teardown).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::{merge, SyncConfig, SyncConfigPatch};
use crate::error::{SyncError, SyncResult};
use crate::ingest::{Pipeline, RunReport};
use crate::retry::RetryPolicy;
use crate::store::{ArticleStore, DynArticleStore};

/// One independently scheduled recurring run of the pipeline.
#[derive(Clone, Copy, Debug)]
pub struct CadenceSpec {
    pub name: &'static str,
    pub interval: Duration,
    pub retry: RetryPolicy,
    /// The primary cadence drives `next_sync` in status reports and is the
    /// one `manual_sync` fronts for.
    pub primary: bool,
}

impl CadenceSpec {
    /// The frequent cadence; its interval follows the admin config.
    fn priority(config: &SyncConfig) -> Self {
        Self {
            name: "priority",
            interval: Duration::from_secs(u64::from(config.interval_minutes) * 60),
            retry: RetryPolicy::new(3, Duration::from_secs(30)),
            primary: true,
        }
    }

    /// Slow safety net in case the priority cadence keeps failing.
    fn backup() -> Self {
        Self {
            name: "backup",
            interval: Duration::from_secs(6 * 3600),
            retry: RetryPolicy::new(2, Duration::from_secs(120)),
            primary: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub is_running: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub next_sync: Option<DateTime<Utc>>,
}

struct Inner {
    pipeline: Pipeline,
    store: DynArticleStore,
    config: RwLock<SyncConfig>,
    in_flight: AtomicBool,
    next_sync: RwLock<Option<DateTime<Utc>>>,
}

/// Releases the in-flight flag on drop, so a cadence task aborted mid-run
/// (config restart, destroy) cannot leave the scheduler wedged.
struct InFlightGuard(Arc<Inner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::SeqCst);
    }
}

fn try_acquire(inner: &Arc<Inner>) -> Option<InFlightGuard> {
    if inner.in_flight.swap(true, Ordering::SeqCst) {
        None
    } else {
        Some(InFlightGuard(Arc::clone(inner)))
    }
}

pub struct SyncScheduler {
    inner: Arc<Inner>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncScheduler {
    pub fn new(pipeline: Pipeline, store: DynArticleStore, config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                pipeline,
                store,
                config: RwLock::new(config.sanitized()),
                in_flight: AtomicBool::new(false),
                next_sync: RwLock::new(None),
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the cadence loops. Idempotent only via `destroy()` first.
    pub fn start(&self) {
        let config = self.inner.config.read().expect("config lock").clone();
        let cadences = [CadenceSpec::priority(&config), CadenceSpec::backup()];
        let mut tasks = self.tasks.lock().expect("tasks lock");
        for spec in cadences {
            let inner = Arc::clone(&self.inner);
            tasks.push(tokio::spawn(async move {
                run_cadence(inner, spec).await;
            }));
        }
    }

    pub fn get_config(&self) -> SyncConfig {
        self.inner.config.read().expect("config lock").clone()
    }

    /// Merge the patch, persist it, and restart the cadences with the new
    /// intervals immediately. Persistence failures surface to the caller;
    /// the live config is left untouched in that case.
    pub async fn update_config(&self, patch: SyncConfigPatch) -> SyncResult<SyncConfig> {
        let merged = {
            let current = self.inner.config.read().expect("config lock");
            merge(&current, &patch)
        };
        self.inner.store.save_config(&merged).await?;
        *self.inner.config.write().expect("config lock") = merged.clone();

        // An in-flight run finishes under the old settings; the restart only
        // affects when the next one starts.
        self.cancel_tasks();
        self.start();
        Ok(merged)
    }

    /// Out-of-band run of the primary cadence. A run already in flight makes
    /// this a no-op that reports "already syncing" instead of queueing.
    pub async fn manual_sync(&self) -> SyncResult<RunReport> {
        let config = self.inner.config.read().expect("config lock").clone();
        let Some(_guard) = try_acquire(&self.inner) else {
            return Err(SyncError::AlreadyRunning);
        };
        self.inner.pipeline.run_once(&config).await
    }

    pub async fn get_status(&self) -> SyncStatus {
        let last_sync = self.inner.store.last_sync_at().await.unwrap_or(None);
        SyncStatus {
            is_running: self.inner.in_flight.load(Ordering::SeqCst),
            last_sync,
            next_sync: *self.inner.next_sync.read().expect("next_sync lock"),
        }
    }

    /// Cancel all pending timers. After this, a fresh scheduler can be
    /// constructed and started without interference.
    pub fn destroy(&self) {
        self.cancel_tasks();
    }

    fn cancel_tasks(&self) {
        let mut tasks = self.tasks.lock().expect("tasks lock");
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.cancel_tasks();
    }
}

async fn run_cadence(inner: Arc<Inner>, spec: CadenceSpec) {
    let mut ticker = tokio::time::interval(spec.interval);
    // The immediate first tick gives an initial sync at startup.
    loop {
        ticker.tick().await;
        if spec.primary {
            *inner.next_sync.write().expect("next_sync lock") =
                Some(Utc::now() + chrono::Duration::from_std(spec.interval).unwrap_or_default());
        }

        let config = inner.config.read().expect("config lock").clone();
        if !config.enabled {
            continue;
        }

        // Never two runs in flight: a tick that lands while the previous run
        // (or a manual sync) is still going is skipped, not queued.
        let Some(_guard) = try_acquire(&inner) else {
            tracing::info!(cadence = spec.name, "previous run still in flight, skipping tick");
            continue;
        };

        let outcome = spec
            .retry
            .run(|_attempt| inner.pipeline.run_once(&config))
            .await;
        drop(_guard);

        match outcome {
            Ok(report) => {
                tracing::debug!(
                    cadence = spec.name,
                    added = report.added,
                    "cadence run complete"
                );
            }
            Err(e) => {
                // Retries are exhausted; wait for the next natural tick
                // rather than escalating into a retry storm.
                tracing::error!(
                    cadence = spec.name,
                    error = %SyncError::RetriesExhausted {
                        cadence: spec.name.to_string(),
                        attempts: spec.retry.max_attempts,
                        last_error: e.to_string(),
                    },
                    "cadence run failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::enrich::Enricher;
    use crate::events::EventBus;
    use crate::image::ImageAssurance;
    use crate::similarity::SimilarityParams;
    use crate::store::{ArticleStore, MemoryStore};

    fn pipeline(store: DynArticleStore) -> Pipeline {
        Pipeline::new(
            store,
            Classifier::offline(),
            Enricher::offline(),
            ImageAssurance::offline(),
            SimilarityParams::default(),
            EventBus::new(),
            vec![],
        )
    }

    #[tokio::test]
    async fn manual_sync_runs_and_updates_last_sync() {
        let store: DynArticleStore = Arc::new(MemoryStore::new());
        let scheduler = SyncScheduler::new(pipeline(store.clone()), store.clone(), SyncConfig::default());
        let report = scheduler.manual_sync().await.unwrap();
        assert_eq!(report.added, 0);
        assert!(store.last_sync_at().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_config_persists_and_applies() {
        let store: DynArticleStore = Arc::new(MemoryStore::new());
        let scheduler = SyncScheduler::new(pipeline(store.clone()), store.clone(), SyncConfig::default());
        let patch = SyncConfigPatch {
            interval_minutes: Some(7),
            ..Default::default()
        };
        let new = scheduler.update_config(patch).await.unwrap();
        assert_eq!(new.interval_minutes, 7);
        assert_eq!(scheduler.get_config().interval_minutes, 7);
        assert_eq!(
            store.load_config().await.unwrap().map(|c| c.interval_minutes),
            Some(7)
        );
        scheduler.destroy();
    }

    #[tokio::test]
    async fn status_reflects_idle_scheduler() {
        let store: DynArticleStore = Arc::new(MemoryStore::new());
        let scheduler = SyncScheduler::new(pipeline(store.clone()), store, SyncConfig::default());
        let status = scheduler.get_status().await;
        assert!(!status.is_running);
        assert!(status.last_sync.is_none());
    }
}
