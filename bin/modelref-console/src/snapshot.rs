//! Audit snapshots: one fetched view per (category, preset, grouping).
//!
//! A snapshot is immutable once stored and is replaced wholesale on refresh.
//! Every fetch takes a generation number; a completion never replaces a
//! snapshot with a higher generation, so the latest request wins regardless
//! of completion order. Invalidating a category raises its generation floor:
//! fetches that started before the invalidation are never stored.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use modelref_audit::{build_report, AuditReport, ClientFilter, ReportInput, SortState};
use modelref_client::{AuditQuery, ClientError, ReferenceApi};
use modelref_types::{AuditPreset, CategoryAuditResponse, ModelCategory, ModelRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SnapshotKey {
    pub category: ModelCategory,
    pub preset: AuditPreset,
    pub grouped: bool,
}

impl SnapshotKey {
    /// Grouping only applies to categories that support it.
    pub fn new(category: ModelCategory, preset: AuditPreset, grouped: bool) -> Self {
        Self {
            category,
            preset,
            grouped: grouped && category.supports_grouping(),
        }
    }

    fn query(&self) -> AuditQuery {
        AuditQuery::new(self.preset).grouped(self.grouped)
    }
}

#[derive(Debug, Clone)]
pub struct AuditSnapshot {
    pub key: SnapshotKey,
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    pub models: Vec<ModelRecord>,
    /// `None` when the audit fetch failed (degraded mode).
    pub audit: Option<CategoryAuditResponse>,
}

impl AuditSnapshot {
    pub fn is_degraded(&self) -> bool {
        self.audit.is_none()
    }

    pub fn report(&self, filter: &ClientFilter, sort: SortState) -> AuditReport {
        let input = ReportInput {
            category: self.key.category,
            preset: self.key.preset,
            grouped: self.key.grouped,
            models: &self.models,
            audit: self.audit.as_ref(),
        };
        build_report(&input, filter, sort)
    }
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Refreshed(Arc<AuditSnapshot>),
    AlreadyRunning,
}

/// Removes its key from the busy set when dropped, including on error or
/// cancellation.
struct BusyGuard<'a> {
    busy: &'a Mutex<HashSet<SnapshotKey>>,
    key: SnapshotKey,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        lock(self.busy).remove(&self.key);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct SnapshotStore {
    api: Arc<dyn ReferenceApi>,
    generation: AtomicU64,
    snapshots: Mutex<HashMap<SnapshotKey, Arc<AuditSnapshot>>>,
    /// Lowest generation that may still be stored, per category.
    floors: Mutex<HashMap<ModelCategory, u64>>,
    busy: Mutex<HashSet<SnapshotKey>>,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = lock(&self.snapshots).len();
        write!(f, "SnapshotStore({count} snapshots)")
    }
}

impl SnapshotStore {
    pub fn new(api: Arc<dyn ReferenceApi>) -> Self {
        Self {
            api,
            generation: AtomicU64::new(0),
            snapshots: Mutex::new(HashMap::new()),
            floors: Mutex::new(HashMap::new()),
            busy: Mutex::new(HashSet::new()),
        }
    }

    pub fn cached(&self, key: &SnapshotKey) -> Option<Arc<AuditSnapshot>> {
        lock(&self.snapshots).get(key).cloned()
    }

    /// The stored snapshot for `key`, fetching it first if there is none.
    pub async fn get_or_fetch(&self, key: SnapshotKey) -> Result<Arc<AuditSnapshot>, ClientError> {
        if let Some(snapshot) = self.cached(&key) {
            return Ok(snapshot);
        }
        self.fetch(key).await
    }

    /// Re-fetch `key`. Overlapping refreshes of the same key are rejected
    /// without touching the reference service.
    pub async fn refresh(&self, key: SnapshotKey) -> Result<RefreshOutcome, ClientError> {
        if !lock(&self.busy).insert(key) {
            debug!(?key, "refresh already running");
            return Ok(RefreshOutcome::AlreadyRunning);
        }
        let _guard = BusyGuard {
            busy: &self.busy,
            key,
        };
        self.fetch(key).await.map(RefreshOutcome::Refreshed)
    }

    /// Fetch models and audit statistics concurrently and store the result.
    ///
    /// A models failure is an error; an audit failure yields a degraded
    /// snapshot.
    pub async fn fetch(&self, key: SnapshotKey) -> Result<Arc<AuditSnapshot>, ClientError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (models, audit) = tokio::join!(
            self.api.list_models(key.category),
            self.api.audit_or_degraded(key.category, key.query()),
        );
        let models = models?;
        if audit.is_none() {
            warn!(category = %key.category, preset = %key.preset, "showing degraded audit view");
        }

        let snapshot = AuditSnapshot {
            key,
            generation,
            fetched_at: Utc::now(),
            models,
            audit,
        };
        Ok(self.install(snapshot))
    }

    /// Store `snapshot` unless a newer one is already present; returns the
    /// snapshot that is current afterwards.
    ///
    /// A snapshot fetched before its category was last invalidated is handed
    /// back to the caller but not stored.
    pub fn install(&self, snapshot: AuditSnapshot) -> Arc<AuditSnapshot> {
        let mut snapshots = lock(&self.snapshots);
        let floor = lock(&self.floors)
            .get(&snapshot.key.category)
            .copied()
            .unwrap_or(0);
        if snapshot.generation < floor {
            debug!(
                key = ?snapshot.key,
                stale = snapshot.generation,
                floor,
                "discarding snapshot fetched before invalidation"
            );
            return Arc::new(snapshot);
        }
        if let Some(current) = snapshots.get(&snapshot.key) {
            if current.generation > snapshot.generation {
                debug!(
                    key = ?snapshot.key,
                    stale = snapshot.generation,
                    current = current.generation,
                    "discarding stale snapshot"
                );
                return Arc::clone(current);
            }
        }
        info!(
            category = %snapshot.key.category,
            preset = %snapshot.key.preset,
            generation = snapshot.generation,
            models = snapshot.models.len(),
            degraded = snapshot.is_degraded(),
            "audit snapshot stored"
        );
        let snapshot = Arc::new(snapshot);
        snapshots.insert(snapshot.key, Arc::clone(&snapshot));
        snapshot
    }

    /// Drop every snapshot of `category`, e.g. after a record was written.
    /// Fetches already in flight for the category will not be stored.
    pub fn invalidate(&self, category: ModelCategory) {
        let floor = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut snapshots = lock(&self.snapshots);
        lock(&self.floors).insert(category, floor);
        snapshots.retain(|key, _| key.category != category);
    }
}
