//! Resolved plan cache
//!
//! Plans are memoized per type pair. Three lifetimes are available:
//!
//! - `in_process`: entries belong to one cache instance;
//! - `shared`: entries live in a process-wide table keyed by namespace, so
//!   every cache opened on the same namespace sees them;
//! - `persistent`: entries are additionally written to a JSON snapshot file
//!   and reloaded when a cache is opened on the same path.
//!
//! The cache never changes mapping results: a miss resolves the plan again.

use crate::plan::ResolvedPlan;
use crate::storage::PairKey;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};
use tracing::{debug, info, warn};

/// Snapshot format version
const SNAPSHOT_VERSION: u32 = 1;

type Entries = Arc<DashMap<PairKey, Arc<ResolvedPlan>>>;

static SHARED: LazyLock<DashMap<String, Entries>> = LazyLock::new(DashMap::new);

/// Cache lifetime policy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CachePolicy {
    #[default]
    InProcess,
    Shared { namespace: String },
    Persistent { path: PathBuf },
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheSnapshot {
    version: u32,
    saved_at: DateTime<Utc>,
    plans: Vec<ResolvedPlan>,
}

/// Concurrent plan cache
#[derive(Debug)]
pub struct MappingCache {
    policy: CachePolicy,
    entries: Entries,
    persist_lock: Mutex<()>,
}

impl MappingCache {
    /// Open a cache with the given policy. A persistent cache loads its
    /// snapshot file if one exists; an unreadable snapshot is logged and
    /// ignored.
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        let entries = match &policy {
            CachePolicy::InProcess => Entries::default(),
            CachePolicy::Shared { namespace } => {
                Arc::clone(SHARED.entry(namespace.clone()).or_default().value())
            }
            CachePolicy::Persistent { path } => {
                let entries = Entries::default();
                match load_snapshot(path) {
                    Ok(Some(plans)) => {
                        info!("Loaded {} cached plans from {}", plans.len(), path.display());
                        for plan in plans {
                            let key = PairKey::new(&plan.source_type, &plan.destination_type);
                            entries.insert(key, Arc::new(plan));
                        }
                    }
                    Ok(None) => debug!("No cache snapshot at {}", path.display()),
                    Err(e) => warn!("Ignoring cache snapshot {}: {}", path.display(), e),
                }
                entries
            }
        };

        Self {
            policy,
            entries,
            persist_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Cached plan for a pair, regardless of the configuration it was
    /// built from
    #[must_use]
    pub fn get(&self, source_type: &str, destination_type: &str) -> Option<Arc<ResolvedPlan>> {
        self.entries
            .get(&PairKey::new(source_type, destination_type))
            .map(|e| Arc::clone(e.value()))
    }

    /// Cached plan for a pair, only if it was built from the configuration
    /// identified by `fingerprint`
    #[must_use]
    pub fn get_matching(
        &self,
        source_type: &str,
        destination_type: &str,
        fingerprint: u64,
    ) -> Option<Arc<ResolvedPlan>> {
        let plan = self.get(source_type, destination_type)?;
        if plan.fingerprint == fingerprint {
            debug!("Cache hit for {}->{}", source_type, destination_type);
            Some(plan)
        } else {
            debug!(
                "Stale cache entry for {}->{}",
                source_type, destination_type
            );
            None
        }
    }

    /// Store a plan, replacing any previous plan for its pair
    pub fn put(&self, plan: ResolvedPlan) -> Arc<ResolvedPlan> {
        let key = PairKey::new(&plan.source_type, &plan.destination_type);
        let plan = Arc::new(plan);
        self.entries.insert(key, Arc::clone(&plan));
        self.persist();
        plan
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
        self.persist();
        debug!("Cleared plan cache");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached pairs, sorted
    #[must_use]
    pub fn pairs(&self) -> Vec<PairKey> {
        let mut keys: Vec<PairKey> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Resolve and store a plan for each pair. Stops at the first pair that
    /// fails to resolve.
    ///
    /// # Errors
    ///
    /// Returns the resolver's error.
    pub fn warmup<F>(&self, pairs: &[PairKey], mut resolve: F) -> Result<usize>
    where
        F: FnMut(&PairKey) -> Result<ResolvedPlan>,
    {
        for pair in pairs {
            let plan = resolve(pair)?;
            self.put(plan);
        }
        info!("Warmed up {} cached plans", pairs.len());
        Ok(pairs.len())
    }

    fn persist(&self) {
        let CachePolicy::Persistent { path } = &self.policy else {
            return;
        };
        let Ok(_guard) = self.persist_lock.lock() else {
            warn!("Cache persistence lock poisoned, skipping snapshot");
            return;
        };

        let mut plans: Vec<ResolvedPlan> = self
            .entries
            .iter()
            .map(|e| e.value().as_ref().clone())
            .collect();
        plans.sort_by(|a, b| {
            (&a.source_type, &a.destination_type).cmp(&(&b.source_type, &b.destination_type))
        });

        if let Err(e) = save_snapshot(path, plans) {
            warn!("Failed to persist plan cache to {}: {}", path.display(), e);
        }
    }
}

impl Default for MappingCache {
    fn default() -> Self {
        Self::new(CachePolicy::InProcess)
    }
}

fn load_snapshot(path: &Path) -> Result<Option<Vec<ResolvedPlan>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Cache(format!("Failed to read snapshot: {e}")))?;
    let snapshot: CacheSnapshot = serde_json::from_str(&content)
        .map_err(|e| Error::Cache(format!("Invalid snapshot: {e}")))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(Error::Cache(format!(
            "Unsupported snapshot version {}",
            snapshot.version
        )));
    }
    Ok(Some(snapshot.plans))
}

fn save_snapshot(path: &Path, plans: Vec<ResolvedPlan>) -> Result<()> {
    let snapshot = CacheSnapshot {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now(),
        plans,
    };
    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| Error::Cache(format!("Failed to serialize snapshot: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Cache(format!("Failed to create {}: {e}", parent.display())))?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json)
        .map_err(|e| Error::Cache(format!("Failed to write {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| Error::Cache(format!("Failed to replace {}: {e}", path.display())))?;
    Ok(())
}
