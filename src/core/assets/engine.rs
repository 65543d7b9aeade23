// ─── Asset Sync Engine ───
// Materializes every object of an asset index under a destination root,
// preferring an existing local installation over the network.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::index::ManifestIndex;
use super::plan::{PlanEntry, SyncPlan};
use crate::core::downloader::client::ensure_parent_dir;
use crate::core::downloader::{file_matches, Downloader};
use crate::core::error::{StageError, StageResult};

pub const DEFAULT_ASSETS_URL: &str = "https://resources.download.minecraft.net/";
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Knobs for one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Remote root; objects live at `<base_url>/<hash[0..2]>/<hash>`.
    pub base_url: String,
    /// Maximum number of units in flight.
    pub concurrency: usize,
    /// Hash downloaded bodies before they reach the destination.
    pub verify_downloads: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ASSETS_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            verify_downloads: true,
        }
    }
}

impl SyncOptions {
    pub fn validate(&self) -> StageResult<()> {
        if self.concurrency == 0 {
            return Err(StageError::InvalidConfig(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(StageError::InvalidConfig("assets base URL is empty".into()));
        }
        Ok(())
    }
}

/// An object that could not be materialized after the cache fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub hash: String,
    pub attempted_path: PathBuf,
    pub reason: String,
    /// The unit never ran because the run was cancelled.
    pub cancelled: bool,
}

/// Per-run counters, one bucket per plan entry plus the shared keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub skipped: usize,
    pub copied: usize,
    pub downloaded: usize,
    pub failed: usize,
    /// Keys whose object was already covered by an earlier key.
    pub shared: usize,
}

/// Result of a full sync run. Built only after every unit finished.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub output_index: ManifestIndex,
    pub failures: Vec<FailureRecord>,
    pub stats: SyncStats,
    pub cancelled: bool,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every logical key affected by a failure, sorted.
    pub fn failed_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .failures
            .iter()
            .flat_map(|f| self.output_index.keys_for_hash(&f.hash))
            .map(str::to_string)
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Turn a report with failures into the consolidated run error.
    ///
    /// `Cancelled` is returned only when every failure is a skipped unit;
    /// real failures always surface their keys.
    pub fn into_result(self) -> StageResult<Self> {
        if self.failures.is_empty() {
            return Ok(self);
        }
        if self.cancelled && self.failures.iter().all(|f| f.cancelled) {
            return Err(StageError::Cancelled);
        }
        Err(StageError::IncompleteSync {
            failed: self.failures.len(),
            keys: self.failed_keys(),
        })
    }
}

/// Progress callbacks. All methods default to no-ops.
pub trait SyncObserver: Send + Sync {
    fn on_skip(&self, _entry: &PlanEntry) {}
    fn on_cache_hit(&self, _entry: &PlanEntry, _source: &Path) {}
    fn on_download_start(&self, _entry: &PlanEntry, _url: &str) {}
    fn on_download_complete(&self, _entry: &PlanEntry, _bytes: u64) {}
    fn on_download_failed(&self, _entry: &PlanEntry, _error: &StageError) {}
}

/// Renders observer events as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_skip(&self, entry: &PlanEntry) {
        debug!("Skipping asset {} as it already exists", entry.path);
    }

    fn on_cache_hit(&self, entry: &PlanEntry, source: &Path) {
        debug!("Copied asset {} from {:?}", entry.path, source);
    }

    fn on_download_start(&self, entry: &PlanEntry, url: &str) {
        debug!("Downloading asset {} from {}", entry.path, url);
    }

    fn on_download_failed(&self, entry: &PlanEntry, error: &StageError) {
        warn!("Failed to download asset {} ({}): {}", entry.path, entry.key, error);
    }
}

/// Shared cancellation switch; units that start after `cancel()` are
/// recorded as failures without touching disk or network.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum Outcome {
    Skipped,
    Copied,
    Downloaded,
    Failed(FailureRecord),
}

pub struct AssetSyncEngine {
    downloader: Downloader,
    options: SyncOptions,
    observer: Arc<dyn SyncObserver>,
    cancel: CancelFlag,
}

impl AssetSyncEngine {
    pub fn new(downloader: Downloader, options: SyncOptions) -> StageResult<Self> {
        options.validate()?;
        Ok(Self {
            downloader,
            options,
            observer: Arc::new(TracingObserver),
            cancel: CancelFlag::new(),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Remote URL of a relative object path.
    pub fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.options.base_url.trim_end_matches('/'), path)
    }

    /// Synchronize every object of `manifest` into `dest_root`.
    ///
    /// `cache_root` is an `objects/` directory with the same layout, consulted
    /// before the network. Per-object failures are collected in the report;
    /// only failing to create `dest_root` aborts the run.
    pub async fn sync(
        &self,
        manifest: &ManifestIndex,
        cache_root: Option<&Path>,
        dest_root: &Path,
    ) -> StageResult<SyncReport> {
        tokio::fs::create_dir_all(dest_root)
            .await
            .map_err(|e| StageError::io(dest_root, e))?;

        let plan = SyncPlan::build(manifest);
        info!(
            "Syncing {} asset objects ({} keys, {} shared), concurrency={}",
            plan.len(),
            manifest.len(),
            plan.shared_keys(),
            self.options.concurrency
        );

        let mut stats = SyncStats {
            shared: plan.shared_keys(),
            ..SyncStats::default()
        };

        // The collect is the barrier: nothing below runs before every unit is done
        let outcomes: Vec<Outcome> = stream::iter(plan.into_entries())
            .map(|entry| self.process(entry, cache_root, dest_root))
            .buffer_unordered(self.options.concurrency)
            .collect()
            .await;

        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Skipped => stats.skipped += 1,
                Outcome::Copied => stats.copied += 1,
                Outcome::Downloaded => stats.downloaded += 1,
                Outcome::Failed(record) => {
                    stats.failed += 1;
                    failures.push(record);
                }
            }
        }
        failures.sort_by(|a, b| a.hash.cmp(&b.hash));

        info!(
            "Asset sync finished: {} downloaded, {} copied from cache, {} up to date, {} failed",
            stats.downloaded, stats.copied, stats.skipped, stats.failed
        );

        Ok(SyncReport {
            output_index: manifest.clone(),
            failures,
            stats,
            cancelled: self.cancel.is_cancelled(),
        })
    }

    async fn process(
        &self,
        entry: PlanEntry,
        cache_root: Option<&Path>,
        dest_root: &Path,
    ) -> Outcome {
        let dest = dest_root.join(&entry.path);

        if self.cancel.is_cancelled() {
            return Outcome::Failed(FailureRecord {
                hash: entry.hash,
                attempted_path: dest,
                reason: StageError::Cancelled.to_string(),
                cancelled: true,
            });
        }

        match file_matches(&dest, &entry.hash).await {
            Ok(true) => {
                self.observer.on_skip(&entry);
                return Outcome::Skipped;
            }
            Ok(false) => {}
            Err(e) => debug!("Existing asset {:?} unreadable, refetching: {}", dest, e),
        }

        if let Some(root) = cache_root {
            let source = root.join(&entry.path);
            if self.copy_from_cache(&entry, &source, &dest).await {
                self.observer.on_cache_hit(&entry, &source);
                return Outcome::Copied;
            }
        }

        let url = self.object_url(&entry.path);
        self.observer.on_download_start(&entry, &url);

        let expected = self
            .options
            .verify_downloads
            .then_some(entry.hash.as_str());
        match self.downloader.download_file(&url, &dest, expected).await {
            Ok(bytes) => {
                self.observer.on_download_complete(&entry, bytes);
                Outcome::Downloaded
            }
            Err(e) => {
                self.observer.on_download_failed(&entry, &e);
                Outcome::Failed(FailureRecord {
                    hash: entry.hash,
                    attempted_path: dest,
                    reason: e.to_string(),
                    cancelled: false,
                })
            }
        }
    }

    /// Copy a valid cached object into place. Any problem means "not cached".
    async fn copy_from_cache(&self, entry: &PlanEntry, source: &Path, dest: &Path) -> bool {
        match file_matches(source, &entry.hash).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                debug!("Cached asset {:?} unreadable: {}", source, e);
                return false;
            }
        }

        if let Err(e) = ensure_parent_dir(dest).await {
            debug!("Cannot prepare {:?} for cache copy: {}", dest, e);
            return false;
        }

        match tokio::fs::copy(source, dest).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Cache copy {:?} -> {:?} failed: {}", source, dest, e);
                false
            }
        }
    }
}
