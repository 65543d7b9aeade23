pub mod engine;
pub mod index;
pub mod plan;

pub use engine::{
    AssetSyncEngine, CancelFlag, FailureRecord, SyncObserver, SyncOptions, SyncReport,
    SyncStats, TracingObserver, DEFAULT_ASSETS_URL, DEFAULT_CONCURRENCY,
};
pub use index::{AssetIndexJson, AssetObject, AssetRecord, ManifestIndex};
pub use plan::{PlanEntry, SyncPlan};
