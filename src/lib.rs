pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::assets::{
    AssetSyncEngine, CancelFlag, FailureRecord, ManifestIndex, SyncObserver, SyncOptions,
    SyncReport,
};
pub use crate::core::downloader::{Downloader, FetchedArtifact, SingleArtifact};
pub use crate::core::error::{StageError, StageResult};
pub use crate::core::http::{HttpTransport, Transport};
pub use crate::core::settings::StageSettings;
pub use crate::core::stager::Stager;

/// Install the default `tracing` subscriber.
///
/// Honors `RUST_LOG`; otherwise logs `info` globally and `debug` for this crate.
/// Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mcstage_lib=debug")),
        )
        .try_init();
}
