// ─── Stager ───
// End-to-end workflows for one Minecraft version: descriptor, singleton
// artifacts, asset objects and client extraction.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::core::assets::{
    AssetSyncEngine, CancelFlag, ManifestIndex, SyncObserver, SyncReport, TracingObserver,
};
use crate::core::downloader::{file_matches, Downloader, FetchedArtifact};
use crate::core::error::{StageError, StageResult};
use crate::core::extract::{extract_jar, ExtractSummary};
use crate::core::settings::StageSettings;
use crate::core::version::{DownloadKind, VersionManifest, VersionPackage, VERSION_MANIFEST_URL};

const VERSION_JSON: &str = "version.json";

pub struct Stager {
    settings: StageSettings,
    downloader: Downloader,
    observer: Arc<dyn SyncObserver>,
    cancel: CancelFlag,
    manifest_url: String,
}

impl Stager {
    /// Stager over a fresh HTTP client.
    pub fn new(settings: StageSettings) -> StageResult<Self> {
        Self::with_downloader(settings, Downloader::http()?)
    }

    pub fn with_downloader(settings: StageSettings, downloader: Downloader) -> StageResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            downloader,
            observer: Arc::new(TracingObserver),
            cancel: CancelFlag::new(),
            manifest_url: VERSION_MANIFEST_URL.to_string(),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Use a different version manifest (mirrors, tests).
    pub fn with_manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_url = url.into();
        self
    }

    pub fn settings(&self) -> &StageSettings {
        &self.settings
    }

    /// Handle that cancels in-flight asset syncs started by this stager.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.settings.output_dir.join(version)
    }

    pub fn assets_dir(&self, version: &str) -> PathBuf {
        self.version_dir(version).join("assets")
    }

    // ── Version descriptor ──────────────────────────────

    /// Resolve `version` in the launcher manifest and store its descriptor as
    /// `<version>/version.json`. A stored descriptor whose SHA-1 matches the
    /// manifest entry is reused.
    pub async fn prepare_version(&self, version: &str) -> StageResult<VersionPackage> {
        let manifest =
            VersionManifest::fetch_from(self.downloader.transport(), &self.manifest_url).await?;
        let entry = manifest.require_version(version)?;
        let path = self.version_dir(version).join(VERSION_JSON);

        if let Some(sha1) = entry.sha1.as_deref() {
            if file_matches(&path, sha1).await? {
                info!("Version descriptor for {} is up to date", version);
                return VersionPackage::from_path(&path).await;
            }
        }

        let (package, raw) = VersionPackage::fetch(self.downloader.transport(), &entry.url).await?;
        VersionPackage::save_to(&raw, &path).await?;
        info!("Stored version descriptor for {} at {:?}", version, path);
        Ok(package)
    }

    /// Read the stored descriptor of a prepared version.
    pub async fn load_version(&self, version: &str) -> StageResult<VersionPackage> {
        VersionPackage::from_path(&self.version_dir(version).join(VERSION_JSON)).await
    }

    // ── Singleton artifacts ─────────────────────────────

    pub async fn download_artifact(
        &self,
        version: &str,
        kind: DownloadKind,
    ) -> StageResult<FetchedArtifact> {
        let package = self.load_version(version).await?;
        let artifact = package.downloads.require(kind)?;
        let fetched = self
            .downloader
            .fetch_artifact(
                artifact,
                &self.version_dir(version),
                &kind.sidecar_name(),
                kind.file_name(),
            )
            .await?;

        info!("{} for {} available at {:?}", kind.label(), version, fetched.path);
        Ok(fetched)
    }

    pub async fn download_client(&self, version: &str) -> StageResult<FetchedArtifact> {
        self.download_artifact(version, DownloadKind::Client).await
    }

    pub async fn download_client_mappings(&self, version: &str) -> StageResult<FetchedArtifact> {
        self.download_artifact(version, DownloadKind::ClientMappings)
            .await
    }

    pub async fn download_server(&self, version: &str) -> StageResult<FetchedArtifact> {
        self.download_artifact(version, DownloadKind::Server).await
    }

    pub async fn download_server_mappings(&self, version: &str) -> StageResult<FetchedArtifact> {
        self.download_artifact(version, DownloadKind::ServerMappings)
            .await
    }

    /// Fetch the client logging configuration as `<version>/<file id>`.
    pub async fn download_logging_config(&self, version: &str) -> StageResult<FetchedArtifact> {
        let package = self.load_version(version).await?;
        let file = &package.client_logging()?.file;
        if Path::new(&file.id).file_name() != Some(OsStr::new(&file.id)) {
            return Err(StageError::InvalidManifest(format!(
                "logging file id is not a file name: {}",
                file.id
            )));
        }

        let fetched = self
            .downloader
            .fetch_artifact(
                &file.artifact,
                &self.version_dir(version),
                &format!("{}.sha1", file.id),
                &file.id,
            )
            .await?;

        info!("Logging config for {} available at {:?}", version, fetched.path);
        Ok(fetched)
    }

    // ── Assets ──────────────────────────────────────────

    /// Sync every asset object of `version` and write its index.
    ///
    /// The index is written even when some objects failed; the failures are
    /// then returned as one `IncompleteSync` error naming every affected key.
    pub async fn download_assets(&self, version: &str) -> StageResult<SyncReport> {
        let package = self.load_version(version).await?;
        let manifest =
            ManifestIndex::fetch(self.downloader.transport(), &package.asset_index.url).await?;

        let assets_dir = self.assets_dir(version);
        let objects_dir = assets_dir.join("objects");
        let index_path = assets_dir
            .join("indexes")
            .join(format!("{}.json", package.asset_index.id));
        let cache_dir = self.settings.local_objects_dir().filter(|dir| dir.is_dir());

        let engine = AssetSyncEngine::new(self.downloader.clone(), self.settings.sync_options())?
            .with_observer(self.observer.clone())
            .with_cancel_flag(self.cancel.clone());
        let report = engine
            .sync(&manifest, cache_dir.as_deref(), &objects_dir)
            .await?;

        report.output_index.write_to(&index_path).await?;
        report.into_result()
    }

    // ── Client extraction ───────────────────────────────

    /// Unpack `<version>/client.jar` into `<version>/client/`.
    pub async fn extract_client(&self, version: &str) -> StageResult<ExtractSummary> {
        let version_dir = self.version_dir(version);
        require_exists(&version_dir, "Version directory")?;

        let jar_path = version_dir.join(DownloadKind::Client.file_name());
        require_exists(&jar_path, "Client jar")?;

        let output_dir = version_dir.join("client");
        tokio::task::spawn_blocking(move || extract_jar(&jar_path, &output_dir))
            .await
            .map_err(|e| StageError::Other(format!("Extraction task failed: {e}")))?
    }
}

fn require_exists(path: &Path, what: &str) -> StageResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(StageError::Other(format!("{what} does not exist: {path:?}")))
    }
}
