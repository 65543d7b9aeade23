use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::client::{write_file, Downloader};
use crate::core::error::{StageError, StageResult};

/// A singleton download (server jar, mappings) as listed in a version descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

/// Where a fetched artifact ended up and whether the network was touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArtifact {
    pub path: PathBuf,
    pub downloaded: bool,
}

impl Downloader {
    /// Fetch a singleton artifact into `dest_dir/file_name`, tracking its
    /// digest in `dest_dir/sidecar_name`.
    ///
    /// A sidecar whose content equals `artifact.sha1` (and an existing payload)
    /// short-circuits the whole call; the payload is trusted without
    /// re-hashing. Otherwise both files are removed and the payload is
    /// re-downloaded: body to a temp file, then the sidecar, then a rename of
    /// the body into place.
    pub async fn fetch_artifact(
        &self,
        artifact: &SingleArtifact,
        dest_dir: &Path,
        sidecar_name: &str,
        file_name: &str,
    ) -> StageResult<FetchedArtifact> {
        let dest = dest_dir.join(file_name);
        let sidecar = dest_dir.join(sidecar_name);

        if sidecar_matches(&sidecar, &dest, &artifact.sha1).await {
            debug!("{} is up to date, skipping download", file_name);
            return Ok(FetchedArtifact {
                path: dest,
                downloaded: false,
            });
        }

        remove_stale(&dest).await;
        remove_stale(&sidecar).await;

        info!("Downloading {} from {}", file_name, artifact.url);
        let staged = self
            .stage_file(&artifact.url, &dest, Some(&artifact.sha1))
            .await
            .map_err(|source| StageError::ArtifactDownload {
                url: artifact.url.clone(),
                source: Box::new(source),
            })?;

        if let Err(e) = write_file(&sidecar, artifact.sha1.as_bytes()).await {
            staged.discard().await;
            return Err(e);
        }

        let path = staged.commit().await?;
        Ok(FetchedArtifact {
            path,
            downloaded: true,
        })
    }
}

/// An unreadable sidecar counts as a mismatch, never as an error.
async fn sidecar_matches(sidecar: &Path, dest: &Path, expected: &str) -> bool {
    if !sidecar.is_file() || !dest.is_file() {
        return false;
    }

    match tokio::fs::read_to_string(sidecar).await {
        Ok(recorded) => recorded.trim().eq_ignore_ascii_case(expected),
        Err(e) => {
            warn!("Unreadable digest file {:?}, refetching: {}", sidecar, e);
            false
        }
    }
}

async fn remove_stale(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed stale {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove stale {:?}: {}", path, e),
    }
}
