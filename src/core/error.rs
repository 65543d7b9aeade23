use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the staging backend.
/// Every module returns `Result<T, StageError>`.
#[derive(Debug, Error)]
pub enum StageError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Failed to download {url}: {source}")]
    ArtifactDownload {
        url: String,
        #[source]
        source: Box<StageError>,
    },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Manifests ───────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid asset manifest: {0}")]
    InvalidManifest(String),

    #[error("Minecraft version {0} not found in manifest")]
    VersionNotFound(String),

    #[error("Version descriptor has no {0} download")]
    MissingDownload(String),

    // ── Asset sync ──────────────────────────────────────
    #[error(
        "Failed to download the following assets (Total: {failed}):\n{}\n\nSome assets failed to download! Run the asset download again to retry them.",
        failed_key_lines(.keys)
    )]
    IncompleteSync { failed: usize, keys: Vec<String> },

    #[error("Asset sync was cancelled")]
    Cancelled,

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Configuration ───────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

fn failed_key_lines(keys: &[String]) -> String {
    keys.iter()
        .map(|key| format!("Asset: {key}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convenience alias used throughout the crate.
pub type StageResult<T> = Result<T, StageError>;

impl StageError {
    /// Attach a path to a bare `std::io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StageError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for StageError {
    fn from(source: std::io::Error) -> Self {
        StageError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
