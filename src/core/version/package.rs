// ─── Version Package ───
// The per-version descriptor: where the asset index and the singleton
// downloads live.

use std::path::Path;

use serde::Deserialize;

use crate::core::downloader::client::{ensure_parent_dir, write_file};
use crate::core::downloader::SingleArtifact;
use crate::core::error::{StageError, StageResult};
use crate::core::http::Transport;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionPackage {
    pub id: String,
    pub asset_index: AssetIndexInfo,
    pub downloads: Downloads,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Downloads {
    #[serde(default)]
    pub client: Option<SingleArtifact>,
    #[serde(default)]
    pub client_mappings: Option<SingleArtifact>,
    #[serde(default)]
    pub server: Option<SingleArtifact>,
    #[serde(default)]
    pub server_mappings: Option<SingleArtifact>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub client: Option<ClientLogging>,
}

/// Log4j configuration handed to the client through `argument`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientLogging {
    pub argument: String,
    pub file: LoggingFile,
    #[serde(rename = "type")]
    pub config_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingFile {
    /// Also the file name the configuration is stored under.
    pub id: String,
    #[serde(flatten)]
    pub artifact: SingleArtifact,
}

/// The singleton downloads a version descriptor can list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    Client,
    ClientMappings,
    Server,
    ServerMappings,
}

impl DownloadKind {
    /// Key of the download in the descriptor.
    pub fn label(self) -> &'static str {
        match self {
            DownloadKind::Client => "client",
            DownloadKind::ClientMappings => "client_mappings",
            DownloadKind::Server => "server",
            DownloadKind::ServerMappings => "server_mappings",
        }
    }

    /// File name inside the version directory.
    pub fn file_name(self) -> &'static str {
        match self {
            DownloadKind::Client => "client.jar",
            DownloadKind::ClientMappings => "client_mappings.txt",
            DownloadKind::Server => "server.jar",
            DownloadKind::ServerMappings => "server_mappings.txt",
        }
    }

    /// Name of the digest sidecar next to the file.
    pub fn sidecar_name(self) -> String {
        format!("{}.sha1", self.file_name())
    }
}

impl Downloads {
    pub fn get(&self, kind: DownloadKind) -> Option<&SingleArtifact> {
        match kind {
            DownloadKind::Client => self.client.as_ref(),
            DownloadKind::ClientMappings => self.client_mappings.as_ref(),
            DownloadKind::Server => self.server.as_ref(),
            DownloadKind::ServerMappings => self.server_mappings.as_ref(),
        }
    }

    pub fn require(&self, kind: DownloadKind) -> StageResult<&SingleArtifact> {
        self.get(kind)
            .ok_or_else(|| StageError::MissingDownload(kind.label().to_string()))
    }
}

impl VersionPackage {
    pub fn client_logging(&self) -> StageResult<&ClientLogging> {
        self.logging
            .as_ref()
            .and_then(|logging| logging.client.as_ref())
            .ok_or_else(|| StageError::MissingDownload("logging.client".to_string()))
    }

    pub fn from_json(raw: &str) -> StageResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read a previously stored `version.json`.
    pub async fn from_path(path: &Path) -> StageResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StageError::io(path, e))?;
        Self::from_json(&raw)
    }

    /// Fetch and parse a version JSON, returning the raw text alongside.
    pub async fn fetch(transport: &dyn Transport, url: &str) -> StageResult<(Self, String)> {
        let body = transport.get(url).await?;
        let raw = String::from_utf8(body)
            .map_err(|e| StageError::Other(format!("version JSON is not UTF-8: {e}")))?;
        let package = Self::from_json(&raw)?;
        Ok((package, raw))
    }

    /// Save the raw version JSON to `path`.
    pub async fn save_to(raw_json: &str, path: &Path) -> StageResult<()> {
        ensure_parent_dir(path).await?;
        write_file(path, raw_json.as_bytes()).await
    }
}
