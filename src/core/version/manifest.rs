// ─── Version Manifest ───
// Handles fetching and parsing the Mojang version manifest v2.

use serde::Deserialize;
use tracing::info;

use crate::core::error::{StageError, StageResult};
use crate::core::http::Transport;

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    /// Fetch the version manifest from Mojang.
    pub async fn fetch(transport: &dyn Transport) -> StageResult<Self> {
        Self::fetch_from(transport, VERSION_MANIFEST_URL).await
    }

    pub async fn fetch_from(transport: &dyn Transport, url: &str) -> StageResult<Self> {
        info!("Fetching Minecraft version manifest...");

        let body = transport.get(url).await?;
        let manifest: VersionManifest = serde_json::from_slice(&body)?;

        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Like `find_version`, but a missing version is an error.
    pub fn require_version(&self, id: &str) -> StageResult<&VersionEntry> {
        self.find_version(id)
            .ok_or_else(|| StageError::VersionNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_manifest_entry() {
        let json = r#"{
            "id": "1.20.4",
            "type": "release",
            "url": "https://example.com/1.20.4.json",
            "time": "2023-12-07T08:00:00+00:00",
            "sha1": "abc123"
        }"#;
        let entry: VersionEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, "1.20.4");
        assert_eq!(entry.version_type, "release");
        assert_eq!(entry.sha1.as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_version_is_reported() {
        let manifest: VersionManifest = serde_json::from_value(serde_json::json!({
            "versions": [
                {"id": "1.20.4", "type": "release", "url": "https://example.com/1.20.4.json"}
            ]
        }))
        .unwrap();

        assert!(manifest.require_version("1.20.4").is_ok());
        assert!(matches!(
            manifest.require_version("24w14a"),
            Err(StageError::VersionNotFound(id)) if id == "24w14a"
        ));
    }
}
