use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::assets::{SyncOptions, DEFAULT_ASSETS_URL, DEFAULT_CONCURRENCY};
use crate::core::error::{StageError, StageResult};

const APP_DIR_NAME: &str = "mcstage";

/// User-facing configuration for staging runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    pub assets_url: String,
    pub concurrent_connections: usize,
    /// Root under which `<version>/` directories are staged.
    pub output_dir: PathBuf,
    /// Local Minecraft installation whose `assets/objects` serves as a cache.
    pub minecraft_dir: Option<PathBuf>,
    pub verify_downloads: bool,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            assets_url: DEFAULT_ASSETS_URL.to_string(),
            concurrent_connections: DEFAULT_CONCURRENCY,
            output_dir: default_output_dir(),
            minecraft_dir: default_minecraft_dir(),
            verify_downloads: true,
        }
    }
}

impl StageSettings {
    /// Load settings from a JSON file; a missing file yields the defaults.
    pub fn load(path: &Path) -> StageResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(StageError::io(path, e)),
        };

        let settings: StageSettings = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> StageResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StageError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| StageError::io(path, e))
    }

    pub fn validate(&self) -> StageResult<()> {
        self.sync_options().validate()
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            base_url: self.assets_url.clone(),
            concurrency: self.concurrent_connections,
            verify_downloads: self.verify_downloads,
        }
    }

    /// `assets/objects` of the local installation, if one is configured.
    pub fn local_objects_dir(&self) -> Option<PathBuf> {
        self.minecraft_dir
            .as_ref()
            .map(|dir| dir.join("assets").join("objects"))
    }
}

fn default_output_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Platform location of the vanilla launcher's game directory.
pub fn default_minecraft_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::config_dir().map(|d| d.join(".minecraft"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir().map(|d| d.join("minecraft"))
    } else {
        dirs::home_dir().map(|d| d.join(".minecraft"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_public_endpoints() {
        let settings = StageSettings::default();
        assert_eq!(settings.assets_url, "https://resources.download.minecraft.net/");
        assert_eq!(settings.concurrent_connections, 8);
        assert!(settings.verify_downloads);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StageSettings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, StageSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"concurrent_connections": 2}"#).unwrap();

        let settings = StageSettings::load(&path).unwrap();
        assert_eq!(settings.concurrent_connections, 2);
        assert_eq!(settings.assets_url, DEFAULT_ASSETS_URL);
    }

    #[test]
    fn zero_connections_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"concurrent_connections": 0}"#).unwrap();

        assert!(matches!(
            StageSettings::load(&path),
            Err(StageError::InvalidConfig(_))
        ));
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = StageSettings {
            assets_url: "http://mirror.local/objects/".into(),
            concurrent_connections: 3,
            output_dir: dir.path().join("out"),
            minecraft_dir: None,
            verify_downloads: false,
        };

        settings.save(&path).unwrap();
        assert_eq!(StageSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn local_objects_dir_points_into_assets() {
        let settings = StageSettings {
            minecraft_dir: Some(PathBuf::from("/games/.minecraft")),
            ..StageSettings::default()
        };
        assert_eq!(
            settings.local_objects_dir(),
            Some(PathBuf::from("/games/.minecraft/assets/objects"))
        );
    }
}
