pub mod manifest;
pub mod package;

pub use manifest::{VersionEntry, VersionManifest, VERSION_MANIFEST_URL};
pub use package::{
    AssetIndexInfo, ClientLogging, DownloadKind, Downloads, LoggingConfig, LoggingFile,
    VersionPackage,
};
