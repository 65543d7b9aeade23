use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::downloader::client::{ensure_parent_dir, write_file};
use crate::core::error::{StageError, StageResult};
use crate::core::http::Transport;

const SHA1_HEX_LEN: usize = 40;

/// Top-level asset index JSON structure, used both for reading and writing.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AssetIndexJson {
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

/// One logical asset. `path` is always derived from `hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    key: String,
    hash: String,
    size: u64,
    path: String,
}

impl AssetRecord {
    /// Build a record, rejecting anything that is not a 40 character hex SHA-1.
    pub fn new(key: impl Into<String>, hash: &str, size: u64) -> StageResult<Self> {
        let key = key.into();
        if hash.len() != SHA1_HEX_LEN || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StageError::InvalidManifest(format!(
                "asset '{key}' has invalid hash '{hash}'"
            )));
        }

        let hash = hash.to_ascii_lowercase();
        let path = object_path(&hash);
        Ok(Self {
            key,
            hash,
            size,
            path,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Relative object path, `<hash[0..2]>/<hash>`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn to_object(&self) -> AssetObject {
        AssetObject {
            hash: self.hash.clone(),
            size: self.size,
        }
    }
}

/// Relative location of an object: two-character shard directory, then the
/// full hash. Shared by the remote and local layouts.
pub fn object_path(hash: &str) -> String {
    format!("{}/{}", &hash[..2], hash)
}

/// Parsed asset index: logical key → record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestIndex {
    records: BTreeMap<String, AssetRecord>,
}

impl ManifestIndex {
    pub fn from_objects<I>(objects: I) -> StageResult<Self>
    where
        I: IntoIterator<Item = (String, AssetObject)>,
    {
        let mut records = BTreeMap::new();
        for (key, object) in objects {
            let record = AssetRecord::new(key.clone(), &object.hash, object.size)?;
            records.insert(key, record);
        }
        Ok(Self { records })
    }

    /// Parse an asset index document (`{"objects": {...}}`).
    pub fn from_json(raw: &str) -> StageResult<Self> {
        let parsed: AssetIndexJson = serde_json::from_str(raw)?;
        Self::from_objects(parsed.objects)
    }

    /// Fetch and parse an asset index. Exactly one GET, no retries.
    pub async fn fetch(transport: &dyn Transport, index_url: &str) -> StageResult<Self> {
        info!("Fetching asset index {}", index_url);

        let body = transport.get(index_url).await?;
        let raw = String::from_utf8(body).map_err(|e| {
            StageError::InvalidManifest(format!("asset index is not UTF-8: {e}"))
        })?;
        let index = Self::from_json(&raw)?;

        info!("Loaded {} asset entries", index.len());
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&AssetRecord> {
        self.records.get(key)
    }

    /// Records in lexicographic key order.
    pub fn records(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.values()
    }

    /// Every logical key whose record carries `hash`, in key order.
    pub fn keys_for_hash(&self, hash: &str) -> Vec<&str> {
        self.records
            .values()
            .filter(|r| r.hash.eq_ignore_ascii_case(hash))
            .map(|r| r.key.as_str())
            .collect()
    }

    /// The `{"objects": {...}}` shape with one entry per key.
    pub fn to_index_json(&self) -> AssetIndexJson {
        AssetIndexJson {
            objects: self
                .records
                .iter()
                .map(|(key, record)| (key.clone(), record.to_object()))
                .collect(),
        }
    }

    /// Persist the index at `out_path`, creating parent directories.
    pub async fn write_to(&self, out_path: &Path) -> StageResult<()> {
        let json = serde_json::to_string(&self.to_index_json())?;
        ensure_parent_dir(out_path).await?;
        write_file(out_path, json.as_bytes()).await?;
        info!("Wrote asset index with {} entries to {:?}", self.len(), out_path);
        Ok(())
    }
}
