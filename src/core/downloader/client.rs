use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::downloader::hasher::sha1_bytes;
use crate::core::error::{StageError, StageResult};
use crate::core::http::{HttpTransport, Transport};

const PART_SUFFIX: &str = ".part";

/// A downloaded payload sitting next to its final location, not yet visible
/// under the final name.
#[derive(Debug)]
pub struct StagedFile {
    temp: PathBuf,
    dest: PathBuf,
    len: u64,
}

impl StagedFile {
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Atomically move the payload into its final name. The temp file is
    /// removed if the rename fails.
    pub async fn commit(self) -> StageResult<PathBuf> {
        if let Err(e) = tokio::fs::rename(&self.temp, &self.dest).await {
            let _ = tokio::fs::remove_file(&self.temp).await;
            return Err(StageError::io(&self.dest, e));
        }
        Ok(self.dest)
    }

    /// Remove the temporary payload. Best-effort.
    pub async fn discard(self) {
        let _ = tokio::fs::remove_file(&self.temp).await;
    }
}

/// Fetches single URLs to disk, optionally validating SHA-1.
///
/// Fan-out lives in the asset engine; this type only knows about one file.
#[derive(Clone)]
pub struct Downloader {
    transport: Arc<dyn Transport>,
}

impl Downloader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Downloader over a fresh `reqwest` client.
    pub fn http() -> StageResult<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new()?)))
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    // ── Single file download ────────────────────────────

    /// Download `url` to `dest`, optionally validating SHA-1.
    ///
    /// Creates parent directories as needed. The payload is written to a
    /// sibling `.part` file and renamed into place, so `dest` never holds a
    /// partial body.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> StageResult<u64> {
        let staged = self.stage_file(url, dest, sha1_expected).await?;
        let len = staged.len();
        staged.commit().await?;
        Ok(len)
    }

    /// Download `url` into a temporary sibling of `dest` without exposing it.
    pub async fn stage_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> StageResult<StagedFile> {
        ensure_parent_dir(dest).await?;

        let bytes = self.transport.get(url).await?;

        // Validate before anything touches the disk
        if let Some(expected) = sha1_expected {
            let actual = sha1_bytes(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(StageError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        let temp = part_path(dest);
        if let Err(e) = write_file(&temp, &bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(StagedFile {
            temp,
            dest: dest.to_path_buf(),
            len: bytes.len() as u64,
        })
    }
}

/// Create the parent directory of `path` if it has one.
pub async fn ensure_parent_dir(path: &Path) -> StageResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StageError::io(parent, e))?;
    }
    Ok(())
}

/// Write `bytes` to `path`, dropping the handle before returning.
pub async fn write_file(path: &Path, bytes: &[u8]) -> StageResult<()> {
    // Scoped so the handle is closed before any rename (Windows sharing rules)
    {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| StageError::io(path, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| StageError::io(path, e))?;
        file.flush().await.map_err(|e| StageError::io(path, e))?;
    }
    Ok(())
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(PART_SUFFIX);
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::hasher::sha1_file;
    use async_trait::async_trait;

    struct StaticTransport(&'static [u8]);

    #[async_trait]
    impl Transport for StaticTransport {
        async fn get(&self, _url: &str) -> StageResult<Vec<u8>> {
            Ok(self.0.to_vec())
        }
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/tmp/v/server.jar")),
            PathBuf::from("/tmp/v/server.jar.part")
        );
    }

    #[tokio::test]
    async fn download_creates_parents_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a").join("b").join("file.txt");
        let downloader = Downloader::new(Arc::new(StaticTransport(b"hello\n")));

        let len = downloader
            .download_file(
                "http://unused",
                &dest,
                Some("f572d396fae9206628714fb2ce00f72e94f2258f"),
            )
            .await
            .unwrap();

        assert_eq!(len, 6);
        assert_eq!(
            sha1_file(&dest).await.unwrap(),
            "f572d396fae9206628714fb2ce00f72e94f2258f"
        );
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn mismatch_leaves_nothing_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("file.txt");
        let downloader = Downloader::new(Arc::new(StaticTransport(b"tampered")));

        let err = downloader
            .download_file(
                "http://unused",
                &dest,
                Some("f572d396fae9206628714fb2ce00f72e94f2258f"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StageError::Sha1Mismatch { .. }));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn staged_file_is_hidden_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("server.jar");
        let downloader = Downloader::new(Arc::new(StaticTransport(b"jar")));

        let staged = downloader
            .stage_file("http://unused", &dest, None)
            .await
            .unwrap();
        assert!(!dest.exists());

        let committed = staged.commit().await.unwrap();
        assert_eq!(committed, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jar");
    }

    #[tokio::test]
    async fn failed_commit_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("server.jar");
        let downloader = Downloader::new(Arc::new(StaticTransport(b"jar")));

        let staged = downloader
            .stage_file("http://unused", &dest, None)
            .await
            .unwrap();
        assert!(part_path(&dest).exists());

        // A non-empty directory in the way makes the rename fail
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("occupied"), b"x").unwrap();

        let err = staged.commit().await.unwrap_err();
        assert!(matches!(err, StageError::Io { .. }));
        assert!(!part_path(&dest).exists());
    }
}
