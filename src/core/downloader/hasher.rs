//! SHA-1 digests of local files, in the lowercase hex form used by
//! Mojang manifests.

use std::path::Path;

use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;

use crate::core::error::{StageError, StageResult};

const BUF_SIZE: usize = 64 * 1024;

/// Compute the SHA-1 of a file as lowercase hex.
///
/// Reads in chunks so large jars do not have to fit in memory.
pub async fn sha1_file(path: &Path) -> StageResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| StageError::io(path, e))?;

    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| StageError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// SHA-1 of an in-memory buffer as lowercase hex.
pub fn sha1_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// `true` when `path` is an existing file whose digest equals `expected`.
///
/// A missing file is `Ok(false)`; any other read failure is an error.
pub async fn file_matches(path: &Path, expected: &str) -> StageResult<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Ok(false),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(StageError::io(path, e)),
    }

    let actual = sha1_file(path).await?;
    Ok(actual.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA1: &str = "f572d396fae9206628714fb2ce00f72e94f2258f";

    #[tokio::test]
    async fn digest_of_empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let digest = sha1_file(f.path()).await.unwrap();
        assert_eq!(digest, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[tokio::test]
    async fn digest_matches_buffer_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello\n").unwrap();

        assert_eq!(sha1_file(&path).await.unwrap(), HELLO_SHA1);
        assert_eq!(sha1_bytes(b"hello\n"), HELLO_SHA1);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sha1_file(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, StageError::Io { .. }));
    }

    #[tokio::test]
    async fn file_matches_handles_absent_and_mismatched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        assert!(!file_matches(&path, HELLO_SHA1).await.unwrap());

        std::fs::write(&path, b"hello\n").unwrap();
        assert!(file_matches(&path, HELLO_SHA1).await.unwrap());
        assert!(file_matches(&path, &HELLO_SHA1.to_uppercase()).await.unwrap());
        assert!(!file_matches(&path, "0000000000000000000000000000000000000000")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn directory_never_matches() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!file_matches(dir.path(), HELLO_SHA1).await.unwrap());
    }
}
