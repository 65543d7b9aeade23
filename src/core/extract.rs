use std::path::Path;

use tracing::info;

use crate::core::error::{StageError, StageResult};

/// Counts from one extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub dirs: usize,
}

/// Unpack every entry of a jar into `output_dir`, creating directories as
/// needed. Existing files are overwritten. Blocking; call through
/// `spawn_blocking` from async code.
pub fn extract_jar(jar_path: &Path, output_dir: &Path) -> StageResult<ExtractSummary> {
    let jar_file = std::fs::File::open(jar_path).map_err(|e| StageError::io(jar_path, e))?;
    let mut archive = zip::ZipArchive::new(jar_file)?;

    std::fs::create_dir_all(output_dir).map_err(|e| StageError::io(output_dir, e))?;

    let mut summary = ExtractSummary::default();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let rel_path = entry
            .enclosed_name()
            .ok_or_else(|| StageError::Other(format!("Unsafe jar entry path: {}", entry.name())))?;
        let out_path = output_dir.join(rel_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| StageError::io(&out_path, e))?;
            summary.dirs += 1;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StageError::io(parent, e))?;
        }

        let mut out = std::fs::File::create(&out_path).map_err(|e| StageError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| StageError::io(&out_path, e))?;
        summary.files += 1;
    }

    info!(
        "Extracted {} files and {} directories from {:?}",
        summary.files, summary.dirs, jar_path
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    fn build_jar(path: &Path, entries: &[(&str, Option<&[u8]>)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, body) in entries {
            match body {
                Some(body) => {
                    writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                    writer.write_all(body).unwrap();
                }
                None => writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap(),
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("client.jar");
        build_jar(
            &jar,
            &[
                ("META-INF/", None),
                ("META-INF/MANIFEST.MF", Some(b"Manifest-Version: 1.0\n")),
                ("net/minecraft/client/Main.class", Some(b"\xca\xfe\xba\xbe")),
            ],
        );

        let out = dir.path().join("client");
        let summary = extract_jar(&jar, &out).unwrap();

        assert_eq!(summary, ExtractSummary { files: 2, dirs: 1 });
        assert_eq!(
            std::fs::read(out.join("net/minecraft/client/Main.class")).unwrap(),
            b"\xca\xfe\xba\xbe"
        );
    }

    #[test]
    fn rejects_escaping_entries() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("evil.jar");
        build_jar(&jar, &[("../outside.txt", Some(b"nope"))]);

        let err = extract_jar(&jar, &dir.path().join("client")).unwrap_err();
        assert!(matches!(err, StageError::Other(_)));
        assert!(!dir.path().join("outside.txt").exists());
    }

    #[test]
    fn missing_jar_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_jar(&dir.path().join("client.jar"), dir.path()).unwrap_err();
        assert!(matches!(err, StageError::Io { .. }));
    }
}
