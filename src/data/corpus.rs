// ============================================================
// Layer 4: Corpus Discovery
// ============================================================
// Finds the music files of a flat corpus directory.
//
// Files are matched by extension (case-insensitive) and sorted
// by file name, so the token stream comes out in the same order
// on every machine regardless of how the filesystem lists them.
//
// The corpus fingerprint is a CRC-32 over every file name and
// file body in that order. It keys the cached token stream:
// change, add, remove or rename any file and the key changes.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::PipelineError;

#[derive(Debug, Clone)]
pub struct Corpus {
    dir:   PathBuf,
    files: Vec<PathBuf>,
}

impl Corpus {
    /// List the files in `dir` whose extension matches `extension`.
    ///
    /// A missing directory, an unreadable directory, or one with no
    /// matching files is an InvalidCorpus error.
    pub fn discover(dir: impl AsRef<Path>, extension: &str) -> Result<Self, PipelineError> {
        let dir = dir.as_ref().to_path_buf();
        let invalid = |reason: String| PipelineError::InvalidCorpus {
            dir:    dir.clone(),
            reason,
        };

        let entries = fs::read_dir(&dir)
            .map_err(|e| invalid(format!("cannot read directory: {e}")))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| invalid(format!("cannot list directory: {e}")))?
                .path();

            let matches = path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension));

            if matches {
                files.push(path);
            }
        }

        if files.is_empty() {
            return Err(invalid(format!("no .{extension} files found")));
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        tracing::debug!("Discovered {} .{} files in '{}'", files.len(), extension, dir.display());

        Ok(Self { dir, files })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files in extraction order
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// CRC-32 over file names and contents, in extraction order.
    pub fn fingerprint(&self) -> Result<u32> {
        let mut hasher = crc32fast::Hasher::new();
        for path in &self.files {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            hasher.update(name.as_bytes());
            hasher.update(&[0]);

            let bytes = fs::read(path)
                .with_context(|| format!("Cannot read '{}' for fingerprinting", path.display()))?;
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
        Ok(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mid", "a.MID", "c.mid", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.mid")).unwrap();

        let corpus = Corpus::discover(dir.path(), "mid").unwrap();
        let names: Vec<String> = corpus
            .files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.MID", "b.mid", "c.mid"]);
    }

    #[test]
    fn test_missing_directory_is_invalid_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let err = Corpus::discover(dir.path().join("nope"), "mid").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCorpus { .. }));
    }

    #[test]
    fn test_directory_without_matches_is_invalid_corpus() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), b"hi").unwrap();
        let err = Corpus::discover(dir.path(), "mid").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCorpus { .. }));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.mid");
        fs::write(&file, b"first").unwrap();
        let before = Corpus::discover(dir.path(), "mid").unwrap().fingerprint().unwrap();
        let again  = Corpus::discover(dir.path(), "mid").unwrap().fingerprint().unwrap();
        assert_eq!(before, again);

        fs::write(&file, b"second").unwrap();
        let after = Corpus::discover(dir.path(), "mid").unwrap().fingerprint().unwrap();
        assert_ne!(before, after);
    }
}
