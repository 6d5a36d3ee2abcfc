// ============================================================
// Layer 6: Token Stream Store
// ============================================================
// Caches the extracted token stream so a second run over the
// same corpus skips MIDI parsing.
//
//   data/
//     notes-1a2b3c4d.bin    ← bincode Vec<Token>
//
// The hex suffix is the corpus fingerprint (CRC-32 of file names
// and contents). Adding, removing, or editing a file changes the
// fingerprint, so a stale stream is never picked up. The stream
// is always re-extracted when `reextract` is set.
//
// Without a corpus to fingerprint, `load_latest` returns the most
// recently written stream. Resuming relies on it when the corpus
// directory is gone; the checkpoint's vocabulary check still applies.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::corpus::Corpus;
use crate::domain::token::Token;

pub struct TokenStreamStore {
    dir: PathBuf,
}

impl TokenStreamStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where the stream for a corpus with this fingerprint is kept
    pub fn path_for(&self, fingerprint: u32) -> PathBuf {
        self.dir.join(format!("notes-{fingerprint:08x}.bin"))
    }

    /// Load the cached stream for this corpus, or run `extract` and cache
    /// its result.
    pub fn load_or_extract<F>(&self, corpus: &Corpus, reextract: bool, extract: F) -> Result<Vec<Token>>
    where
        F: FnOnce() -> Result<Vec<Token>>,
    {
        let path = self.path_for(corpus.fingerprint()?);

        if !reextract && path.exists() {
            match Self::load(&path) {
                Ok(stream) => {
                    tracing::info!(
                        "Loaded {} tokens from '{}'",
                        stream.len(),
                        path.display()
                    );
                    return Ok(stream);
                }
                Err(e) => tracing::warn!("Ignoring unreadable token cache: {e:#}"),
            }
        }

        let stream = extract()?;
        self.save(&path, &stream)?;
        tracing::info!("Saved {} tokens to '{}'", stream.len(), path.display());
        Ok(stream)
    }

    /// The most recently written cached stream, if any
    pub fn load_latest(&self) -> Result<Option<(PathBuf, Vec<Token>)>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Cannot list '{}'", self.dir.display()))
            }
        };

        let latest = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                name.starts_with("notes-") && name.ends_with(".bin")
            })
            .filter_map(|e| Some((e.metadata().ok()?.modified().ok()?, e.path())))
            .max_by_key(|(modified, _)| *modified);

        match latest {
            Some((_, path)) => {
                let stream = Self::load(&path)?;
                Ok(Some((path, stream)))
            }
            None => Ok(None),
        }
    }

    fn load(path: &Path) -> Result<Vec<Token>> {
        let bytes = fs::read(path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        bincode::deserialize(&bytes)
            .with_context(|| format!("Cannot decode '{}'", path.display()))
    }

    fn save(&self, path: &Path, stream: &[Token]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create data directory '{}'", self.dir.display()))?;
        fs::write(path, bincode::serialize(stream)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::tokens;
    use std::cell::Cell;

    fn corpus_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Corpus) {
        let dir = tempfile::tempdir().unwrap();
        for (name, bytes) in files {
            fs::write(dir.path().join(name), bytes.as_bytes()).unwrap();
        }
        let corpus = Corpus::discover(dir.path(), "mid").unwrap();
        (dir, corpus)
    }

    #[test]
    fn test_second_run_reads_the_cache() {
        let (_songs, corpus) = corpus_with(&[("a.mid", "one")]);
        let data  = tempfile::tempdir().unwrap();
        let store = TokenStreamStore::new(data.path());
        let calls = Cell::new(0);
        let extract = || {
            calls.set(calls.get() + 1);
            Ok(tokens(["C4", "0.4.7", "D4"]))
        };

        let first  = store.load_or_extract(&corpus, false, extract).unwrap();
        let second = store.load_or_extract(&corpus, false, extract).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert!(store.path_for(corpus.fingerprint().unwrap()).exists());
    }

    #[test]
    fn test_reextract_ignores_the_cache() {
        let (_songs, corpus) = corpus_with(&[("a.mid", "one")]);
        let data  = tempfile::tempdir().unwrap();
        let store = TokenStreamStore::new(data.path());

        store.load_or_extract(&corpus, false, || Ok(tokens(["C4"]))).unwrap();
        let fresh = store.load_or_extract(&corpus, true, || Ok(tokens(["D4"]))).unwrap();
        assert_eq!(fresh, tokens(["D4"]));
    }

    #[test]
    fn test_changed_corpus_gets_its_own_stream() {
        let data  = tempfile::tempdir().unwrap();
        let store = TokenStreamStore::new(data.path());

        let (_a, before) = corpus_with(&[("a.mid", "one")]);
        let (_b, after)  = corpus_with(&[("a.mid", "two")]);
        store.load_or_extract(&before, false, || Ok(tokens(["C4"]))).unwrap();
        let stream = store.load_or_extract(&after, false, || Ok(tokens(["E4"]))).unwrap();
        assert_eq!(stream, tokens(["E4"]));
    }

    #[test]
    fn test_corrupt_cache_is_rebuilt() {
        let (_songs, corpus) = corpus_with(&[("a.mid", "one")]);
        let data  = tempfile::tempdir().unwrap();
        let store = TokenStreamStore::new(data.path());
        fs::write(store.path_for(corpus.fingerprint().unwrap()), b"\xff").unwrap();

        let stream = store.load_or_extract(&corpus, false, || Ok(tokens(["F4"]))).unwrap();
        assert_eq!(stream, tokens(["F4"]));
    }

    #[test]
    fn test_latest_stream_is_found_without_a_corpus() {
        let data  = tempfile::tempdir().unwrap();
        let store = TokenStreamStore::new(data.path());
        assert!(store.load_latest().unwrap().is_none());

        let (_a, old) = corpus_with(&[("a.mid", "one")]);
        store.load_or_extract(&old, false, || Ok(tokens(["C4"]))).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let (_b, new) = corpus_with(&[("b.mid", "two")]);
        store.load_or_extract(&new, false, || Ok(tokens(["D4", "E4"]))).unwrap();

        let (path, stream) = store.load_latest().unwrap().unwrap();
        assert_eq!(path, store.path_for(new.fingerprint().unwrap()));
        assert_eq!(stream, tokens(["D4", "E4"]));
    }

    #[test]
    fn test_missing_data_dir_has_no_latest_stream() {
        let data  = tempfile::tempdir().unwrap();
        let store = TokenStreamStore::new(data.path().join("never-created"));
        assert!(store.load_latest().unwrap().is_none());
    }
}
