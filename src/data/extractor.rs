// ============================================================
// Layer 4: Token Extractor
// ============================================================
// Turns a corpus into one flat token stream:
//
//   for each file (in corpus order)
//       parse it            → ScoreView
//       pick the events     → first instrument part, or flat stream
//       map to tokens       → notes by name, chords by normal order
//
// A file that fails to parse is logged and skipped. Only a corpus
// that yields no tokens at all is an error.

use crate::data::corpus::Corpus;
use crate::domain::error::PipelineError;
use crate::domain::score::ScoreView;
use crate::domain::token::Token;
use crate::domain::traits::ScoreParser;

pub struct TokenExtractor<P: ScoreParser> {
    parser: P,
}

impl<P: ScoreParser> TokenExtractor<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    /// Extract the token stream of every file in the corpus, concatenated.
    pub fn extract(&self, corpus: &Corpus) -> Result<Vec<Token>, PipelineError> {
        let mut stream  = Vec::new();
        let mut skipped = 0usize;

        for (i, path) in corpus.files().iter().enumerate() {
            tracing::info!("[{:>3}] Parsing {}", i + 1, path.display());

            match self.parser.parse(path) {
                Ok(view) => {
                    if let ScoreView::Flat(_) = view {
                        tracing::debug!(
                            "'{}' has no instrument parts, using the flat event stream",
                            path.display()
                        );
                    }
                    let before = stream.len();
                    stream.extend(tokens_of(&view));
                    tracing::debug!("'{}' contributed {} tokens", path.display(), stream.len() - before);
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Skipping '{}': {:#}", path.display(), e);
                }
            }
        }

        if stream.is_empty() {
            return Err(PipelineError::InvalidCorpus {
                dir:    corpus.dir().to_path_buf(),
                reason: format!(
                    "no tokens extracted from {} files ({} failed to parse)",
                    corpus.files().len(),
                    skipped
                ),
            });
        }

        tracing::info!(
            "Extracted {} tokens from {} files ({} skipped)",
            stream.len(),
            corpus.files().len() - skipped,
            skipped
        );
        Ok(stream)
    }
}

/// Tokens of the events the extractor reads from a view.
pub fn tokens_of(view: &ScoreView) -> impl Iterator<Item = Token> + '_ {
    view.primary_events().iter().filter_map(|e| e.token())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{tests::midi_bytes, MidiLoader};
    use crate::domain::token::tokens;
    use std::fs;

    #[test]
    fn test_extracts_notes_and_chords_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        // a.mid: C4, then a C major chord
        fs::write(
            dir.path().join("a.mid"),
            midi_bytes(&[(None, vec![(0, 0, 60), (480, 0, 60), (0, 0, 64), (0, 0, 67)])]),
        )
        .unwrap();
        // b.mid: piano part (first) plus strings; only the piano is read
        fs::write(
            dir.path().join("b.mid"),
            midi_bytes(&[
                (Some(0),  vec![(0, 0, 62), (480, 0, 63)]),
                (Some(48), vec![(240, 0, 80)]),
            ]),
        )
        .unwrap();

        let corpus = Corpus::discover(dir.path(), "mid").unwrap();
        let stream = TokenExtractor::new(MidiLoader::new()).extract(&corpus).unwrap();
        assert_eq!(stream, tokens(["C4", "0.4.7", "D4", "E-4"]));
    }

    #[test]
    fn test_unparseable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_broken.mid"), b"garbage").unwrap();
        fs::write(dir.path().join("b_good.mid"), midi_bytes(&[(None, vec![(0, 0, 69)])])).unwrap();

        let corpus = Corpus::discover(dir.path(), "mid").unwrap();
        let stream = TokenExtractor::new(MidiLoader::new()).extract(&corpus).unwrap();
        assert_eq!(stream, tokens(["A4"]));
    }

    #[test]
    fn test_corpus_without_tokens_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.mid"), b"garbage").unwrap();
        // only percussion: parses fine but yields nothing
        fs::write(dir.path().join("drums.mid"), midi_bytes(&[(None, vec![(0, 9, 36)])])).unwrap();

        let corpus = Corpus::discover(dir.path(), "mid").unwrap();
        let err = TokenExtractor::new(MidiLoader::new()).extract(&corpus).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCorpus { .. }));
    }
}
