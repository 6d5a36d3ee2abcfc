// ============================================================
// Layer 4: Windower / Encoder
// ============================================================
// Slides a window of W tokens over the token stream, one token
// at a time. Each position yields a training pair:
//
//   history = stream[i .. i+W]     (W tokens)
//   target  = stream[i+W]          (the token that follows)
//
// Example with W=3:
//   stream:   C4  D4  E4  C.D  F4
//   window 0: [C4 D4 E4]  → C.D
//   window 1: [D4 E4 C.D] → F4
//
// A stream of length L yields max(0, L - W) windows.
//
// Encoding:
//   history values = id / vocab_size   (always in [0, 1))
//   target         = one-hot vector of width vocab_size
//
// The scale depends on the vocabulary size alone, never on the
// values inside a window.

use std::collections::BTreeSet;

use crate::data::dataset::EncodedDataset;
use crate::domain::error::PipelineError;
use crate::domain::token::Token;
use crate::domain::vocabulary::Vocabulary;

/// A raw (un-normalised) training window over an id stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window<'a> {
    pub history: &'a [usize],
    pub target:  usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Windower {
    window_len: usize,
}

impl Windower {
    /// A windower producing histories of `window_len` tokens (must be ≥ 1).
    pub fn new(window_len: usize) -> Result<Self, PipelineError> {
        if window_len == 0 {
            return Err(PipelineError::InvalidWindow);
        }
        Ok(Self { window_len })
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Number of windows a stream of `stream_len` tokens yields
    pub fn window_count(&self, stream_len: usize) -> usize {
        stream_len.saturating_sub(self.window_len)
    }

    /// Window `i` of an id stream, or None past the last window
    pub fn window<'a>(&self, ids: &'a [usize], i: usize) -> Option<Window<'a>> {
        if i >= self.window_count(ids.len()) {
            return None;
        }
        Some(Window {
            history: &ids[i..i + self.window_len],
            target:  ids[i + self.window_len],
        })
    }

    /// Encode a token stream against a vocabulary.
    ///
    /// Fails with InsufficientData when the stream has no more tokens
    /// than the window length, and with VocabularyMismatch when a token
    /// is missing from the vocabulary.
    pub fn encode(
        &self,
        stream: &[Token],
        vocab:  &Vocabulary,
    ) -> Result<EncodedDataset, PipelineError> {
        if self.window_count(stream.len()) == 0 {
            return Err(PipelineError::InsufficientData {
                tokens: stream.len(),
                window: self.window_len,
            });
        }

        let Some(ids) = vocab.encode_stream(stream) else {
            let distinct: BTreeSet<&Token> = stream.iter().collect();
            let unknown = stream
                .iter()
                .find(|t| vocab.id_of(t).is_none())
                .map_or_else(String::new, |t| format!("; token '{t}' is not in the vocabulary"));
            return Err(PipelineError::VocabularyMismatch {
                expected: vocab.len(),
                found:    distinct.len(),
                detail:   unknown,
            });
        };

        tracing::info!(
            "Prepared {} windows of {} tokens over a vocabulary of {}",
            self.window_count(ids.len()),
            self.window_len,
            vocab.len()
        );

        Ok(EncodedDataset::new(ids, *self, vocab.len()))
    }
}

/// Scale a token id into [0, 1)
pub fn normalize(id: usize, vocab_size: usize) -> f32 {
    id as f32 / vocab_size as f32
}

/// One-hot vector of width `vocab_size` with a 1 at `id`
pub fn one_hot(id: usize, vocab_size: usize) -> Vec<f32> {
    let mut v = vec![0.0; vocab_size];
    v[id] = 1.0;
    v
}
