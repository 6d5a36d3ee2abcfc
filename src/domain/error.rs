// ============================================================
// Layer 3: Pipeline Errors
// ============================================================
// Every failure that aborts a run has a variant here.
// Per-file parse failures are NOT in this list: the extractor
// logs them and moves on to the next file.
//
// The application layer wraps these in anyhow::Error with extra
// context, so callers can still downcast to the typed variant.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The corpus is missing, unreadable, or produced no tokens at all
    #[error("invalid corpus '{dir}': {reason}")]
    InvalidCorpus { dir: PathBuf, reason: String },

    /// Not enough tokens to build even one training window
    #[error("insufficient data: {tokens} tokens cannot fill a window of {window} plus a target")]
    InsufficientData { tokens: usize, window: usize },

    /// Window length must be at least one token
    #[error("window length must be at least 1")]
    InvalidWindow,

    /// The checkpoint could not be read, decoded, or rebuilt
    #[error("cannot resume from '{path}': {reason}")]
    CheckpointLoad { path: PathBuf, reason: String },

    /// The checkpoint was trained on windows of a different length
    #[error("window mismatch: checkpoint was trained with windows of {expected}, run uses {found}")]
    WindowMismatch { expected: usize, found: usize },

    /// The rebuilt vocabulary does not match the one the checkpoint was trained with
    #[error(
        "vocabulary mismatch: checkpoint was trained on {expected} tokens, \
         current corpus has {found}{detail}"
    )]
    VocabularyMismatch {
        expected: usize,
        found:    usize,
        detail:   String,
    },
}
