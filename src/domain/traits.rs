// ============================================================
// Layer 3: Core Traits
// ============================================================
// The two collaborators the pipeline talks to without knowing
// their internals:
//
//   ScoreParser     - turns one music file into a ScoreView
//                     (implemented by data::loader::MidiLoader)
//
//   SequenceLearner - a trainable next-token model
//                     (implemented by ml::learner::BurnLearner)
//
// Neither trait mentions Burn or midly, so the training
// controller and the extractor can be tested with fakes.

use anyhow::Result;
use std::path::Path;

use crate::domain::score::ScoreView;

// ─── ScoreParser ──────────────────────────────────────────────────────────────
/// Anything that can read a music file into events.
pub trait ScoreParser {
    /// Parse one file. An Err means the file contributes no tokens;
    /// the caller logs it and continues with the next file.
    fn parse(&self, path: &Path) -> Result<ScoreView>;
}

// ─── SequenceLearner ──────────────────────────────────────────────────────────
/// A model that learns from the encoded dataset one epoch at a time.
pub trait SequenceLearner {
    /// Run one full pass over the training data.
    /// Returns the mean training loss of the epoch.
    fn fit_epoch(&mut self, epoch: usize) -> Result<f64>;

    /// Write the full parameter state to `path`.
    fn save_weights(&self, path: &Path) -> Result<()>;

    /// Write the optimizer's running state to `path`, so a resumed run
    /// continues with the same per-parameter step sizes.
    fn save_optimizer(&self, path: &Path) -> Result<()>;
}
