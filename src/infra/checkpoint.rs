// ============================================================
// Layer 6: Checkpoint Store
// ============================================================
// Writes and reads named model snapshots.
//
// What gets saved per checkpoint:
//   1. Model weights (.bin)        - Burn BinFileRecorder, full precision
//   2. Optimizer state (-optim.bin) - AdaGrad accumulators, same recorder
//   3. Metadata (.json)            - epoch, loss, window length, model
//                                    topology, and the ordered vocabulary
//
// File naming convention (all files share the stem):
//   checkpoints/
//     weights-improvement-10-2.3456-bigger.bin
//     weights-improvement-10-2.3456-bigger-optim.bin
//     weights-improvement-10-2.3456-bigger.json
//     weights-improvement-30-1.9876-bigger.bin
//     weights-improvement-30-1.9876-bigger-optim.bin
//     weights-improvement-30-1.9876-bigger.json
//     train_config.json
//     metrics.csv
//
// The epoch and loss in the name let tooling pick a checkpoint
// without opening it (see CheckpointId::parse). Checkpoints are
// never modified or deleted by this program.
//
// Loading rebuilds the network from the topology in the metadata,
// so a resumed run needs no architecture flags. Any failure while
// loading is a CheckpointLoad error, including weights whose shapes
// disagree with the metadata. Any one of the three files, or the
// bare stem, names the checkpoint.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    optim::Optimizer,
    prelude::*,
    record::Recorder,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::PipelineError;
use crate::domain::traits::SequenceLearner;
use crate::domain::vocabulary::Vocabulary;
use crate::ml::model::{recorder, MusicLstm, MusicLstmConfig};

const NAME_PREFIX: &str = "weights-improvement-";
const NAME_SUFFIX: &str = "-bigger";
const WEIGHTS_EXT: &str = "bin";
const META_EXT:    &str = "json";
const OPTIM_SUFFIX: &str = "-optim";

// ─── CheckpointId ─────────────────────────────────────────────────────────────
/// Identity of a checkpoint: the epoch it was taken at and its loss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckpointId {
    pub epoch: usize,
    pub loss:  f64,
}

impl CheckpointId {
    /// `weights-improvement-<epoch:02>-<loss:.4>-bigger`
    pub fn stem(&self) -> String {
        format!("{NAME_PREFIX}{:02}-{:.4}{NAME_SUFFIX}", self.epoch, self.loss)
    }

    /// Weights file name, stem plus `.bin`
    pub fn file_name(&self) -> String {
        format!("{}.{WEIGHTS_EXT}", self.stem())
    }

    /// Recover epoch and loss from a checkpoint file name (any extension).
    /// The loss comes back rounded to the 4 decimals of the name.
    pub fn parse(file_name: &str) -> Option<Self> {
        let rest = file_name.strip_prefix(NAME_PREFIX)?;
        let end  = rest.rfind(NAME_SUFFIX)?;
        let (epoch, loss) = rest[..end].split_once('-')?;
        Some(Self {
            epoch: epoch.parse().ok()?,
            loss:  loss.parse().ok()?,
        })
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

// ─── CheckpointFiles ──────────────────────────────────────────────────────────
/// Paths of the files that make up one checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointFiles {
    pub weights:   PathBuf,
    pub optimizer: PathBuf,
    pub meta:      PathBuf,
}

impl CheckpointFiles {
    // Burn's file recorders call set_extension on their path, so the
    // recorded paths must already end in `.bin`.
    fn from_stem(dir: &Path, stem: &str) -> Self {
        Self {
            weights:   dir.join(format!("{stem}.{WEIGHTS_EXT}")),
            optimizer: dir.join(format!("{stem}{OPTIM_SUFFIX}.{WEIGHTS_EXT}")),
            meta:      dir.join(format!("{stem}.{META_EXT}")),
        }
    }

    /// Files of the checkpoint named by `path`: its weights, optimizer
    /// or metadata file, or the stem without extension. The loss in a
    /// stem contains a dot, so Path::with_extension cannot be used here.
    pub fn locate(path: &Path) -> Self {
        let dir  = path.parent().unwrap_or_else(|| Path::new(""));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let stem = name
            .strip_suffix(&format!(".{WEIGHTS_EXT}"))
            .or_else(|| name.strip_suffix(&format!(".{META_EXT}")))
            .unwrap_or(&name);
        let stem = stem.strip_suffix(OPTIM_SUFFIX).unwrap_or(stem);

        Self::from_stem(dir, stem)
    }
}

// ─── CheckpointMeta ───────────────────────────────────────────────────────────
/// The JSON sidecar written next to every weights file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub epoch:      usize,
    pub loss:       f64,
    pub window_len: usize,
    pub topology:   MusicLstmConfig,
    pub vocabulary: Vocabulary,
}

impl CheckpointMeta {
    /// Fail unless a run with this vocabulary and window length can
    /// continue training from the checkpoint.
    pub fn check_compatible(
        &self,
        vocab:      &Vocabulary,
        window_len: usize,
    ) -> Result<(), PipelineError> {
        if self.window_len != window_len {
            return Err(PipelineError::WindowMismatch {
                expected: self.window_len,
                found:    window_len,
            });
        }

        if self.vocabulary.len() != vocab.len() {
            return Err(PipelineError::VocabularyMismatch {
                expected: self.vocabulary.len(),
                found:    vocab.len(),
                detail:   String::new(),
            });
        }

        let first_difference = self
            .vocabulary
            .tokens()
            .iter()
            .zip(vocab.tokens())
            .position(|(saved, now)| saved != now);

        if let Some(id) = first_difference {
            return Err(PipelineError::VocabularyMismatch {
                expected: self.vocabulary.len(),
                found:    vocab.len(),
                detail:   format!(
                    "; id {id} is '{}' in the checkpoint but '{}' now",
                    self.vocabulary.tokens()[id],
                    vocab.tokens()[id]
                ),
            });
        }

        Ok(())
    }
}

/// A model restored from disk together with its metadata
pub struct LoadedCheckpoint<B: Backend> {
    pub model: MusicLstm<B>,
    pub meta:  CheckpointMeta,
}

// ─── CheckpointStore ──────────────────────────────────────────────────────────
/// Saves checkpoints for one training run into a directory.
pub struct CheckpointStore {
    dir:        PathBuf,
    window_len: usize,
    topology:   MusicLstmConfig,
    vocabulary: Vocabulary,
}

impl CheckpointStore {
    /// Create a store for a run; creates the directory if needed.
    pub fn new(
        dir:        impl Into<PathBuf>,
        window_len: usize,
        topology:   MusicLstmConfig,
        vocabulary: Vocabulary,
    ) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir, window_len, topology, vocabulary })
    }

    /// Write the learner's weights, optimizer state and the metadata sidecar.
    pub fn save<L: SequenceLearner>(
        &self,
        learner: &L,
        epoch:   usize,
        loss:    f64,
    ) -> Result<CheckpointId> {
        let id    = CheckpointId { epoch, loss };
        let files = CheckpointFiles::from_stem(&self.dir, &id.stem());

        learner.save_weights(&files.weights)?;
        learner.save_optimizer(&files.optimizer)?;

        let meta = CheckpointMeta {
            epoch,
            loss,
            window_len: self.window_len,
            topology:   self.topology.clone(),
            vocabulary: self.vocabulary.clone(),
        };
        fs::write(&files.meta, serde_json::to_string_pretty(&meta)?)
            .with_context(|| format!("Cannot write '{}'", files.meta.display()))?;

        tracing::debug!("Saved checkpoint '{}'", files.weights.display());
        Ok(id)
    }

    /// Save the training configuration to JSON next to the checkpoints.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Read the metadata sidecar of the checkpoint named by `path`.
    pub fn read_meta(path: &Path) -> Result<CheckpointMeta, PipelineError> {
        let meta_path = CheckpointFiles::locate(path).meta;
        let fail = |reason: String| PipelineError::CheckpointLoad {
            path: path.to_path_buf(),
            reason,
        };

        let json = fs::read_to_string(&meta_path)
            .map_err(|e| fail(format!("cannot read metadata '{}': {e}", meta_path.display())))?;
        let meta: CheckpointMeta = serde_json::from_str(&json)
            .map_err(|e| fail(format!("corrupt metadata '{}': {e}", meta_path.display())))?;

        if meta.topology.vocab_size != meta.vocabulary.len() {
            return Err(fail(format!(
                "metadata is inconsistent: output width {} but {} vocabulary entries",
                meta.topology.vocab_size,
                meta.vocabulary.len()
            )));
        }

        let named = path
            .file_name()
            .and_then(|n| CheckpointId::parse(&n.to_string_lossy()));
        if let Some(id) = named.filter(|id| id.epoch != meta.epoch) {
            tracing::warn!(
                "Checkpoint name says epoch {} but its metadata says {}; using {}",
                id.epoch,
                meta.epoch,
                meta.epoch
            );
        }

        Ok(meta)
    }

    /// Rebuild the model described by the checkpoint's metadata and load
    /// its weights.
    pub fn load<B: Backend>(
        path:   &Path,
        device: &B::Device,
    ) -> Result<LoadedCheckpoint<B>, PipelineError> {
        let meta         = Self::read_meta(path)?;
        let weights_path = CheckpointFiles::locate(path).weights;

        let model = meta
            .topology
            .load(&weights_path, device)
            .map_err(|e| PipelineError::CheckpointLoad {
                path:   path.to_path_buf(),
                reason: format!("incompatible weights '{}': {e:#}", weights_path.display()),
            })?;

        tracing::info!(
            "Loaded checkpoint from epoch {} (loss {:.4})",
            meta.epoch,
            meta.loss
        );
        Ok(LoadedCheckpoint { model, meta })
    }

    /// Restore the optimizer state saved with the checkpoint into `optim`.
    pub fn load_optimizer<B, O>(
        path:   &Path,
        optim:  O,
        device: &B::Device,
    ) -> Result<O, PipelineError>
    where
        B: AutodiffBackend,
        O: Optimizer<MusicLstm<B>, B>,
    {
        let optim_path = CheckpointFiles::locate(path).optimizer;

        let record: O::Record = recorder()
            .load(optim_path.clone(), device)
            .map_err(|e| PipelineError::CheckpointLoad {
                path:   path.to_path_buf(),
                reason: format!("cannot load optimizer state '{}': {e:?}", optim_path.display()),
            })?;

        tracing::info!("Restored optimizer state from '{}'", optim_path.display());
        Ok(optim.load_record(record))
    }
}
