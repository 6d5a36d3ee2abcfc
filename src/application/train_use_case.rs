// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Discover the corpus           (Layer 4 - data)
//   Step 2: Load or extract the tokens    (Layer 6 - infra, Layer 4 - data)
//   Step 3: Build the vocabulary          (Layer 3 - domain)
//   Step 4: Window and encode             (Layer 4 - data)
//   Step 5: Fresh model or checkpoint,    (Layer 5 - ml, Layer 6 - infra)
//           with its optimizer state
//   Step 6: Save config                   (Layer 6 - infra)
//   Step 7: Run the training controller   (Layer 5 - ml)
//
// Training and resuming share every step except 5. A resumed run
// rebuilds the vocabulary from the same corpus and refuses to
// continue if it differs from the one in the checkpoint. If the
// corpus is no longer readable, resuming falls back to the newest
// cached token stream.
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use burn::optim::AdaGradConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    corpus::Corpus,
    extractor::TokenExtractor,
    loader::MidiLoader,
    windower::Windower,
};
use crate::domain::vocabulary::Vocabulary;
use crate::infra::{
    checkpoint::CheckpointStore,
    metrics::MetricsLogger,
    token_store::TokenStreamStore,
};
use crate::ml::{
    learner::BurnLearner,
    model::{MusicLstm, MusicLstmConfig},
    trainer::{TrainingController, TrainingSummary},
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Where the network's starting weights come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelInit {
    /// Random initialisation with the configured topology
    Fresh,
    /// Weights and topology of an existing checkpoint
    Resume(PathBuf),
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs. Saved as JSON next to the checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_dir:       PathBuf,
    pub extension:        String,
    pub data_dir:         PathBuf,
    pub checkpoint_dir:   PathBuf,
    pub reextract:        bool,
    pub window_len:       usize,
    pub epochs:           usize,
    pub batch_size:       usize,
    pub checkpoint_every: usize,
    pub lr:               f64,
    pub hidden_size:      usize,
    pub num_layers:       usize,
    pub dropout:          f64,
    pub seed:             u64,
    pub init:             ModelInit,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_dir:       PathBuf::from("midi_songs"),
            extension:        "mid".to_string(),
            data_dir:         PathBuf::from("data"),
            checkpoint_dir:   PathBuf::from("checkpoints"),
            reextract:        false,
            window_len:       25,
            epochs:           1000,
            batch_size:       64,
            checkpoint_every: 10,
            lr:               0.01,
            hidden_size:      1536,
            num_layers:       3,
            dropout:          0.3,
            seed:             42,
            init:             ModelInit::Fresh,
        }
    }
}

impl TrainConfig {
    /// Topology for a fresh model over `vocab_size` tokens
    pub fn topology(&self, vocab_size: usize) -> MusicLstmConfig {
        MusicLstmConfig::new(vocab_size)
            .with_hidden_size(self.hidden_size)
            .with_num_layers(self.num_layers)
            .with_dropout(self.dropout)
    }
}

/// Vocabulary plus encoded training windows, ready for a learner
pub struct PreparedData {
    pub vocabulary: Vocabulary,
    pub windower:   Windower,
    pub dataset:    crate::data::dataset::EncodedDataset,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Steps 1 to 4: corpus → tokens → vocabulary → encoded windows
    pub fn prepare(&self) -> Result<PreparedData> {
        let cfg = &self.config;
        if cfg.batch_size == 0 {
            bail!("Batch size must be at least 1");
        }
        let windower = Windower::new(cfg.window_len)?;

        // ── Steps 1 and 2: Discover MIDI files, token stream cached per corpus
        let store  = TokenStreamStore::new(&cfg.data_dir);
        let stream = match Corpus::discover(&cfg.corpus_dir, &cfg.extension) {
            Ok(corpus) => {
                tracing::info!(
                    "Found {} .{} files in '{}'",
                    corpus.files().len(),
                    cfg.extension,
                    corpus.dir().display()
                );
                store.load_or_extract(&corpus, cfg.reextract, || {
                    Ok(TokenExtractor::new(MidiLoader::new()).extract(&corpus)?)
                })?
            }
            Err(e) if matches!(cfg.init, ModelInit::Resume(_)) && !cfg.reextract => {
                let Some((path, stream)) = store.load_latest()? else {
                    return Err(e.into());
                };
                tracing::warn!("{e}; resuming with the cached token stream '{}'", path.display());
                stream
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!("Token stream has {} tokens", stream.len());

        // ── Step 3: Vocabulary ────────────────────────────────────────────────
        let vocabulary = Vocabulary::build(&stream)?;
        tracing::info!("Vocabulary has {} distinct tokens", vocabulary.len());

        // ── Step 4: Sliding windows ───────────────────────────────────────────
        let dataset = windower.encode(&stream, &vocabulary)?;

        Ok(PreparedData { vocabulary, windower, dataset })
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg  = &self.config;
        let data = self.prepare()?;

        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);

        // ── Step 5: Starting weights ──────────────────────────────────────────
        let optim = AdaGradConfig::new().init::<MyBackend, MusicLstm<MyBackend>>();
        let (model, optim, topology, start_epoch): (MusicLstm<MyBackend>, _, _, _) = match &cfg.init {
            ModelInit::Fresh => {
                let topology = cfg.topology(data.vocabulary.len());
                (topology.init(&device), optim, topology, 0)
            }
            ModelInit::Resume(path) => {
                let loaded = CheckpointStore::load::<MyBackend>(path, &device)?;
                loaded.meta.check_compatible(&data.vocabulary, data.windower.window_len())?;
                let optim = CheckpointStore::load_optimizer::<MyBackend, _>(path, optim, &device)?;
                tracing::info!("Resuming after epoch {}", loaded.meta.epoch);
                (loaded.model, optim, loaded.meta.topology, loaded.meta.epoch)
            }
        };
        tracing::info!(
            "Model ready: {} LSTM layers, hidden={}, outputs={}",
            topology.num_layers,
            topology.hidden_size,
            topology.vocab_size
        );

        // ── Step 6: Checkpoint store + config ─────────────────────────────────
        let store = CheckpointStore::new(
            &cfg.checkpoint_dir,
            data.windower.window_len(),
            topology,
            data.vocabulary,
        )?;
        store.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        tracing::info!("Logging epoch metrics to '{}'", metrics.csv_path().display());

        // ── Step 7: Train ─────────────────────────────────────────────────────
        let mut learner = BurnLearner::new(
            model,
            optim,
            data.dataset,
            cfg.batch_size,
            cfg.lr,
            cfg.seed,
            device,
        );

        TrainingController::new(cfg.epochs, cfg.checkpoint_every)
            .resuming_from(start_epoch)
            .run(&mut learner, &store, &metrics)
            .with_context(|| format!("Training into '{}' failed", cfg.checkpoint_dir.display()))
    }
}
