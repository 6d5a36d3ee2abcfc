// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `resume`, and their
// flags. Both share the same data and training flags; `resume`
// adds a required positional checkpoint path.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::{ModelInit, TrainConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a new model on a directory of MIDI files
    Train(TrainArgs),

    /// Continue training from a saved checkpoint
    Resume(ResumeArgs),
}

/// Data and training flags shared by both commands.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Directory containing the MIDI corpus
    #[arg(long, default_value = "midi_songs")]
    pub corpus_dir: PathBuf,

    /// File extension of corpus files (case-insensitive)
    #[arg(long, default_value = "mid")]
    pub extension: String,

    /// Directory for the cached token stream
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory for checkpoints, config, and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Parse the corpus again even if a cached token stream exists
    #[arg(long)]
    pub reextract: bool,

    /// Tokens of history per training example
    #[arg(long = "window", default_value_t = 25, value_parser = positive)]
    pub window_len: usize,

    /// Epochs to run in this session
    #[arg(long, default_value_t = 1000)]
    pub epochs: usize,

    /// Windows per optimiser step
    #[arg(long, default_value_t = 64, value_parser = positive)]
    pub batch_size: usize,

    /// Compare the loss against the best so far every N epochs,
    /// writing a checkpoint when it improved
    #[arg(long, default_value_t = 10)]
    pub checkpoint_every: usize,

    /// AdaGrad learning rate
    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    /// LSTM hidden units per layer (ignored on resume)
    #[arg(long, default_value_t = 1536)]
    pub hidden_size: usize,

    /// Stacked LSTM layers (ignored on resume)
    #[arg(long, default_value_t = 3)]
    pub num_layers: usize,

    /// Dropout between LSTM layers (ignored on resume)
    #[arg(long, default_value_t = 0.3)]
    pub dropout: f64,

    /// Shuffle seed for the data loader
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Checkpoint to continue from: its .bin or .json file, or the
    /// bare name without extension. The corpus must still be readable
    /// unless its token stream is cached in --data-dir.
    pub checkpoint: PathBuf,

    #[command(flatten)]
    pub train: TrainArgs,
}

/// Parse a count that must be at least 1
fn positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0)  => Err("must be at least 1".to_string()),
        Ok(n)  => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_dir:       a.corpus_dir,
            extension:        a.extension,
            data_dir:         a.data_dir,
            checkpoint_dir:   a.checkpoint_dir,
            reextract:        a.reextract,
            window_len:       a.window_len,
            epochs:           a.epochs,
            batch_size:       a.batch_size,
            checkpoint_every: a.checkpoint_every,
            lr:               a.lr,
            hidden_size:      a.hidden_size,
            num_layers:       a.num_layers,
            dropout:          a.dropout,
            seed:             a.seed,
            init:             ModelInit::Fresh,
        }
    }
}

impl From<ResumeArgs> for TrainConfig {
    fn from(a: ResumeArgs) -> Self {
        TrainConfig {
            init: ModelInit::Resume(a.checkpoint),
            ..TrainConfig::from(a.train)
        }
    }
}
