// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Parses command line arguments with `clap` and hands a
// TrainConfig to Layer 2.
//
// Two commands are supported:
//   1. `train`             - trains a new model on a MIDI corpus
//   2. `resume <CKPT>`     - continues training from a checkpoint
//
// A missing checkpoint argument is a clap usage error: the usage
// text is printed and the process exits non-zero.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::Commands;

use crate::application::train_use_case::{TrainConfig, TrainUseCase};

#[derive(Parser, Debug)]
#[command(
    name = "midi-lstm",
    version,
    about = "Train an LSTM next-note model on a folder of MIDI files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the training use case. Both commands only differ
    /// in where the starting weights come from.
    pub fn run(self) -> Result<()> {
        let config: TrainConfig = match self.command {
            Commands::Train(args) => {
                tracing::info!("Starting training on MIDI files in: {}", args.corpus_dir.display());
                args.into()
            }
            Commands::Resume(args) => {
                tracing::info!("Resuming training from: {}", args.checkpoint.display());
                args.into()
            }
        };

        let summary = TrainUseCase::new(config).execute()?;

        match summary.checkpoints.last() {
            Some(id) => println!(
                "Training complete after epoch {}. Best checkpoint: {}",
                summary.last_epoch, id
            ),
            None => println!(
                "Training complete after epoch {}. No checkpoint was written.",
                summary.last_epoch
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::ModelInit;
    use std::path::PathBuf;

    #[test]
    fn test_train_needs_no_arguments() {
        let cli = Cli::try_parse_from(["midi-lstm", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.corpus_dir, PathBuf::from("midi_songs"));
        assert_eq!(cfg.window_len, 25);
        assert_eq!(cfg.init, ModelInit::Fresh);
    }

    #[test]
    fn test_resume_takes_a_checkpoint_path() {
        let cli = Cli::try_parse_from([
            "midi-lstm", "resume", "checkpoints/weights-improvement-10-2.0000-bigger.bin",
            "--epochs", "5",
        ])
        .unwrap();
        let Commands::Resume(args) = cli.command else { panic!("expected resume") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.epochs, 5);
        assert_eq!(
            cfg.init,
            ModelInit::Resume(PathBuf::from("checkpoints/weights-improvement-10-2.0000-bigger.bin"))
        );
    }

    #[test]
    fn test_resume_without_checkpoint_is_a_usage_error() {
        let err = Cli::try_parse_from(["midi-lstm", "resume"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_zero_window_or_batch_size_is_a_usage_error() {
        for flag in ["--window", "--batch-size"] {
            let err = Cli::try_parse_from(["midi-lstm", "train", flag, "0"]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{flag}");
        }
        let cli = Cli::try_parse_from(["midi-lstm", "train", "--window", "1", "--batch-size", "1"]);
        assert!(cli.is_ok());
    }
}
