// ============================================================
// Layer 5: Training Controller
// ============================================================
// Runs the epoch loop on top of any SequenceLearner:
//
//   for epoch in start+1 ..= start+epochs
//       loss = learner.fit_epoch(epoch)
//       cadence says save?  → CheckpointStore::save
//       print progress, append metrics row
//
// The controller knows nothing about Burn. Epoch numbers continue
// from the checkpoint on resume, so file names never collide with
// the ones of the earlier session. The best-loss tracking restarts
// with each session.

use anyhow::Result;

use crate::domain::traits::SequenceLearner;
use crate::infra::{
    checkpoint::{CheckpointId, CheckpointStore},
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::cadence::CheckpointCadence;

/// What a finished run did
#[derive(Debug, Clone, Default)]
pub struct TrainingSummary {
    pub last_epoch:  usize,
    pub last_loss:   Option<f64>,
    pub best_loss:   Option<f64>,
    pub checkpoints: Vec<CheckpointId>,
}

#[derive(Debug, Clone)]
pub struct TrainingController {
    epochs:           usize,
    checkpoint_every: usize,
    start_epoch:      usize,
}

impl TrainingController {
    /// `epochs` epochs, with a save check every `checkpoint_every` of them
    pub fn new(epochs: usize, checkpoint_every: usize) -> Self {
        Self { epochs, checkpoint_every, start_epoch: 0 }
    }

    /// Number the epochs of this session after `epoch`
    pub fn resuming_from(mut self, epoch: usize) -> Self {
        self.start_epoch = epoch;
        self
    }

    pub fn run<L: SequenceLearner>(
        &self,
        learner: &mut L,
        store:   &CheckpointStore,
        metrics: &MetricsLogger,
    ) -> Result<TrainingSummary> {
        let mut cadence = CheckpointCadence::new(self.checkpoint_every);
        let mut summary = TrainingSummary { last_epoch: self.start_epoch, ..Default::default() };
        let last        = self.start_epoch + self.epochs;

        tracing::info!(
            "Training epochs {}..={} (save check every {})",
            self.start_epoch + 1,
            last,
            self.checkpoint_every.max(1)
        );

        for epoch in self.start_epoch + 1..=last {
            let loss = learner.fit_epoch(epoch)?;
            if !loss.is_finite() {
                tracing::warn!("Epoch {} produced a non-finite loss ({})", epoch, loss);
            }

            let saved = if cadence.observe(loss) {
                let id = store.save(learner, epoch, loss)?;
                tracing::info!("Checkpoint '{}' written", id);
                summary.checkpoints.push(id);
                Some(id)
            } else {
                None
            };

            println!(
                "Epoch {:>4}/{} | loss={:.4} | checkpoint={}",
                epoch,
                last,
                loss,
                saved.map(|id| id.file_name()).as_deref().unwrap_or("-"),
            );

            metrics.log(&EpochMetrics::new(epoch, loss, saved.map(|id| id.file_name())))?;

            summary.last_epoch = epoch;
            summary.last_loss  = Some(loss);
        }

        summary.best_loss = cadence.best();
        tracing::info!("Training complete!");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::tokens;
    use crate::domain::vocabulary::Vocabulary;
    use crate::infra::checkpoint::tests::{tiny_learner, tiny_topology};
    use std::{fs, path::Path};

    /// Replays a fixed loss curve and writes marker files as its state
    struct ScriptedLearner {
        losses: Vec<f64>,
        seen:   Vec<usize>,
    }

    impl ScriptedLearner {
        fn new(losses: Vec<f64>) -> Self {
            Self { losses, seen: Vec::new() }
        }
    }

    impl SequenceLearner for ScriptedLearner {
        fn fit_epoch(&mut self, epoch: usize) -> Result<f64> {
            let loss = self.losses[self.seen.len()];
            self.seen.push(epoch);
            Ok(loss)
        }

        fn save_weights(&self, path: &Path) -> Result<()> {
            fs::write(path, b"weights")?;
            Ok(())
        }

        fn save_optimizer(&self, path: &Path) -> Result<()> {
            fs::write(path, b"optimizer")?;
            Ok(())
        }
    }

    fn store(dir: &Path) -> CheckpointStore {
        let vocab = Vocabulary::build(&tokens(["C4", "D4"])).unwrap();
        CheckpointStore::new(dir, 3, tiny_topology(vocab.len()), vocab).unwrap()
    }

    fn weight_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".bin") && !n.ends_with("-optim.bin"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_thirty_epochs_save_at_ten_and_thirty() {
        let dir = tempfile::tempdir().unwrap();
        let losses: Vec<f64> = (1..=30)
            .map(|e| if e <= 20 { 1.0 + e as f64 * 0.1 } else { 3.0 - (e - 20) as f64 * 0.2 })
            .collect();
        let mut learner = ScriptedLearner::new(losses);

        let summary = TrainingController::new(30, 10)
            .run(&mut learner, &store(dir.path()), &MetricsLogger::new(dir.path()).unwrap())
            .unwrap();

        assert_eq!(
            weight_files(dir.path()),
            vec![
                "weights-improvement-10-2.0000-bigger.bin",
                "weights-improvement-30-1.0000-bigger.bin",
            ]
        );
        assert_eq!(summary.last_epoch, 30);
        assert_eq!(summary.checkpoints.len(), 2);
        assert!((summary.best_loss.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_resumed_run_continues_epoch_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let mut learner = ScriptedLearner::new(vec![0.9, 0.8, 0.7, 0.6]);

        let summary = TrainingController::new(4, 2)
            .resuming_from(30)
            .run(&mut learner, &store(dir.path()), &MetricsLogger::new(dir.path()).unwrap())
            .unwrap();

        assert_eq!(learner.seen, vec![31, 32, 33, 34]);
        assert_eq!(summary.last_epoch, 34);
        assert_eq!(
            weight_files(dir.path()),
            vec![
                "weights-improvement-32-0.8000-bigger.bin",
                "weights-improvement-34-0.6000-bigger.bin",
            ]
        );
    }

    #[test]
    fn test_every_epoch_is_logged_with_its_checkpoint() {
        let dir     = tempfile::tempdir().unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let mut learner = ScriptedLearner::new(vec![3.0, 2.0, 2.5]);

        TrainingController::new(3, 1)
            .run(&mut learner, &store(dir.path()), &metrics)
            .unwrap();

        let csv = fs::read_to_string(metrics.csv_path()).unwrap();
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].ends_with("weights-improvement-01-3.0000-bigger.bin"));
        assert!(rows[1].ends_with("weights-improvement-02-2.0000-bigger.bin"));
        assert!(rows[2].ends_with(','));
    }

    #[test]
    fn test_nan_loss_never_writes_a_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mut learner = ScriptedLearner::new(vec![f64::NAN, f64::NAN]);

        let summary = TrainingController::new(2, 1)
            .run(&mut learner, &store(dir.path()), &MetricsLogger::new(dir.path()).unwrap())
            .unwrap();

        assert!(summary.checkpoints.is_empty());
        assert!(weight_files(dir.path()).is_empty());
    }

    #[test]
    fn test_checkpoint_written_by_controller_can_be_loaded() {
        let dir   = tempfile::tempdir().unwrap();
        let vocab = Vocabulary::build(&tokens(["C4", "D4"])).unwrap();
        let topo  = tiny_topology(vocab.len());
        let store = CheckpointStore::new(dir.path(), 3, topo.clone(), vocab.clone()).unwrap();
        let mut learner = tiny_learner(&vocab, &topo);

        let summary = TrainingController::new(1, 1)
            .run(&mut learner, &store, &MetricsLogger::new(dir.path()).unwrap())
            .unwrap();

        let path   = dir.path().join(summary.checkpoints[0].file_name());
        let loaded = CheckpointStore::load::<burn::backend::NdArray>(&path, &Default::default())
            .unwrap();
        assert_eq!(loaded.meta.epoch, 1);
        assert!(loaded.meta.check_compatible(&vocab, 3).is_ok());
    }

    #[test]
    fn test_every_checkpoint_carries_optimizer_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut learner = ScriptedLearner::new(vec![2.0, 1.0]);

        TrainingController::new(2, 1)
            .run(&mut learner, &store(dir.path()), &MetricsLogger::new(dir.path()).unwrap())
            .unwrap();

        let weights = weight_files(dir.path());
        assert_eq!(weights.len(), 2);
        for name in weights {
            let optim = name.replace(".bin", "-optim.bin");
            assert!(dir.path().join(&optim).exists(), "{optim} is missing");
        }
    }
}
