// ============================================================
// Layer 5: Checkpoint Cadence
// ============================================================
// Decides, epoch by epoch, whether a checkpoint is written.
//
// Rule (periodic, best-only):
//   - a CHECK happens every `every` epochs of the current session
//   - at a check, the epoch's loss is compared with the best loss
//     of all previous checks (starting at +inf)
//   - a checkpoint is written only if the loss is strictly lower
//
// Epochs between checks are never compared and never move the
// best value, however low their loss.
//
// Example with every = 10:
//   epoch 10 loss 2.0 → write   (best 2.0)
//   epoch 15 loss 0.5 → no check
//   epoch 20 loss 2.5 → skip
//   epoch 30 loss 1.5 → write   (best 1.5)

#[derive(Debug, Clone)]
pub struct CheckpointCadence {
    every:       usize,
    since_check: usize,
    best:        f64,
}

impl CheckpointCadence {
    /// Check every `every` epochs; 0 is treated as 1.
    pub fn new(every: usize) -> Self {
        Self {
            every:       every.max(1),
            since_check: 0,
            best:        f64::INFINITY,
        }
    }

    /// Feed the loss of the epoch that just finished.
    /// Returns true when a checkpoint should be written for it.
    pub fn observe(&mut self, loss: f64) -> bool {
        self.since_check += 1;
        if self.since_check < self.every {
            return false;
        }
        self.since_check = 0;

        // NaN compares false and is never an improvement
        if loss < self.best {
            self.best = loss;
            true
        } else {
            false
        }
    }

    /// Best loss seen at a check so far
    pub fn best(&self) -> Option<f64> {
        self.best.is_finite().then_some(self.best)
    }
}
