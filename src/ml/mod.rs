// ============================================================
// Layer 5: ML / Model Layer (Burn)
// ============================================================
// The network and everything that trains it.
//
//   model.rs    - Stacked LSTM next-token classifier
//                 • N LSTM layers over [batch, window, 1] inputs
//                 • Dropout between layers
//                 • Layer normalisation on the last time step
//                 • Linear head, softmax over the vocabulary
//
//   learner.rs  - One epoch of mini-batch training with Burn
//                 (forward, cross-entropy, backward, AdaGrad step)
//
//   cadence.rs  - Periodic save-if-improved rule
//
//   trainer.rs  - Epoch loop: cadence, checkpoints, metrics
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Hochreiter & Schmidhuber (1997) Long Short-Term Memory

/// Stacked LSTM architecture
pub mod model;

/// Burn-backed SequenceLearner
pub mod learner;

/// Checkpoint decision rule
pub mod cadence;

/// Backend-agnostic training loop
pub mod trainer;
