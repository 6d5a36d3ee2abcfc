// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Everything that touches disk on behalf of the other layers:
//
//   checkpoint.rs   - Named model snapshots
//                     Burn BinFileRecorder weights plus a JSON
//                     sidecar holding epoch, loss, window length,
//                     topology, and vocabulary. Loading rebuilds
//                     the model and checks the run is compatible.
//
//   token_store.rs  - Token stream cache
//                     bincode file keyed by the corpus
//                     fingerprint, so parsing runs once per corpus.
//
//   metrics.rs      - Per-epoch loss CSV
//                     Appended across resumed sessions.

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Extracted token stream persistence
pub mod token_store;

/// Training metrics CSV logger
pub mod metrics;
