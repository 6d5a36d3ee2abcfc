// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything from MIDI files to tensor batches:
//
//   .mid files
//       │
//       ▼
//   Corpus            → discovers files, sorted by name
//       │
//       ▼
//   MidiLoader        → parses each file into a ScoreView
//       │
//       ▼
//   TokenExtractor    → one flat token stream for the corpus
//       │
//       ▼
//   Vocabulary        → token ↔ id (domain layer)
//       │
//       ▼
//   Windower          → (history, next token) pairs
//       │
//       ▼
//   EncodedDataset    → Burn Dataset of normalised windows
//       │
//       ▼
//   SequenceBatcher   → [batch, W, 1] inputs and one-hot targets

/// Corpus directory discovery and fingerprinting
pub mod corpus;

/// MIDI parsing with midly
pub mod loader;

/// Reduces parsed files to tokens
pub mod extractor;

/// Sliding windows and their encoding
pub mod windower;

/// Burn Dataset over encoded windows
pub mod dataset;

/// Burn Batcher producing tensor batches
pub mod batcher;
