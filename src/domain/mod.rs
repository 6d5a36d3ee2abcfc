// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust types and traits describing the problem:
// pitches, events, tokens, the vocabulary, and the errors that
// end a run.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain structs, enums, traits, and pure functions

// Typed errors for every fatal pipeline condition
pub mod error;

// MIDI pitch spelling and chord normal order
pub mod pitch;

// Parsed-file model: events, parts, and the partitioning outcome
pub mod score;

// Canonical string form of one event
pub mod token;

// Token ↔ id bijection
pub mod vocabulary;

// Parser and learner abstractions
pub mod traits;
