// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw input lines to encoder-ready tensors.
//
//   input.txt
//       │
//       ▼
//   LineReader        → strips lines, skips blanks, parses pairs
//       │
//       ▼
//   Batches           → groups examples, input order preserved
//       │
//       ▼
//   FeatureBuilder    → [CLS] A [SEP] (B [SEP]), ids, segment ids
//       │
//       ▼
//   BatchAssembler    → pads to the batch maximum, uploads tensors
//
// Each module is responsible for exactly one step.

/// Reads input lines and cuts them into batches
pub mod loader;

/// Builds per-example token / id / segment records
pub mod features;

/// Pads features into rectangular batch arrays
pub mod batcher;
