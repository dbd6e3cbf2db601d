// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches files on disk:
//
//   tokenizer_store.rs — builds the wordpiece tokenizer from a
//                        vocab.txt (or loads a tokenizer.json)
//                        and adapts it to SubwordTokenizer
//
//   checkpoint.rs      — encoder config.json + CompactRecorder
//                        weights; rebuilds the model for inference
//
//   sink.rs            — the .npz output store, written once per
//                        sentence and readable by sentence id
//
//   manifest.rs        — JSON summary written next to the output
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// Wordpiece tokenizer loading
pub mod tokenizer_store;

/// Encoder checkpoint loading and saving
pub mod checkpoint;

/// Append-only embedding store
pub mod sink;

/// Run summary sidecar
pub mod manifest;
