// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that name the concepts of the
// system: what an input line is, which merge policy is active,
// what can go wrong, and which collaborators the pipeline needs.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

/// One input line, single sentence or sentence pair
pub mod example;

/// The closed set of subword-to-output-unit merge rules
pub mod merge_policy;

/// Fatal error kinds
pub mod error;

/// Run configuration and its model-free checks
pub mod config;

/// Tokenizer and output-store seams
pub mod traits;
