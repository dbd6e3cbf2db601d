// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn framework code of the pipeline.
// Only this layer and the batch upload in data::batcher touch
// burn tensors; everything downstream works on ndarray arrays.
//
//   encoder.rs — the ContextualEncoder seam and its batch input
//   model.rs   — BERT-style encoder returning every hidden state
//   layers.rs  — picks configured layers and stacks them
//
// Reference: Burn Book §3 (Building Blocks)
//            Devlin et al. (2019) BERT

/// Encoder adapter trait
pub mod encoder;

/// Transformer encoder architecture
pub mod model;

/// Layer selection and stacking
pub mod layers;
