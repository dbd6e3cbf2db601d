// ============================================================
// Layer 5 — Encoder Seam
// ============================================================
// The contextual encoder is a black box: padded ids, mask and
// segment ids in, one [batch, positions, hidden] tensor per
// hidden state out (embedding output first, then every layer).
//
// It must be a pure function of its inputs. A batch either
// produces every hidden state or fails as a whole.

use anyhow::Result;
use burn::prelude::*;

/// Batched encoder input, all tensors shaped [batch, positions].
#[derive(Debug, Clone)]
pub struct EncoderBatch<B: Backend> {
    pub input_ids:      Tensor<B, 2, Int>,
    /// 1.0 for real tokens, 0.0 for padding
    pub input_mask:     Tensor<B, 2>,
    pub input_type_ids: Tensor<B, 2, Int>,
}

/// Any model that maps token ids to per-layer contextual vectors.
///
/// Implementations:
///   - BertEncoder → BERT-style transformer encoder (ml::model)
pub trait ContextualEncoder<B: Backend> {
    /// Number of tensors `forward` returns (layers + embedding output)
    fn num_hidden_states(&self) -> usize;

    /// Width of every returned vector
    fn hidden_size(&self) -> usize;

    /// Longest token sequence the model accepts
    fn max_sequence_length(&self) -> usize;

    fn forward(&self, batch: EncoderBatch<B>) -> Result<Vec<Tensor<B, 3>>>;
}
