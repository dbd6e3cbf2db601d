// ============================================================
// Layer 4b — Alignment / Merge Engine
// ============================================================
// Takes the encoder's per-position vectors for a whole batch and
// produces one dense (layers, units, dim) array per sentence.
//
//   1. the active MergePolicy decides the runs of positions that
//      become output units (raw / wordpiece / input_tokens)
//   2. pooling averages each run into one vector
//
// Runs never cover [CLS], the trailing [SEP] or padding, so those
// positions cannot leak into the output. All three policies share
// the same pooling step; the match below is the only place that
// knows which policy is active.

pub mod input_tokens;
pub mod pooling;
pub mod raw;
pub mod wordpiece;

use anyhow::Result;
use ndarray::{Array3, Array4, ArrayView3, Axis};

use crate::data::features::Feature;
use crate::domain::{
    error::EncodeError,
    merge_policy::MergePolicy,
    traits::SubwordTokenizer,
};
use pooling::{pool, Run};

/// Final array for one sentence plus the label of each unit.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedOutput {
    pub labels:     Vec<String>,
    /// Shape (layers, units, dim)
    pub embeddings: Array3<f32>,
}

pub struct MergeEngine<'a> {
    policy:    MergePolicy,
    tokenizer: &'a dyn SubwordTokenizer,
}

impl<'a> MergeEngine<'a> {
    pub fn new(policy: MergePolicy, tokenizer: &'a dyn SubwordTokenizer) -> Self {
        Self { policy, tokenizer }
    }

    /// Merge one sentence. `embeddings` is its (layers, positions, dim)
    /// slice of the batch, positions possibly padded beyond its length.
    pub fn merge(&self, feature: &Feature, embeddings: ArrayView3<'_, f32>) -> Result<MergedOutput> {
        let positions = embeddings.dim().1;
        if feature.len() > positions {
            return Err(EncodeError::Encoder(format!(
                "sentence has {} tokens but only {} encoded positions",
                feature.len(),
                positions
            ))
            .into());
        }

        let runs: Vec<Run> = match self.policy {
            MergePolicy::Raw           => raw::runs(feature),
            MergePolicy::Wordpiece     => wordpiece::runs(feature, self.tokenizer.special_tokens()),
            MergePolicy::AsInputTokens => input_tokens::runs(feature, self.tokenizer)?,
        };

        let embeddings = pool(embeddings, &runs);
        let labels = runs.into_iter().map(|r| r.label).collect();
        Ok(MergedOutput { labels, embeddings })
    }

    /// Merge every row of a (batch, layers, positions, dim) array.
    /// Row i belongs to features[i].
    pub fn merge_batch(&self, features: &[Feature], embeddings: &Array4<f32>) -> Result<Vec<MergedOutput>> {
        let rows = embeddings.dim().0;
        if rows != features.len() {
            return Err(EncodeError::Encoder(format!(
                "batch of {} sentences produced {} rows",
                features.len(),
                rows
            ))
            .into());
        }

        features
            .iter()
            .zip(embeddings.axis_iter(Axis(0)))
            .map(|(feature, row)| self.merge(feature, row))
            .collect()
    }
}
