// ============================================================
// Layer 4b — Runs and Mean Pooling
// ============================================================
// A Run is a half-open span of token positions that becomes ONE
// output unit. Pooling turns a sentence's (layers, positions, dim)
// view into (layers, runs, dim):
//
//   run of length 1 → that position's vector, untouched
//   longer run      → arithmetic mean over the run's positions,
//                     per layer and per dimension
//
// Positions outside every run (special tokens, padding) simply
// never reach the output.

use ndarray::{s, Array3, ArrayView3, Axis};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub end:   usize,
    /// Surface label of the unit
    pub label: String,
}

impl Run {
    pub fn single(position: usize, label: impl Into<String>) -> Self {
        Self { start: position, end: position + 1, label: label.into() }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Pool `embeddings` (layers, positions, dim) into one vector per run.
/// Every run must be non-empty and lie inside the positions axis.
pub fn pool(embeddings: ArrayView3<'_, f32>, runs: &[Run]) -> Array3<f32> {
    let (layers, _, dim) = embeddings.dim();
    let mut out = Array3::<f32>::zeros((layers, runs.len(), dim));

    for (t, run) in runs.iter().enumerate() {
        let span = embeddings.slice(s![.., run.start..run.end, ..]);
        let mut target = out.slice_mut(s![.., t, ..]);
        if run.len() == 1 {
            target.assign(&span.index_axis(Axis(1), 0));
        } else if let Some(mean) = span.mean_axis(Axis(1)) {
            target.assign(&mean);
        }
    }

    out
}
