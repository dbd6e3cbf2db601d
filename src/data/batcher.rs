// ============================================================
// Layer 4 — Batch Assembler
// ============================================================
// Stacks N variable-length Features into rectangular arrays the
// encoder can consume.
//
// How padding works here:
//   width  = longest feature in THIS batch (not a global maximum)
//   row i  = feature i, followed by (width - len_i) zeros
//
//   lengths {4, 7, 5}  →  width 7, trailing pads {0, 3, 2}
//
// Ids and segment ids are integral; the mask is 0.0 / 1.0 floats
// because encoders use it as a multiplicative gate. Rows are
// never reordered.
//
// The host-side PaddedBatch is kept separate from the tensors so
// the layout can be tested without any backend.
//
// Reference: Burn Book §4 (Batcher)

use burn::{prelude::*, tensor::TensorData};

use crate::data::features::Feature;
use crate::ml::encoder::EncoderBatch;

/// Row-major padded arrays, `rows * width` entries each.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedBatch {
    pub input_ids:      Vec<i32>,
    pub input_mask:     Vec<f32>,
    pub input_type_ids: Vec<i32>,
    /// True (unpadded) length of each row
    pub lengths:        Vec<usize>,
    pub rows:           usize,
    pub width:          usize,
}

impl PaddedBatch {
    /// Upload to `device` as [rows, width] tensors.
    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> EncoderBatch<B> {
        let shape = [self.rows, self.width];

        let input_ids = Tensor::<B, 2, Int>::from_data(
            TensorData::new(self.input_ids.clone(), shape).convert::<B::IntElem>(),
            device,
        );
        let input_mask = Tensor::<B, 2>::from_data(
            TensorData::new(self.input_mask.clone(), shape).convert::<B::FloatElem>(),
            device,
        );
        let input_type_ids = Tensor::<B, 2, Int>::from_data(
            TensorData::new(self.input_type_ids.clone(), shape).convert::<B::IntElem>(),
            device,
        );

        EncoderBatch { input_ids, input_mask, input_type_ids }
    }
}

/// Pads Features to the batch's own maximum length.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchAssembler;

impl BatchAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(&self, features: &[Feature]) -> PaddedBatch {
        let rows  = features.len();
        let width = features.iter().map(Feature::len).max().unwrap_or(0);

        let mut input_ids      = vec![0i32; rows * width];
        let mut input_mask     = vec![0f32; rows * width];
        let mut input_type_ids = vec![0i32; rows * width];
        let mut lengths        = Vec::with_capacity(rows);

        for (row, feature) in features.iter().enumerate() {
            let offset = row * width;
            for (j, (&id, &type_id)) in feature
                .input_ids
                .iter()
                .zip(&feature.input_type_ids)
                .enumerate()
            {
                input_ids[offset + j]      = id as i32;
                input_type_ids[offset + j] = type_id as i32;
                input_mask[offset + j]     = 1.0;
            }
            lengths.push(feature.len());
        }

        tracing::debug!("Assembled batch: {} rows, padded width {}", rows, width);

        PaddedBatch { input_ids, input_mask, input_type_ids, lengths, rows, width }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::features::FeatureBuilder;
    use crate::domain::example::Example;
    use crate::testing::{FakeTokenizer, TestBackend};

    fn features(lines: &[&str]) -> Vec<Feature> {
        let tok = FakeTokenizer::new();
        let builder = FeatureBuilder::new(&tok, 512);
        lines.iter().map(|l| builder.build(Example::parse(l)).unwrap()).collect()
    }

    fn trailing_zeros(row: &[i32]) -> usize {
        row.iter().rev().take_while(|&&x| x == 0).count()
    }

    #[test]
    fn test_pads_to_batch_maximum() {
        // 2, 5 and 3 words → 4, 7 and 5 tokens with [CLS]/[SEP]
        let feats = features(&["a b", "a b c d e", "a b c"]);
        let batch = BatchAssembler::new().assemble(&feats);

        assert_eq!(batch.width, 7);
        assert_eq!(batch.lengths, vec![4, 7, 5]);

        let pads: Vec<usize> = batch
            .input_ids
            .chunks(batch.width)
            .map(trailing_zeros)
            .collect();
        assert_eq!(pads, vec![3, 0, 2]);
    }

    #[test]
    fn test_rows_keep_input_order() {
        let feats = features(&["x", "y y", "z"]);
        let batch = BatchAssembler::new().assemble(&feats);
        for (row, feature) in feats.iter().enumerate() {
            let start = row * batch.width;
            let ids: Vec<u32> = batch.input_ids[start..start + feature.len()]
                .iter()
                .map(|&x| x as u32)
                .collect();
            assert_eq!(ids, feature.input_ids);
        }
    }

    #[test]
    fn test_mask_and_segments() {
        let feats = features(&["a ||| b", "a b c d"]);
        let batch = BatchAssembler::new().assemble(&feats);
        assert_eq!(batch.width, 6);
        assert_eq!(&batch.input_mask[0..6], &[1.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
        assert_eq!(&batch.input_type_ids[0..6], &[0, 0, 0, 1, 1, 0]);
        assert_eq!(&batch.input_mask[6..12], &[1.0; 6]);
    }

    #[test]
    fn test_tensor_shapes() {
        let feats = features(&["a b", "a b c d e"]);
        let batch = BatchAssembler::new().assemble(&feats);
        let device = Default::default();
        let tensors = batch.to_tensors::<TestBackend>(&device);
        assert_eq!(tensors.input_ids.dims(), [2, 7]);
        assert_eq!(tensors.input_mask.dims(), [2, 7]);
        assert_eq!(tensors.input_type_ids.dims(), [2, 7]);
    }
}
