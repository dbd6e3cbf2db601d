// ============================================================
// Layer 5 — Layer Selector & Stacker
// ============================================================
// Picks the configured hidden states out of the encoder's full
// stack and arranges them as [batch, layers, positions, hidden].
//
//   depth = number of hidden states (embedding output + layers)
//   -1    = last layer, -depth = embedding output
//
// Output order is configuration order, not model order, and an
// index may be repeated. Anything outside [-depth, depth) is a
// configuration error raised before processing starts.

use anyhow::Result;
use burn::prelude::*;
use ndarray::Array4;

use crate::domain::error::EncodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSelector {
    indices: Vec<usize>,
    depth:   usize,
}

impl LayerSelector {
    /// Resolve possibly-negative `requested` indices against `depth`.
    pub fn resolve(requested: &[i64], depth: usize) -> Result<Self, EncodeError> {
        if requested.is_empty() {
            return Err(EncodeError::configuration("at least one layer must be selected"));
        }
        let signed_depth = depth as i64;
        let indices = requested
            .iter()
            .map(|&index| {
                let absolute = if index < 0 { signed_depth + index } else { index };
                if (0..signed_depth).contains(&absolute) {
                    Ok(absolute as usize)
                } else {
                    Err(EncodeError::configuration(format!(
                        "layer index {index} is out of range for a model with {depth} hidden states"
                    )))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { indices, depth })
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Stack the selected states along a new axis 1.
    pub fn select<B: Backend>(&self, hidden_states: Vec<Tensor<B, 3>>) -> Result<Tensor<B, 4>> {
        if hidden_states.len() != self.depth {
            return Err(EncodeError::Encoder(format!(
                "expected {} hidden states, encoder returned {}",
                self.depth,
                hidden_states.len()
            ))
            .into());
        }
        let selected: Vec<Tensor<B, 3>> = self
            .indices
            .iter()
            .map(|&i| hidden_states[i].clone())
            .collect();
        Ok(Tensor::stack::<4>(selected, 1))
    }

    /// Select, stack and copy to host memory as f32.
    pub fn select_to_host<B: Backend>(&self, hidden_states: Vec<Tensor<B, 3>>) -> Result<Array4<f32>> {
        let stacked = self.select(hidden_states)?;
        let [n, l, p, d] = stacked.dims();
        let values = stacked
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| EncodeError::Encoder(format!("cannot read encoder output: {e:?}")))?;
        Array4::from_shape_vec((n, l, p, d), values)
            .map_err(|e| EncodeError::Encoder(format!("encoder output has a bad shape: {e}")).into())
    }
}
