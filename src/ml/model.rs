use anyhow::Result;
use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::ml::encoder::{ContextualEncoder, EncoderBatch};

/// Encoder architecture. `Config` supplies Clone and serde impls.
#[derive(Config, Debug)]
pub struct BertEncoderConfig {
    pub vocab_size:              usize,
    pub hidden_size:             usize,
    pub num_hidden_layers:       usize,
    pub num_attention_heads:     usize,
    pub intermediate_size:       usize,
    pub max_position_embeddings: usize,
    pub type_vocab_size:         usize,
    pub layer_norm_eps:          f64,
}

impl BertEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BertEncoder<B> {
        let word_embedding     = EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_position_embeddings, self.hidden_size).init(device);
        let token_type_embedding = EmbeddingConfig::new(self.type_vocab_size, self.hidden_size).init(device);
        let embedding_norm = LayerNormConfig::new(self.hidden_size)
            .with_epsilon(self.layer_norm_eps)
            .init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_hidden_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        BertEncoder {
            word_embedding, position_embedding, token_type_embedding,
            embedding_norm, layers,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn = MultiHeadAttentionConfig::new(self.hidden_size, self.num_attention_heads)
            .with_dropout(0.0)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.hidden_size, self.intermediate_size).init(device);
        let ffn_linear2 = LinearConfig::new(self.intermediate_size, self.hidden_size).init(device);
        let norm1 = LayerNormConfig::new(self.hidden_size).with_epsilon(self.layer_norm_eps).init(device);
        let norm2 = LayerNormConfig::new(self.hidden_size).with_epsilon(self.layer_norm_eps).init(device);
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2 }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
}

impl<B: Backend> EncoderBlock<B> {
    /// Post-norm block. `pad_mask` is true at padded positions.
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + attn_output);
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + ffn_out)
    }
}

#[derive(Module, Debug)]
pub struct BertEncoder<B: Backend> {
    pub word_embedding:       Embedding<B>,
    pub position_embedding:   Embedding<B>,
    pub token_type_embedding: Embedding<B>,
    pub embedding_norm:       LayerNorm<B>,
    pub layers:               Vec<EncoderBlock<B>>,
}

impl<B: Backend> BertEncoder<B> {
    /// All hidden states: embedding output followed by each block's output,
    /// every one shaped [batch, seq_len, hidden].
    pub fn hidden_states(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        input_mask:     Tensor<B, 2>,
        input_type_ids: Tensor<B, 2, Int>,
    ) -> Vec<Tensor<B, 3>> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);

        let embeddings = self.word_embedding.forward(input_ids)
            + self.position_embedding.forward(positions)
            + self.token_type_embedding.forward(input_type_ids);
        let mut x = self.embedding_norm.forward(embeddings);

        let pad_mask = input_mask.equal_elem(0.0);

        let mut states = Vec::with_capacity(self.layers.len() + 1);
        states.push(x.clone());
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
            states.push(x.clone());
        }
        states
    }

    fn hidden_width(&self) -> usize {
        let [_, hidden] = self.word_embedding.weight.dims();
        hidden
    }

    fn position_limit(&self) -> usize {
        let [positions, _] = self.position_embedding.weight.dims();
        positions
    }
}

impl<B: Backend> ContextualEncoder<B> for BertEncoder<B> {
    fn num_hidden_states(&self) -> usize {
        self.layers.len() + 1
    }

    fn hidden_size(&self) -> usize {
        self.hidden_width()
    }

    fn max_sequence_length(&self) -> usize {
        self.position_limit()
    }

    fn forward(&self, batch: EncoderBatch<B>) -> Result<Vec<Tensor<B, 3>>> {
        Ok(self.hidden_states(batch.input_ids, batch.input_mask, batch.input_type_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestBackend;
    use burn::tensor::TensorData;

    fn tiny_config() -> BertEncoderConfig {
        BertEncoderConfig::new(32, 8, 2, 2, 16, 16, 2, 1e-12)
    }

    fn batch(device: &<TestBackend as Backend>::Device) -> EncoderBatch<TestBackend> {
        let ids  = TensorData::new(vec![1i64, 5, 6, 2, 1, 7, 2, 0], [2, 4]);
        let mask = TensorData::new(vec![1.0f32, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0], [2, 4]);
        let segs = TensorData::new(vec![0i64; 8], [2, 4]);
        EncoderBatch {
            input_ids:      Tensor::from_data(ids, device),
            input_mask:     Tensor::from_data(mask, device),
            input_type_ids: Tensor::from_data(segs, device),
        }
    }

    #[test]
    fn test_returns_every_hidden_state() {
        let device = Default::default();
        let model: BertEncoder<TestBackend> = tiny_config().init(&device);
        assert_eq!(model.num_hidden_states(), 3);
        assert_eq!(model.hidden_size(), 8);
        assert_eq!(model.max_sequence_length(), 16);

        let states = model.forward(batch(&device)).unwrap();
        assert_eq!(states.len(), 3);
        for state in states {
            assert_eq!(state.dims(), [2, 4, 8]);
        }
    }

    #[test]
    fn test_forward_is_deterministic() {
        let device = Default::default();
        let model: BertEncoder<TestBackend> = tiny_config().init(&device);
        let a = model.forward(batch(&device)).unwrap();
        let b = model.forward(batch(&device)).unwrap();
        let a = a[2].clone().into_data().to_vec::<f32>().unwrap();
        let b = b[2].clone().into_data().to_vec::<f32>().unwrap();
        assert_eq!(a, b);
    }
}
