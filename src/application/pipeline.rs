// ============================================================
// Layer 2 — Encoding Pipeline
// ============================================================
// Drives every batch through the stages in strict input order:
//
//   examples → FeatureBuilder → BatchAssembler → encoder
//            → LayerSelector → MergeEngine → sink
//
// The sentence-id counter lives only inside `run`; it starts at
// 0, moves once per emitted sentence and is handed back to the
// caller as the number of sentences written. Nothing else is
// carried from one batch to the next.
//
// Any error ends the run immediately. Sentences already handed
// to the sink stay written.

use anyhow::Result;
use burn::prelude::*;
use indicatif::ProgressBar;

use crate::alignment::{MergeEngine, MergedOutput};
use crate::data::{
    batcher::BatchAssembler,
    features::FeatureBuilder,
    loader::Batches,
};
use crate::domain::{
    error::EncodeError,
    example::Example,
    merge_policy::MergePolicy,
    traits::{EmbeddingSink, SubwordTokenizer},
};
use crate::ml::{encoder::ContextualEncoder, layers::LayerSelector};

pub struct Pipeline<'a, B: Backend> {
    tokenizer:   &'a dyn SubwordTokenizer,
    encoder:     &'a dyn ContextualEncoder<B>,
    layers:      LayerSelector,
    policy:      MergePolicy,
    batch_size:  usize,
    max_seq_len: usize,
    device:      B::Device,
}

impl<'a, B: Backend> Pipeline<'a, B> {
    /// Validate the layer list and length limit against the encoder.
    pub fn new(
        tokenizer:   &'a dyn SubwordTokenizer,
        encoder:     &'a dyn ContextualEncoder<B>,
        layers:      &[i64],
        policy:      MergePolicy,
        batch_size:  usize,
        max_seq_len: Option<usize>,
        device:      B::Device,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(EncodeError::configuration("batch size must be positive").into());
        }
        let layers = LayerSelector::resolve(layers, encoder.num_hidden_states())?;

        let model_limit = encoder.max_sequence_length();
        let max_seq_len = match max_seq_len {
            Some(0) => {
                return Err(EncodeError::configuration("maximum sequence length must be positive").into());
            }
            Some(n) if n > model_limit => {
                return Err(EncodeError::configuration(format!(
                    "maximum sequence length {n} exceeds the encoder's limit of {model_limit}"
                ))
                .into());
            }
            Some(n) => n,
            None    => model_limit,
        };

        Ok(Self { tokenizer, encoder, layers, policy, batch_size, max_seq_len, device })
    }

    pub fn layers(&self) -> &LayerSelector {
        &self.layers
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    /// Encode one batch of examples into merged per-sentence outputs.
    pub fn encode_batch(&self, examples: Vec<Example>) -> Result<Vec<MergedOutput>> {
        let features = FeatureBuilder::new(self.tokenizer, self.max_seq_len).build_all(examples)?;
        let padded   = BatchAssembler::new().assemble(&features);
        tracing::debug!("True lengths {:?}", padded.lengths);

        let hidden_states = self.encoder.forward(padded.to_tensors::<B>(&self.device))?;
        let embeddings    = self.layers.select_to_host(hidden_states)?;

        MergeEngine::new(self.policy, self.tokenizer).merge_batch(&features, &embeddings)
    }

    /// Encode every example and write one array per sentence.
    /// Returns the number of sentences written.
    pub fn run<I>(&self, examples: I, sink: &mut dyn EmbeddingSink, progress: &ProgressBar) -> Result<usize>
    where
        I: Iterator<Item = Result<Example>>,
    {
        let mut sentence_id = 0usize;

        for (batch_no, batch) in Batches::new(examples, self.batch_size).enumerate() {
            let batch   = batch?;
            let outputs = self.encode_batch(batch)?;
            tracing::debug!("Batch {} encoded: {} sentences", batch_no, outputs.len());

            for output in outputs {
                tracing::debug!(
                    "Sentence {}: shape {:?} units {:?}",
                    sentence_id,
                    output.embeddings.dim(),
                    output.labels
                );
                sink.write(sentence_id, &output.embeddings)?;
                sentence_id += 1;
                progress.inc(1);
            }
        }

        Ok(sentence_id)
    }
}
