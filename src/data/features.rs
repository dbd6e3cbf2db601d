// ============================================================
// Layer 4 — Feature Builder
// ============================================================
// Turns an Example into the canonical encoder input:
//
//   [CLS] tokens_a [SEP]                 single sentence
//   [CLS] tokens_a [SEP] tokens_b [SEP]  sentence pair
//
// Segment ids are 0 up to and including the first [SEP], and 1
// for the second segment and its trailing [SEP]. The attention
// mask is all ones over the token count, so it is not stored.
//
// No truncation happens here. A sequence longer than the encoder
// accepts is a fatal InputTooLong error, because cutting tokens
// would silently break word alignment downstream.

use anyhow::Result;

use crate::domain::{
    error::EncodeError,
    example::Example,
    traits::SubwordTokenizer,
};

/// One example ready for batching.
/// Invariant: tokens, input_ids and input_type_ids have equal length.
#[derive(Debug, Clone)]
pub struct Feature {
    pub example:        Example,
    pub tokens:         Vec<String>,
    pub input_ids:      Vec<u32>,
    pub input_type_ids: Vec<u32>,
    /// Index of the separator between the two segments of a pair
    pub segment_boundary: Option<usize>,
}

impl Feature {
    /// True length, special tokens included
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Index of the trailing [SEP]
    pub fn last_index(&self) -> usize {
        self.tokens.len().saturating_sub(1)
    }
}

pub struct FeatureBuilder<'a> {
    tokenizer:   &'a dyn SubwordTokenizer,
    max_seq_len: usize,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(tokenizer: &'a dyn SubwordTokenizer, max_seq_len: usize) -> Self {
        Self { tokenizer, max_seq_len }
    }

    pub fn build(&self, example: Example) -> Result<Feature> {
        let special = self.tokenizer.special_tokens();

        let tokens_a = self.tokenize_segment(&example.text_a)?;
        let tokens_b = match &example.text_b {
            Some(b) => Some(self.tokenize_segment(b)?),
            None    => None,
        };

        let capacity = tokens_a.len() + tokens_b.as_ref().map_or(0, |b| b.len() + 1) + 2;
        let mut tokens         = Vec::with_capacity(capacity);
        let mut input_type_ids = Vec::with_capacity(capacity);

        tokens.push(special.cls.clone());
        tokens.extend(tokens_a);
        tokens.push(special.sep.clone());
        input_type_ids.resize(tokens.len(), 0);

        let mut segment_boundary = None;
        if let Some(tokens_b) = tokens_b {
            segment_boundary = Some(tokens.len() - 1);
            tokens.extend(tokens_b);
            tokens.push(special.sep.clone());
            input_type_ids.resize(tokens.len(), 1);
        }

        if tokens.len() > self.max_seq_len {
            return Err(EncodeError::InputTooLong {
                tokens:   tokens.len(),
                max:      self.max_seq_len,
                sentence: example.text.clone(),
            }
            .into());
        }

        let input_ids = self
            .tokenizer
            .convert_tokens_to_ids(&tokens)
            .map_err(|e| EncodeError::Build(format!("{:?}: {e}", example.text)))?;
        if input_ids.len() != tokens.len() {
            return Err(EncodeError::Build(format!(
                "{:?}: tokenizer returned {} ids for {} tokens",
                example.text,
                input_ids.len(),
                tokens.len()
            ))
            .into());
        }

        Ok(Feature { example, tokens, input_ids, input_type_ids, segment_boundary })
    }

    /// Build every example of a batch, in order.
    pub fn build_all(&self, examples: Vec<Example>) -> Result<Vec<Feature>> {
        examples.into_iter().map(|e| self.build(e)).collect()
    }

    // An empty segment is a zero-token segment, never skipped.
    fn tokenize_segment(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.tokenizer
            .tokenize(text)
            .map_err(|e| anyhow::Error::from(EncodeError::Build(format!("{text:?}: {e}"))))
    }
}
