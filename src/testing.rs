// Deterministic stand-ins for the tokenizer and encoder collaborators.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use anyhow::{bail, Result};
use burn::{prelude::*, tensor::TensorData};

use crate::domain::traits::{SpecialTokens, SubwordTokenizer};
use crate::ml::encoder::{ContextualEncoder, EncoderBatch};

pub type TestBackend = burn::backend::NdArray;

/// Whitespace tokenizer with per-word piece overrides.
pub struct FakeTokenizer {
    pieces:    HashMap<String, Vec<String>>,
    unknown:   HashSet<String>,
    failing:   Option<String>,
    lowercase: bool,
    special:   SpecialTokens,
}

impl FakeTokenizer {
    pub const UNK_ID: u32 = 100;
    pub const CLS_ID: u32 = 101;
    pub const SEP_ID: u32 = 102;

    /// Lowercasing tokenizer
    pub fn new() -> Self {
        Self {
            pieces:    HashMap::new(),
            unknown:   HashSet::new(),
            failing:   None,
            lowercase: true,
            special:   SpecialTokens::default(),
        }
    }

    pub fn cased() -> Self {
        Self { lowercase: false, ..Self::new() }
    }

    pub fn with_pieces(mut self, word: &str, pieces: &[&str]) -> Self {
        let key = self.fold(word);
        self.pieces.insert(key, pieces.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn with_unknown(mut self, word: &str) -> Self {
        let key = self.fold(word);
        self.unknown.insert(key);
        self
    }

    pub fn failing_on(mut self, word: &str) -> Self {
        self.failing = Some(word.to_string());
        self
    }

    pub fn special(&self) -> &SpecialTokens {
        &self.special
    }

    fn fold(&self, word: &str) -> String {
        if self.lowercase { word.to_lowercase() } else { word.to_string() }
    }

    fn id_of(&self, token: &str) -> u32 {
        if token == self.special.cls { return Self::CLS_ID; }
        if token == self.special.sep { return Self::SEP_ID; }
        if token == self.special.unk { return Self::UNK_ID; }
        let h = token
            .bytes()
            .fold(7u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32));
        1000 + h % 20_000
    }
}

impl SubwordTokenizer for FakeTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for word in text.split_whitespace() {
            if self.failing.as_deref() == Some(word) {
                bail!("cannot tokenize {word:?}");
            }
            let key = self.fold(word);
            if self.unknown.contains(&key) {
                out.push(self.special.unk.clone());
            } else if let Some(pieces) = self.pieces.get(&key) {
                out.extend(pieces.iter().cloned());
            } else {
                out.push(key);
            }
        }
        Ok(out)
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Result<Vec<u32>> {
        Ok(tokens.iter().map(|t| self.id_of(t)).collect())
    }

    fn normalize(&self, word: &str) -> Result<String> {
        Ok(self.fold(word))
    }

    fn special_tokens(&self) -> &SpecialTokens {
        &self.special
    }
}

/// Frozen arithmetic encoder: state k at (row, pos, d) is
/// `id / 7 + 100 * k + d / 10`, so it only depends on the token id.
pub struct FrozenEncoder<B> {
    pub depth:   usize,
    pub hidden:  usize,
    pub max_len: usize,
    _backend: PhantomData<B>,
}

impl<B> FrozenEncoder<B> {
    pub fn new(depth: usize, hidden: usize, max_len: usize) -> Self {
        Self { depth, hidden, max_len, _backend: PhantomData }
    }

    pub fn value(id: i64, layer: usize, d: usize) -> f32 {
        id as f32 / 7.0 + 100.0 * layer as f32 + d as f32 / 10.0
    }
}

impl<B: Backend> ContextualEncoder<B> for FrozenEncoder<B> {
    fn num_hidden_states(&self) -> usize {
        self.depth
    }

    fn hidden_size(&self) -> usize {
        self.hidden
    }

    fn max_sequence_length(&self) -> usize {
        self.max_len
    }

    fn forward(&self, batch: EncoderBatch<B>) -> Result<Vec<Tensor<B, 3>>> {
        let [rows, width] = batch.input_ids.dims();
        let device = batch.input_ids.device();
        let ids = batch
            .input_ids
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;

        let states = (0..self.depth)
            .map(|k| {
                let mut values = Vec::with_capacity(rows * width * self.hidden);
                for &id in &ids {
                    for d in 0..self.hidden {
                        values.push(Self::value(id, k, d));
                    }
                }
                Tensor::<B, 3>::from_data(
                    TensorData::new(values, [rows, width, self.hidden]).convert::<B::FloatElem>(),
                    &device,
                )
            })
            .collect();
        Ok(states)
    }
}
