// ============================================================
// Layer 3 — Core Traits (Collaborator Seams)
// ============================================================
// The tokenizer and the output store are external collaborators.
// The pipeline only ever talks to them through these traits, so a
// different model family's tokenizer or a different on-disk format
// drops in without touching the alignment code.
//
// The encoder seam lives in ml::encoder because it speaks in burn
// tensors, which this layer never imports.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use ndarray::Array3;

// ─── SpecialTokens ────────────────────────────────────────────────────────────
/// Reserved token strings of a wordpiece vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialTokens {
    pub cls: String,
    pub sep: String,
    pub unk: String,
    /// Prefix marking a piece that attaches to the previous one
    pub continuation_prefix: String,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            cls:                 "[CLS]".to_string(),
            sep:                 "[SEP]".to_string(),
            unk:                 "[UNK]".to_string(),
            continuation_prefix: "##".to_string(),
        }
    }
}

impl SpecialTokens {
    pub fn is_continuation(&self, token: &str) -> bool {
        token.starts_with(&self.continuation_prefix)
    }

    /// The piece with its continuation prefix removed, if it has one.
    pub fn strip_continuation<'t>(&self, token: &'t str) -> &'t str {
        token
            .strip_prefix(self.continuation_prefix.as_str())
            .unwrap_or(token)
    }
}

// ─── SubwordTokenizer ─────────────────────────────────────────────────────────
/// Splits text into subword pieces and maps pieces to vocabulary ids.
///
/// Implementations:
///   - WordPieceTokenizer → HuggingFace `tokenizers` WordPiece model
pub trait SubwordTokenizer {
    /// Subword pieces of `text`, without any special tokens.
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Vocabulary ids for `tokens`, one per token, in order.
    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Result<Vec<u32>>;

    /// Apply the tokenizer's own case folding / normalisation to a word
    /// so it can be compared with concatenated pieces.
    fn normalize(&self, word: &str) -> Result<String>;

    fn special_tokens(&self) -> &SpecialTokens;
}

// ─── EmbeddingSink ────────────────────────────────────────────────────────────
/// Append-only store of one (layers, units, dim) array per sentence.
///
/// Implementations:
///   - NpzSink → a NumPy .npz archive keyed by sentence id
pub trait EmbeddingSink {
    /// Store the array for `sentence_id`. Ids arrive as 0, 1, 2, ...
    fn write(&mut self, sentence_id: usize, embeddings: &Array3<f32>) -> Result<()>;

    /// Flush and close the store. No writes are accepted afterwards.
    fn finish(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuation_helpers() {
        let special = SpecialTokens::default();
        assert!(special.is_continuation("##rk"));
        assert!(!special.is_continuation("New"));
        assert_eq!(special.strip_continuation("##rk"), "rk");
        assert_eq!(special.strip_continuation("Yo"), "Yo");
    }
}
