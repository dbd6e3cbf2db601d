// ============================================================
// Layer 3 — Error Kinds
// ============================================================
// Every fatal condition the pipeline can hit has a named kind.
// None of them is recovered locally: they travel up to the
// driver inside an anyhow::Error and end the run with a
// non-zero exit status. Tests downcast back to these kinds.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    /// Bad encoder type, merge policy, layer index or size limit.
    /// Raised before the first sentence is read.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A sentence produced more subword tokens than the encoder accepts.
    #[error("input too long: {tokens} tokens exceeds the maximum sequence length of {max} (sentence: {sentence:?})")]
    InputTooLong {
        tokens:   usize,
        max:      usize,
        sentence: String,
    },

    /// Subword tokens could not be realigned to the sentence's words.
    #[error("alignment mismatch in sentence {sentence:?}: {reason}")]
    AlignmentMismatch {
        sentence: String,
        reason:   String,
    },

    /// The tokenizer rejected a segment.
    #[error("feature build error: {0}")]
    Build(String),

    /// The encoder returned something the pipeline cannot use.
    #[error("encoder error: {0}")]
    Encoder(String),

    /// The output store refused a write.
    #[error("sink error: {0}")]
    Sink(String),
}

impl EncodeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn mismatch(sentence: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AlignmentMismatch {
            sentence: sentence.into(),
            reason:   reason.into(),
        }
    }
}
