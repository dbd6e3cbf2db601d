// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads the subword tokenizer the encoder was trained with and
// exposes it through the SubwordTokenizer seam.
//
// Two on-disk forms are accepted:
//   vocab.txt       — a BERT wordpiece vocabulary, one piece per
//                     line (line number = id). The tokenizer is
//                     assembled as BertNormalizer + BertPreTokenizer
//                     + WordPiece, lowercasing per do_lower_case.
//   tokenizer.json  — a serialised HuggingFace tokenizer. Truncation
//                     and padding are switched off, and its case
//                     folding must agree with do_lower_case.
//
// Reference: Wu et al. (2016) wordpiece model

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokenizers::{
    models::wordpiece::WordPiece,
    normalizers::bert::BertNormalizer,
    pre_tokenizers::bert::BertPreTokenizer,
    NormalizedString, Normalizer, Tokenizer,
};

use crate::domain::{
    error::EncodeError,
    traits::{SpecialTokens, SubwordTokenizer},
};

pub struct TokenizerStore {
    path:          PathBuf,
    do_lower_case: bool,
}

impl TokenizerStore {
    pub fn new(path: impl Into<PathBuf>, do_lower_case: bool) -> Self {
        Self { path: path.into(), do_lower_case }
    }

    pub fn load(&self) -> Result<WordPieceTokenizer> {
        let is_json = self.path.extension().and_then(|e| e.to_str()) == Some("json");
        let inner = if is_json {
            tracing::info!("Loading serialised tokenizer from '{}'", self.path.display());
            self.load_serialised()?
        } else {
            tracing::info!(
                "Building wordpiece tokenizer from '{}' (lowercase={})",
                self.path.display(),
                self.do_lower_case
            );
            self.build_from_vocab(&self.path)?
        };
        WordPieceTokenizer::new(inner, SpecialTokens::default())
    }

    /// A tokenizer.json as saved, minus any truncation or padding: the
    /// feature builder must see every piece to enforce the length limit.
    fn load_serialised(&self) -> Result<Tokenizer> {
        let mut tokenizer = Tokenizer::from_file(&self.path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", self.path.display(), e
            ))?;
        if tokenizer.get_truncation().is_some() {
            tracing::debug!("Disabling truncation configured in '{}'", self.path.display());
        }
        tokenizer
            .with_truncation(None)
            .map_err(|e| anyhow::anyhow!("Cannot disable truncation: {e}"))?;
        tokenizer.with_padding(None);

        let lowercases = folds_case(&tokenizer)?;
        if lowercases != self.do_lower_case {
            return Err(EncodeError::configuration(format!(
                "tokenizer '{}' {} but do_lower_case is {}",
                self.path.display(),
                if lowercases { "lowercases its input" } else { "keeps case" },
                self.do_lower_case
            ))
            .into());
        }
        Ok(tokenizer)
    }

    fn build_from_vocab(&self, vocab: &Path) -> Result<Tokenizer> {
        let special = SpecialTokens::default();
        let vocab_path = vocab
            .to_str()
            .with_context(|| format!("Vocabulary path '{}' is not valid UTF-8", vocab.display()))?;

        let model = WordPiece::from_file(vocab_path)
            .unk_token(special.unk.clone())
            .continuing_subword_prefix(special.continuation_prefix.clone())
            .build()
            .map_err(|e| anyhow::anyhow!(
                "Cannot read vocabulary '{}': {}", vocab.display(), e
            ))?;

        let mut tokenizer = Tokenizer::new(model);
        tokenizer
            .with_normalizer(Some(BertNormalizer::new(
                true,
                true,
                Some(self.do_lower_case),
                self.do_lower_case,
            )))
            .with_pre_tokenizer(Some(BertPreTokenizer));
        Ok(tokenizer)
    }
}

/// Whether the tokenizer's normaliser lowercases.
fn folds_case(tokenizer: &Tokenizer) -> Result<bool> {
    let Some(normalizer) = tokenizer.get_normalizer() else {
        return Ok(false);
    };
    let mut sample = NormalizedString::from("A");
    normalizer
        .normalize(&mut sample)
        .map_err(|e| anyhow::anyhow!("Cannot run tokenizer normaliser: {e}"))?;
    Ok(sample.get() == "a")
}

/// HuggingFace tokenizer behind the SubwordTokenizer seam.
pub struct WordPieceTokenizer {
    inner:   Tokenizer,
    special: SpecialTokens,
    unk_id:  u32,
}

impl WordPieceTokenizer {
    pub fn new(inner: Tokenizer, special: SpecialTokens) -> Result<Self> {
        for token in [&special.cls, &special.sep] {
            if inner.token_to_id(token).is_none() {
                anyhow::bail!("Vocabulary has no '{}' token", token);
            }
        }
        let unk_id = inner
            .token_to_id(&special.unk)
            .with_context(|| format!("Vocabulary has no '{}' token", special.unk))?;
        Ok(Self { inner, special, unk_id })
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }
}

impl SubwordTokenizer for WordPieceTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenise {text:?}: {e}"))?;
        Ok(encoding.get_tokens().to_vec())
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Result<Vec<u32>> {
        Ok(tokens
            .iter()
            .map(|t| self.inner.token_to_id(t).unwrap_or(self.unk_id))
            .collect())
    }

    fn normalize(&self, word: &str) -> Result<String> {
        let Some(normalizer) = self.inner.get_normalizer() else {
            return Ok(word.to_string());
        };
        let mut normalized = NormalizedString::from(word);
        normalizer
            .normalize(&mut normalized)
            .map_err(|e| anyhow::anyhow!("Normalise {word:?}: {e}"))?;
        // CJK handling pads characters with spaces; pieces never contain them
        Ok(normalized.get().split_whitespace().collect())
    }

    fn special_tokens(&self) -> &SpecialTokens {
        &self.special
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::features::FeatureBuilder;
    use crate::domain::example::Example;
    use tokenizers::TruncationParams;

    const VOCAB: &[&str] = &[
        "[PAD]", "[UNK]", "[CLS]", "[SEP]", "new", "york", "yo", "##rk",
        "un", "##happy", "##ness", "cafe", ",", "hello", "New", "Yo",
    ];

    fn store(lower: bool) -> (tempfile::TempDir, TokenizerStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.txt");
        std::fs::write(&path, VOCAB.join("\n")).unwrap();
        (dir, TokenizerStore::new(path, lower))
    }

    #[test]
    fn test_lowercased_wordpieces() {
        let (_dir, store) = store(true);
        let tok = store.load().unwrap();
        assert_eq!(tok.tokenize("Unhappiness").unwrap(), vec!["un", "##happy", "##ness"]);
        assert_eq!(tok.tokenize("NEW York").unwrap(), vec!["new", "york"]);
    }

    #[test]
    fn test_cased_wordpieces() {
        let (_dir, store) = store(false);
        let tok = store.load().unwrap();
        assert_eq!(tok.tokenize("New Yo").unwrap(), vec!["New", "Yo"]);
        assert_eq!(tok.normalize("New").unwrap(), "New");
    }

    #[test]
    fn test_unknown_and_ids() {
        let (_dir, store) = store(true);
        let tok = store.load().unwrap();
        let tokens = tok.tokenize("hello zzz").unwrap();
        assert_eq!(tokens, vec!["hello", "[UNK]"]);
        let ids = tok
            .convert_tokens_to_ids(&["[CLS]".to_string(), "hello".to_string(), "nope".to_string()])
            .unwrap();
        assert_eq!(ids, vec![2, 13, 1]);
    }

    #[test]
    fn test_normalize_matches_piece_spelling() {
        let (_dir, store) = store(true);
        let tok = store.load().unwrap();
        assert_eq!(tok.normalize("Café").unwrap(), "cafe");
        assert_eq!(tok.tokenize("Café").unwrap(), vec!["cafe"]);
        assert_eq!(tok.tokenize("hello,").unwrap(), vec!["hello", ","]);
    }

    /// Saves the vocab.txt tokenizer as tokenizer.json, truncating at 3
    fn truncating_json(dir: &tempfile::TempDir, store: &TokenizerStore) -> std::path::PathBuf {
        let mut tokenizer = store.build_from_vocab(&dir.path().join("vocab.txt")).unwrap();
        tokenizer
            .with_truncation(Some(TruncationParams { max_length: 3, ..Default::default() }))
            .unwrap();
        let path = dir.path().join("tokenizer.json");
        tokenizer.save(&path, false).unwrap();
        path
    }

    #[test]
    fn test_serialised_truncation_is_disabled() {
        let (dir, store) = store(true);
        let json = truncating_json(&dir, &store);

        let tok = TokenizerStore::new(json, true).load().unwrap();
        assert_eq!(tok.tokenize("hello , hello , hello").unwrap().len(), 5);

        let err = FeatureBuilder::new(&tok, 5)
            .build(Example::parse("hello , hello , hello"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EncodeError>(),
            Some(EncodeError::InputTooLong { tokens: 7, max: 5, .. })
        ));
    }

    #[test]
    fn test_serialised_case_folding_must_match_config() {
        let (dir, store) = store(true);
        let json = truncating_json(&dir, &store);

        let err = TokenizerStore::new(&json, false).load().err().unwrap();
        assert!(matches!(err.downcast_ref::<EncodeError>(), Some(EncodeError::Configuration(_))));
        assert!(TokenizerStore::new(&json, true).load().is_ok());
    }

    #[test]
    fn test_missing_vocab_is_an_error() {
        let store = TokenizerStore::new("/definitely/not/here/vocab.txt", true);
        assert!(store.load().is_err());
    }
}
