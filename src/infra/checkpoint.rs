// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Restores the encoder from two files:
//
//   config.json    — BERT-style architecture description
//                    (hidden_size, num_hidden_layers, ...). Read
//                    with serde; unknown keys are ignored so a
//                    stock model config can be used directly.
//   model.mpk.gz   — weights recorded with Burn's CompactRecorder
//
// Loading is type-safe: a record that does not match the
// architecture from config.json fails to load.
//
// The recorder appends its own extension, so the checkpoint
// path is accepted with or without ".mpk.gz".
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::ml::model::{BertEncoder, BertEncoderConfig};

const RECORD_EXTENSION: &str = ".mpk.gz";

/// On-disk model config. Field names follow the usual BERT config.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfigFile {
    pub vocab_size:              usize,
    pub hidden_size:             usize,
    pub num_hidden_layers:       usize,
    pub num_attention_heads:     usize,
    pub intermediate_size:       usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size:         usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps:          f64,
}

fn default_type_vocab_size() -> usize { 2 }
fn default_layer_norm_eps() -> f64 { 1e-12 }

impl EncoderConfigFile {
    /// Check the architecture is buildable
    pub fn validate(&self) -> Result<()> {
        if self.num_attention_heads == 0 || self.hidden_size % self.num_attention_heads != 0 {
            anyhow::bail!(
                "hidden_size ({}) must be divisible by num_attention_heads ({})",
                self.hidden_size,
                self.num_attention_heads
            );
        }
        if self.max_position_embeddings < 2 {
            anyhow::bail!("max_position_embeddings must leave room for [CLS] and [SEP]");
        }
        Ok(())
    }

    pub fn to_model_config(&self) -> BertEncoderConfig {
        BertEncoderConfig::new(
            self.vocab_size,
            self.hidden_size,
            self.num_hidden_layers,
            self.num_attention_heads,
            self.intermediate_size,
            self.max_position_embeddings,
            self.type_vocab_size,
            self.layer_norm_eps,
        )
    }
}

/// Locates and loads the encoder's config and weights.
pub struct CheckpointManager {
    config_path: PathBuf,
    record_stem: PathBuf,
}

impl CheckpointManager {
    pub fn new(config_path: impl Into<PathBuf>, checkpoint_path: impl AsRef<Path>) -> Self {
        Self {
            config_path: config_path.into(),
            record_stem: record_stem(checkpoint_path.as_ref()),
        }
    }

    /// Path of the weights file the recorder reads and writes
    pub fn record_path(&self) -> PathBuf {
        let mut name = self.record_stem.clone().into_os_string();
        name.push(RECORD_EXTENSION);
        PathBuf::from(name)
    }

    pub fn load_config(&self) -> Result<EncoderConfigFile> {
        let json = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Cannot read model config '{}'", self.config_path.display()))?;
        let cfg: EncoderConfigFile = serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse model config '{}'", self.config_path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[cfg(test)]
    pub fn save_config(&self, cfg: &EncoderConfigFile) -> Result<()> {
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&self.config_path, json)
            .with_context(|| format!("Cannot write model config '{}'", self.config_path.display()))?;
        tracing::debug!("Saved model config to '{}'", self.config_path.display());
        Ok(())
    }

    /// Build the architecture from config.json and restore its weights.
    pub fn load_model<B: Backend>(&self, device: &B::Device) -> Result<BertEncoder<B>> {
        let cfg = self.load_config()?;
        let model: BertEncoder<B> = cfg.to_model_config().init(device);

        tracing::info!(
            "Loading encoder weights from '{}' ({} layers, hidden {})",
            self.record_path().display(),
            cfg.num_hidden_layers,
            cfg.hidden_size
        );

        let record = CompactRecorder::new()
            .load(self.record_stem.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'", self.record_path().display())
            })?;

        Ok(model.load_record(record))
    }

    /// Record `model`'s weights to the checkpoint path.
    pub fn save_model<B: Backend>(&self, model: &BertEncoder<B>) -> Result<()> {
        CompactRecorder::new()
            .record(model.clone().into_record(), self.record_stem.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", self.record_path().display())
            })?;
        tracing::debug!("Saved checkpoint to '{}'", self.record_path().display());
        Ok(())
    }
}

fn record_stem(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    match text.strip_suffix(RECORD_EXTENSION) {
        Some(stem) => PathBuf::from(stem),
        None       => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::encoder::ContextualEncoder;
    use crate::testing::TestBackend;

    fn tiny() -> EncoderConfigFile {
        EncoderConfigFile {
            vocab_size: 40,
            hidden_size: 8,
            num_hidden_layers: 2,
            num_attention_heads: 2,
            intermediate_size: 16,
            max_position_embeddings: 32,
            type_vocab_size: 2,
            layer_norm_eps: 1e-12,
        }
    }

    #[test]
    fn test_record_stem_strips_extension() {
        assert_eq!(record_stem(Path::new("ckpt/model.mpk.gz")), PathBuf::from("ckpt/model"));
        assert_eq!(record_stem(Path::new("ckpt/model")), PathBuf::from("ckpt/model"));
        let m = CheckpointManager::new("c.json", "ckpt/model");
        assert_eq!(m.record_path(), PathBuf::from("ckpt/model.mpk.gz"));
    }

    #[test]
    fn test_stock_bert_config_parses() {
        let json = r#"{
            "attention_probs_dropout_prob": 0.1,
            "hidden_act": "gelu",
            "hidden_size": 768,
            "intermediate_size": 3072,
            "max_position_embeddings": 512,
            "num_attention_heads": 12,
            "num_hidden_layers": 12,
            "type_vocab_size": 2,
            "vocab_size": 30522
        }"#;
        let cfg: EncoderConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.num_hidden_layers, 12);
        assert_eq!(cfg.layer_norm_eps, 1e-12);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_indivisible_heads_rejected() {
        let cfg = EncoderConfigFile { num_attention_heads: 3, ..tiny() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_save_then_load_restores_weights() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path().join("config.json"), dir.path().join("model"));
        manager.save_config(&tiny()).unwrap();

        let device = Default::default();
        let model: BertEncoder<TestBackend> = tiny().to_model_config().init(&device);
        manager.save_model(&model).unwrap();
        assert!(manager.record_path().exists());

        let loaded: BertEncoder<TestBackend> = manager.load_model(&device).unwrap();
        assert_eq!(loaded.num_hidden_states(), 3);
        let a = model.word_embedding.weight.val().into_data().to_vec::<f32>().unwrap();
        let b = loaded.word_embedding.weight.val().into_data().to_vec::<f32>().unwrap();
        // CompactRecorder stores half precision
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-2);
        }
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let manager = CheckpointManager::new("/no/such/config.json", "/no/such/model");
        assert!(manager.load_model::<TestBackend>(&Default::default()).is_err());
    }
}
