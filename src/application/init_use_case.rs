// ============================================================
// Layer 2 — InitCheckpointUseCase
// ============================================================
// Builds a randomly initialised encoder from a JSON model
// configuration and stores it as a checkpoint, so the encode
// path can be exercised without converted pretrained weights.

use anyhow::Result;
use std::path::PathBuf;

use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::BertEncoder;

type InitBackend = burn::backend::NdArray;

pub struct InitCheckpointUseCase {
    model_config: PathBuf,
    checkpoint:   PathBuf,
}

impl InitCheckpointUseCase {
    pub fn new(model_config: impl Into<PathBuf>, checkpoint: impl Into<PathBuf>) -> Self {
        Self { model_config: model_config.into(), checkpoint: checkpoint.into() }
    }

    /// Returns the path of the written record.
    pub fn execute(&self) -> Result<PathBuf> {
        let manager = CheckpointManager::new(&self.model_config, &self.checkpoint);
        let config  = manager.load_config()?;

        tracing::info!(
            "Initialising encoder: {} layers, hidden={}, heads={}, vocab={}",
            config.num_hidden_layers,
            config.hidden_size,
            config.num_attention_heads,
            config.vocab_size
        );
        let device = Default::default();
        let model: BertEncoder<InitBackend> = config.to_model_config().init(&device);
        manager.save_model(&model)?;

        Ok(manager.record_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::checkpoint::EncoderConfigFile;
    use crate::ml::encoder::ContextualEncoder;

    #[test]
    fn test_written_checkpoint_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let manager = CheckpointManager::new(&config_path, dir.path().join("model"));
        manager
            .save_config(&EncoderConfigFile {
                vocab_size: 20,
                hidden_size: 8,
                num_hidden_layers: 3,
                num_attention_heads: 2,
                intermediate_size: 16,
                max_position_embeddings: 12,
                type_vocab_size: 2,
                layer_norm_eps: 1e-12,
            })
            .unwrap();

        let record = InitCheckpointUseCase::new(&config_path, dir.path().join("model"))
            .execute()
            .unwrap();
        assert!(record.exists());

        let model = manager.load_model::<InitBackend>(&Default::default()).unwrap();
        assert_eq!(model.num_hidden_states(), 4);
        assert_eq!(model.max_sequence_length(), 12);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"vocab_size": 10, "hidden_size": 9, "num_hidden_layers": 1,
            "num_attention_heads": 2, "intermediate_size": 4, "max_position_embeddings": 8}"#)
            .unwrap();
        assert!(InitCheckpointUseCase::new(&config_path, dir.path().join("m")).execute().is_err());
    }
}
