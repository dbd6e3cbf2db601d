// ============================================================
// Layer 3 — Encode Configuration
// ============================================================
// Everything one run needs. Built by the CLI, validated before
// any model is loaded, and recorded in the run manifest next to
// the output. Plain values only.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::{error::EncodeError, merge_policy::MergePolicy};

/// Encoder families this build can run.
pub const SUPPORTED_ENCODERS: &[&str] = &["bert"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeConfig {
    pub input:               PathBuf,
    pub output:              PathBuf,
    pub vocab:               PathBuf,
    pub model_config:        PathBuf,
    pub checkpoint:          PathBuf,
    pub encoder:             String,
    pub merge_policy:        String,
    pub layers:              Vec<i64>,
    pub do_lower_case:       bool,
    pub batch_size:          usize,
    pub max_sequence_length: Option<usize>,
    /// -1 = CPU, otherwise the index of a discrete GPU
    pub gpu:                 i32,
    pub quiet:               bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            input:               PathBuf::from("input.txt"),
            output:              PathBuf::from("embeddings.npz"),
            vocab:               PathBuf::from("vocab.txt"),
            model_config:        PathBuf::from("config.json"),
            checkpoint:          PathBuf::from("model"),
            encoder:             "bert".to_string(),
            merge_policy:        MergePolicy::default().to_string(),
            layers:              vec![-2],
            do_lower_case:       true,
            batch_size:          32,
            max_sequence_length: None,
            gpu:                 -1,
            quiet:               false,
        }
    }
}

impl EncodeConfig {
    /// Checks that need no model. Returns the parsed merge policy.
    pub fn validate(&self) -> Result<MergePolicy, EncodeError> {
        if !SUPPORTED_ENCODERS.contains(&self.encoder.as_str()) {
            return Err(EncodeError::configuration(format!(
                "unsupported encoding type '{}' (supported: {})",
                self.encoder,
                SUPPORTED_ENCODERS.join(", ")
            )));
        }
        if self.batch_size == 0 {
            return Err(EncodeError::configuration("batch size must be positive"));
        }
        if self.layers.is_empty() {
            return Err(EncodeError::configuration("at least one layer must be selected"));
        }
        if self.max_sequence_length == Some(0) {
            return Err(EncodeError::configuration("maximum sequence length must be positive"));
        }
        self.merge_policy.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(EncodeConfig::default().validate().unwrap(), MergePolicy::Wordpiece);
    }

    #[test]
    fn test_unsupported_encoder_and_policy_rejected() {
        let cfg = EncodeConfig { encoder: "elmo".into(), ..EncodeConfig::default() };
        assert!(matches!(cfg.validate(), Err(EncodeError::Configuration(_))));
        let cfg = EncodeConfig { merge_policy: "first".into(), ..EncodeConfig::default() };
        assert!(matches!(cfg.validate(), Err(EncodeError::Configuration(_))));
        let cfg = EncodeConfig { batch_size: 0, ..EncodeConfig::default() };
        assert!(matches!(cfg.validate(), Err(EncodeError::Configuration(_))));
        let cfg = EncodeConfig { layers: vec![], ..EncodeConfig::default() };
        assert!(matches!(cfg.validate(), Err(EncodeError::Configuration(_))));
    }

    #[test]
    fn test_round_trips_through_json() {
        let cfg = EncodeConfig { layers: vec![-1, 0], gpu: 2, ..EncodeConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(serde_json::from_str::<EncodeConfig>(&json).unwrap(), cfg);
    }
}
