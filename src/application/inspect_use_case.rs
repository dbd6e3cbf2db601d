// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Reads back an archive produced by `encode` and reports the
// (layers, units, hidden) shape of one sentence, together with
// the manifest that describes it when one is present.

use anyhow::Result;
use std::path::PathBuf;

use crate::infra::{manifest::RunManifest, sink::NpzStore};

#[derive(Debug, Clone, PartialEq)]
pub struct SentenceReport {
    pub sentence_id: usize,
    pub total:       usize,
    pub shape:       (usize, usize, usize),
    /// Mean of every value, a cheap fingerprint for comparing runs
    pub mean:        f32,
    pub layers:      Option<Vec<usize>>,
}

pub struct InspectUseCase {
    archive: PathBuf,
}

impl InspectUseCase {
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self { archive: archive.into() }
    }

    pub fn execute(&self, sentence_id: usize) -> Result<SentenceReport> {
        let mut store = NpzStore::open(&self.archive)?;
        let total     = store.len()?;
        let array     = store.get(sentence_id)?;

        let manifest = match RunManifest::load(&self.archive) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::debug!("No manifest for '{}': {e:#}", self.archive.display());
                None
            }
        };

        Ok(SentenceReport {
            sentence_id,
            total,
            shape: array.dim(),
            mean:  array.mean().unwrap_or(0.0),
            layers: manifest.map(|m| m.resolved_layers),
        })
    }
}
