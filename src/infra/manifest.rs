// ============================================================
// Layer 6 — Run Manifest
// ============================================================
// After a successful run a JSON file is written next to the
// output archive (out.npz → out.npz.json) recording what was
// produced and with which settings, so a consumer knows the
// meaning of the layer axis without the command line. It is
// removed before a run overwrites the archive, so it only ever
// exists for a complete output.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::config::EncodeConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub config:          EncodeConfig,
    /// Absolute hidden-state index of each entry on the layer axis
    pub resolved_layers: Vec<usize>,
    pub hidden_size:     usize,
    pub sentences:       usize,
}

impl RunManifest {
    pub fn path_for(output: &Path) -> PathBuf {
        let mut name = output.as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    }

    pub fn save(&self, output: &Path) -> Result<PathBuf> {
        let path = Self::path_for(output);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write manifest '{}'", path.display()))?;
        tracing::debug!("Saved run manifest to '{}'", path.display());
        Ok(path)
    }

    pub fn load(output: &Path) -> Result<Self> {
        let path = Self::path_for(output);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read manifest '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Delete the manifest for `output`. A missing file is fine.
    pub fn remove(output: &Path) -> Result<()> {
        let path = Self::path_for(output);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed stale manifest '{}'", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Cannot remove manifest '{}'", path.display()))),
        }
    }
}
