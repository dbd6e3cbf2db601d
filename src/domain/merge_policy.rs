// ============================================================
// Layer 3 — Merge Policy
// ============================================================
// Which output unit a sentence's vectors are indexed by:
//   raw              one vector per subword token
//   wordpiece        "##" continuations folded into their head piece
//   as_input_tokens  one vector per whitespace-delimited input word

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::EncodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    Raw,
    #[default]
    Wordpiece,
    AsInputTokens,
}

impl MergePolicy {
    pub const ALL: [MergePolicy; 3] = [Self::Raw, Self::Wordpiece, Self::AsInputTokens];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw           => "raw",
            Self::Wordpiece     => "wordpiece",
            Self::AsInputTokens => "as_input_tokens",
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergePolicy {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| EncodeError::configuration(format!(
                "unsupported merge policy '{s}' (expected raw, wordpiece or as_input_tokens)"
            )))
    }
}
