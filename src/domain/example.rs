// ============================================================
// Layer 3 — Example (one input line)
// ============================================================
// A line is either a single sentence or a sentence pair written
// as "<A> ||| <B>". The pair rule mirrors a greedy regex: the
// split happens at the LAST " ||| " in the line, so text_a may
// itself contain the delimiter.
//
// The word list is what AS_INPUT_TOKENS realigns against. For a
// pair it is the words of A, the "|||" marker, then the words of
// B, which is exactly what splitting the raw line on whitespace
// yields.

use serde::{Deserialize, Serialize};

/// Delimiter between the two segments of a pair line.
pub const PAIR_DELIMITER: &str = " ||| ";

/// Label standing in for the inter-segment separator.
pub const SEGMENT_MARKER: &str = "|||";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// The stripped input line
    pub text: String,

    /// First (or only) segment
    pub text_a: String,

    /// Second segment of a pair. Kept even when empty so that
    /// sentence ids never drift away from input lines.
    pub text_b: Option<String>,
}

impl Example {
    /// Parse one input line. Leading/trailing whitespace is stripped first.
    pub fn parse(line: &str) -> Self {
        let text = line.trim().to_string();
        match text.rsplit_once(PAIR_DELIMITER) {
            Some((a, b)) => Self {
                text_a: a.to_string(),
                text_b: Some(b.to_string()),
                text,
            },
            None => Self {
                text_a: text.clone(),
                text_b: None,
                text,
            },
        }
    }

    pub fn is_pair(&self) -> bool {
        self.text_b.is_some()
    }

    /// Whitespace-delimited words, with the segment marker between pair halves.
    pub fn words(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.text_a.split_whitespace().collect();
        if let Some(b) = &self.text_b {
            words.push(SEGMENT_MARKER);
            words.extend(b.split_whitespace());
        }
        words
    }
}
