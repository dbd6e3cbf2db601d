// ============================================================
// Layer 4b — AS_INPUT_TOKENS realignment
// ============================================================
// Maps subword pieces back onto the caller's own whitespace words,
// so a tokenizer's [UNK] handling or normalisation can never make
// the output disagree with the input word boundaries unnoticed.
//
// The scan walks the target words and the piece stream together,
// starting after [CLS]:
//
//   target "York"  → normalised "york"
//   pieces  yo ##rk → spelled "yo", then "york" == target → close run
//
// While spelling:
//   - continuation prefixes are stripped
//   - the inner [SEP] of a pair reads as "|||" (the pair marker word)
//   - [UNK] reads as some non-empty part of the target word, shortest
//     first, so "😀," as [UNK] "," leaves the comma for the next piece
//
// [UNK] is the only ambiguous piece. The scan backtracks over its
// choices, remembering (word, position, matched bytes) states that
// cannot lead to a full alignment, so each state is tried once.
//
// After the last word the scan must sit exactly on the trailing
// [SEP]. If no choice of [UNK] spans gets there, the sentence is an
// AlignmentMismatch and is never emitted.

use anyhow::Result;
use std::collections::HashSet;

use crate::alignment::pooling::Run;
use crate::data::features::Feature;
use crate::domain::{
    error::EncodeError,
    example::SEGMENT_MARKER,
    traits::{SpecialTokens, SubwordTokenizer},
};

pub fn runs(feature: &Feature, tokenizer: &dyn SubwordTokenizer) -> Result<Vec<Run>> {
    let sentence = feature.example.text.as_str();
    let words    = feature.example.words();

    let mut targets = Vec::with_capacity(words.len());
    for &word in &words {
        let target = if word == SEGMENT_MARKER && feature.example.is_pair() {
            SEGMENT_MARKER.to_string()
        } else {
            tokenizer.normalize(word)?
        };
        if target.is_empty() {
            return Err(EncodeError::mismatch(
                sentence,
                format!("word {word:?} normalises to nothing"),
            )
            .into());
        }
        targets.push(target);
    }

    let mut scan = Scan {
        feature,
        special:  tokenizer.special_tokens(),
        targets:  &targets,
        last:     feature.last_index(),
        ends:     Vec::with_capacity(words.len()),
        dead:     HashSet::new(),
        furthest: (0, 1),
    };

    if !scan.word(0, 1, 0) {
        return Err(EncodeError::mismatch(sentence, scan.failure(&words)).into());
    }

    let mut start = 1usize;
    let runs = words
        .iter()
        .zip(&scan.ends)
        .map(|(word, &end)| {
            let run = Run { start, end, label: word.to_string() };
            start = end;
            run
        })
        .collect();
    Ok(runs)
}

struct Scan<'f> {
    feature: &'f Feature,
    special: &'f SpecialTokens,
    targets: &'f [String],
    last:    usize,
    /// End position of each closed word, in order
    ends:    Vec<usize>,
    dead:    HashSet<(usize, usize, usize)>,
    /// (word, position) of the deepest state reached
    furthest: (usize, usize),
}

impl<'f> Scan<'f> {
    /// Align word `w` onwards, with `matched` bytes of word `w` already
    /// spelled by the pieces before `pos`.
    fn word(&mut self, w: usize, pos: usize, matched: usize) -> bool {
        let (feature, special, targets) = (self.feature, self.special, self.targets);
        if w == targets.len() {
            self.reach(w, pos);
            return pos == self.last;
        }
        let target = targets[w].as_str();
        if matched == target.len() {
            self.ends.push(pos);
            if self.word(w + 1, pos, 0) {
                return true;
            }
            self.ends.pop();
            return false;
        }
        self.reach(w, pos);
        if pos >= self.last || self.dead.contains(&(w, pos, matched)) {
            return false;
        }

        let rest  = &target[matched..];
        let token = feature.tokens[pos].as_str();
        let found = if Some(pos) == feature.segment_boundary {
            rest.starts_with(SEGMENT_MARKER) && self.word(w, pos + 1, matched + SEGMENT_MARKER.len())
        } else if token == special.unk {
            let spans: Vec<usize> = rest
                .char_indices()
                .skip(1)
                .map(|(i, _)| i)
                .chain(std::iter::once(rest.len()))
                .collect();
            spans.into_iter().any(|span| self.word(w, pos + 1, matched + span))
        } else {
            let piece = special.strip_continuation(token);
            rest.starts_with(piece) && self.word(w, pos + 1, matched + piece.len())
        };

        if !found {
            self.dead.insert((w, pos, matched));
        }
        found
    }

    fn reach(&mut self, w: usize, pos: usize) {
        if (w, pos) > self.furthest {
            self.furthest = (w, pos);
        }
    }

    fn failure(&self, words: &[&str]) -> String {
        let (w, pos) = self.furthest;
        match words.get(w) {
            None => format!(
                "pieces left over after the last word: scan stopped at position {pos} \
                 but the trailing separator is at {}",
                self.last
            ),
            Some(word) if pos >= self.last => {
                format!("pieces ran out while matching word {word:?}")
            }
            Some(word) => format!(
                "pieces from position {pos} ({:?}) do not spell word {word:?} ({:?})",
                self.feature.tokens[pos], self.targets[w]
            ),
        }
    }
}
