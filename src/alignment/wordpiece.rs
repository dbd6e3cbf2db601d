// ============================================================
// Layer 4b — WORDPIECE merge
// ============================================================
// Folds continuation pieces ("##...") into the piece before them.
//
//   [CLS] un ##happy ##ness is [SEP]  →  unhappiness | is
//
// The scan starts right after [CLS] and stops before the trailing
// [SEP]. In a pair, the inner [SEP] is a unit of its own and is
// never merged with a neighbour, even if a continuation follows.

use crate::alignment::pooling::Run;
use crate::data::features::Feature;
use crate::domain::traits::SpecialTokens;

pub fn runs(feature: &Feature, special: &SpecialTokens) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    // Whether the open run may still absorb continuation pieces
    let mut open = false;

    for j in 1..feature.last_index() {
        let token = &feature.tokens[j];

        if Some(j) == feature.segment_boundary {
            runs.push(Run::single(j, token.clone()));
            open = false;
            continue;
        }

        match runs.last_mut() {
            Some(run) if open && special.is_continuation(token) => {
                run.end = j + 1;
                run.label.push_str(special.strip_continuation(token));
            }
            _ => {
                runs.push(Run::single(j, special.strip_continuation(token)));
                open = true;
            }
        }
    }

    runs
}
