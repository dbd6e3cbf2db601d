use crate::alignment::pooling::Run;
use crate::data::features::Feature;

/// One unit per subword token between [CLS] and the trailing [SEP].
pub fn runs(feature: &Feature) -> Vec<Run> {
    (1..feature.last_index())
        .map(|j| Run::single(j, feature.tokens[j].clone()))
        .collect()
}
