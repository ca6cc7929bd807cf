use crate::error::{NnError, Result};
use crate::math::tensor::Tensor;

/// Class probabilities and the chosen class for each example of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// `[N, C]`, each row a distribution over classes.
    pub probabilities: Tensor,
    pub classes: Vec<usize>,
}

/// Softmax over the class dimension of `[N, C]` logits, then argmax per row.
pub fn predict(logits: &Tensor) -> Result<Prediction> {
    if logits.ndim() != 2 {
        return Err(NnError::RankMismatch {
            op: "predict".to_string(),
            expected: 2,
            got: logits.shape().to_vec(),
        });
    }
    let probabilities = logits.softmax(1)?;
    let classes = probabilities.argmax(1)?;
    Ok(Prediction { probabilities, classes })
}
