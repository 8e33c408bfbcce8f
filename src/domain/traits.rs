// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits, not to the
// concrete CSV loader or to a particular model representation.
//
//   SampleSource       <- CsvDatasetLoader
//   GestureClassifier  <- Inferencer (float Burn model)
//                      <- QuantizedClassifier (int8 export)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::sample::KeypointSample;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can produce labelled keypoint samples.
pub trait SampleSource {
    /// Load every sample this source holds.
    fn load_all(&self) -> Result<Vec<KeypointSample>>;
}

// ─── GestureClassifier ────────────────────────────────────────────────────────
/// Anything that maps one 42-float feature row to class probabilities.
pub trait GestureClassifier {
    /// Softmax probabilities, one per class
    fn probabilities(&self, features: &[f32]) -> Result<Vec<f32>>;

    /// Most likely class id
    fn classify(&self, features: &[f32]) -> Result<usize> {
        Ok(argmax(&self.probabilities(features)?))
    }
}

/// Index of the largest value; the first one wins on ties.
/// Returns 0 for an empty slice.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_first_max() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
