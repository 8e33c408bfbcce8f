//! Synthetic keypoint data shared by unit tests.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::sample::{KeypointSample, FEATURE_DIM};

/// Linearly separable samples: features whose index is congruent
/// to the label are high, the rest low, plus a little noise.
/// Labels cycle 0, 1, ..., num_classes - 1.
pub fn synthetic_samples(n: usize, num_classes: usize, seed: u64) -> Vec<KeypointSample> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let label = i % num_classes;
            let mut features = [0.0f32; FEATURE_DIM];
            for (j, f) in features.iter_mut().enumerate() {
                let center = if j % num_classes == label { 0.8 } else { -0.2 };
                *f = center + rng.gen_range(-0.05..0.05);
            }
            KeypointSample::new(label, features)
        })
        .collect()
}
