// ============================================================
// Layer 4 - Train/Test Splitter
// ============================================================
// Shuffles samples with a seeded RNG and cuts them into:
//   - Training set: used to update model weights
//   - Test set:     held out for validation, evaluation and
//                   the confusion matrix
//
// The same seed and input always give the same partition, so
// `evaluate` and `export` can rebuild the exact test split a
// previous `train` run held out.
//
// Split size: floor(len * train_fraction) training samples,
// the remainder is the test set (default 75% / 25%).
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Seed used by the original experiment
pub const DEFAULT_SEED: u64 = 42;

/// Fraction of the dataset used for training
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.75;

/// Shuffle `samples` deterministically and split into (train, test).
pub fn split_train_test<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction.clamp(0.0, 1.0)).floor() as usize;
    let split_at = split_at.min(total);

    // samples = [0..split_at], test = [split_at..total]
    let test = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split (seed {}): {} train, {} test",
        seed,
        samples.len(),
        test.len(),
    );

    (samples, test)
}
