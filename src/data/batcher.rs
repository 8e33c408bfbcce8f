// ============================================================
// Layer 4 - Keypoint Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<KeypointSample>
// into tensors.
//
//   Input:  N samples, each 42 floats + 1 label
//   Output: features [N, 42] (Float), targets [N] (Int)
//
// Features are flattened row by row into one Vec<f32> and then
// reshaped:
//   [s1_f1, ..., s1_f42, s2_f1, ..., sN_f42] → [N, 42]
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::{KeypointSample, FEATURE_DIM};

// ─── KeypointBatch ────────────────────────────────────────────────────────────
/// A batch of samples ready for the forward pass.
#[derive(Debug, Clone)]
pub struct KeypointBatch<B: Backend> {
    /// Landmark features - shape: [batch_size, 42]
    pub features: Tensor<B, 2>,

    /// Ground truth class ids - shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── KeypointBatcher ──────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the right CPU/GPU.
#[derive(Clone, Debug)]
pub struct KeypointBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> KeypointBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Stack bare feature rows (no labels) into a [N, 42] tensor.
    pub fn features(&self, rows: &[[f32; FEATURE_DIM]]) -> Tensor<B, 2> {
        let flat: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([rows.len(), FEATURE_DIM])
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<KeypointSample, KeypointBatch<B>> for KeypointBatcher<B> {
    fn batch(&self, items: Vec<KeypointSample>) -> KeypointBatch<B> {
        let rows: Vec<[f32; FEATURE_DIM]> = items.iter().map(|s| s.features).collect();
        let features = self.features(&rows);

        // Burn Int tensors are built from i32 slices
        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();
        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        KeypointBatch { features, targets }
    }
}
