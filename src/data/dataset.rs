use burn::data::dataset::Dataset;

use crate::domain::sample::KeypointSample;

/// In-memory keypoint samples behind Burn's Dataset trait,
/// so a DataLoader can index and shuffle them.
pub struct KeypointDataset {
    samples: Vec<KeypointSample>,
}

impl KeypointDataset {
    pub fn new(samples: Vec<KeypointSample>) -> Self { Self { samples } }

    pub fn samples(&self) -> &[KeypointSample] { &self.samples }
}

impl Dataset<KeypointSample> for KeypointDataset {
    fn get(&self, index: usize) -> Option<KeypointSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
