// ============================================================
// Layer 5 - Inferencer
// ============================================================
use anyhow::{anyhow, ensure, Result};
use burn::prelude::*;

use crate::domain::sample::FEATURE_DIM;
use crate::domain::traits::GestureClassifier;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::KeypointClassifier;
use crate::ml::{Device, InnerBackend};

/// Float model loaded from disk for single-row inference.
pub struct Inferencer {
    model:  KeypointClassifier<InnerBackend>,
    device: Device,
}

impl Inferencer {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device = Device::default();
        let model  = ckpt_manager.load_model::<InnerBackend>(&device)?;
        tracing::info!("Model loaded from '{}'", ckpt_manager.dir().display());
        Ok(Self { model, device })
    }

    pub fn new(model: KeypointClassifier<InnerBackend>, device: Device) -> Self {
        Self { model, device }
    }

    pub fn model(&self) -> &KeypointClassifier<InnerBackend> {
        &self.model
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl GestureClassifier for Inferencer {
    fn probabilities(&self, features: &[f32]) -> Result<Vec<f32>> {
        ensure!(
            features.len() == FEATURE_DIM,
            "expected {} features, got {}",
            FEATURE_DIM,
            features.len()
        );

        let input = Tensor::<InnerBackend, 1>::from_floats(features, &self.device)
            .unsqueeze::<2>();

        self.model
            .forward_probs(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read probabilities: {e:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::argmax;
    use crate::ml::model::ClassifierConfig;

    #[test]
    fn test_probabilities_sum_to_one() {
        let device = Device::default();
        let inferencer = Inferencer::new(ClassifierConfig::new(6).init(&device), device);

        let probs = inferencer.probabilities(&[0.1; FEATURE_DIM]).unwrap();
        assert_eq!(probs.len(), 6);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert_eq!(inferencer.classify(&[0.1; FEATURE_DIM]).unwrap(), argmax(&probs));
    }

    #[test]
    fn test_rejects_wrong_width() {
        let device = Device::default();
        let inferencer = Inferencer::new(ClassifierConfig::new(3).init(&device), device);
        assert!(inferencer.probabilities(&[0.0; 10]).is_err());
    }
}
