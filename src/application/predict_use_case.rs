// ============================================================
// Layer 2 - PredictUseCase
// ============================================================
// Classifies one hand pose with the quantized artifact.
// Input is either an already-normalized 42-float feature row
// or 21 raw landmark points, which are normalized first.

use anyhow::{Context, Result};
use std::path::Path;

use crate::data::loader::load_labels;
use crate::domain::{
    keypoint::LandmarkSet,
    labels::LabelMap,
    traits::{argmax, GestureClassifier},
};
use crate::quant::{format, QuantizedClassifier};

/// One classified row
#[derive(Debug, Clone)]
pub struct Prediction {
    pub class_id:      usize,
    pub name:          String,
    pub confidence:    f32,
    pub probabilities: Vec<f32>,
}

pub struct PredictUseCase {
    model:  QuantizedClassifier,
    labels: LabelMap,
}

impl PredictUseCase {
    pub fn new(quantized_path: &str, labels_path: &str) -> Result<Self> {
        let model = format::load(Path::new(quantized_path)).with_context(|| {
            format!("Cannot load quantized model '{quantized_path}'. Run 'train' or 'export' first")
        })?;
        let labels = load_labels(Path::new(labels_path))?;
        Ok(Self::from_parts(model, labels))
    }

    pub fn from_parts(model: QuantizedClassifier, labels: LabelMap) -> Self {
        Self { model, labels }
    }

    pub fn predict_features(&self, features: &[f32]) -> Result<Prediction> {
        let probabilities = self.model.probabilities(features)?;
        let class_id      = argmax(&probabilities);
        Ok(Prediction {
            class_id,
            name:       self.labels.name(class_id),
            confidence: probabilities.get(class_id).copied().unwrap_or(0.0),
            probabilities,
        })
    }

    /// Raw `x0,y0,...,x20,y20` landmark coordinates.
    pub fn predict_landmarks(&self, coords: &[f32]) -> Result<Prediction> {
        let features = LandmarkSet::from_flat(coords)?.normalize();
        self.predict_features(&features)
    }
}

/// Parse a comma-separated list of floats.
pub fn parse_floats(text: &str) -> Result<Vec<f32>> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f32>().with_context(|| format!("'{s}' is not a number")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::FEATURE_DIM;
    use crate::ml::{model::ClassifierConfig, Device, InnerBackend};

    fn use_case() -> PredictUseCase {
        let device = Device::default();
        let model = ClassifierConfig::new(3).init::<InnerBackend>(&device);
        PredictUseCase::from_parts(
            QuantizedClassifier::from_model(&model).unwrap(),
            LabelMap::new(vec!["Open".into(), "Close".into(), "Pointer".into()]),
        )
    }

    #[test]
    fn test_predict_features_names_the_class() {
        let p = use_case().predict_features(&[0.2; FEATURE_DIM]).unwrap();
        assert!(p.class_id < 3);
        assert_eq!(p.name, ["Open", "Close", "Pointer"][p.class_id]);
        assert_eq!(p.confidence, p.probabilities[p.class_id]);
    }

    #[test]
    fn test_landmarks_are_normalized_first() {
        let uc = use_case();
        // a pose and the same pose shifted and scaled classify identically
        let coords: Vec<f32> = (0..FEATURE_DIM).map(|i| (i * 7 % 13) as f32).collect();
        let moved: Vec<f32> = coords.iter().map(|c| c * 3.0 + 50.0).collect();

        let a = uc.predict_landmarks(&coords).unwrap();
        let b = uc.predict_landmarks(&moved).unwrap();
        assert_eq!(a.class_id, b.class_id);
        assert!(uc.predict_landmarks(&coords[..10]).is_err());
    }

    #[test]
    fn test_parse_floats() {
        assert_eq!(parse_floats("1, -2.5,3").unwrap(), vec![1.0, -2.5, 3.0]);
        assert!(parse_floats("1,x").is_err());
    }
}
