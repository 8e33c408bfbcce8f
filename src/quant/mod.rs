// ============================================================
// Layer 5b - Quantized Inference Model
// ============================================================
// Converts the trained Burn classifier into a compact,
// dependency-free inference graph:
//
//   dense(42→20, relu) → dense(20→10, relu) → dense(10→C, softmax)
//
// Dropout layers disappear (they are identity at inference).
// Each dense layer keeps
//   - i8 weights, row-major [in_dim, out_dim]
//   - one f32 scale per output channel
//   - f32 bias
// and runs through the hybrid int8 kernel in `kernel.rs`.
//
// On disk the graph is a small binary file; see `format.rs`.

pub mod format;
pub mod kernel;
pub mod parity;

use anyhow::{anyhow, ensure, Result};
use burn::{nn::Linear, prelude::*};
use serde::{Deserialize, Serialize};

use crate::domain::traits::GestureClassifier;
use crate::ml::model::KeypointClassifier;

pub use format::QuantError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Softmax,
}

/// One int8 fully-connected layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedDense {
    pub in_dim:     usize,
    pub out_dim:    usize,
    pub weights:    Vec<i8>,
    pub scales:     Vec<f32>,
    pub bias:       Vec<f32>,
    pub activation: Activation,
}

impl QuantizedDense {
    /// Quantize a float `[in_dim, out_dim]` weight matrix.
    pub fn from_float(
        weights:    &[f32],
        bias:       Vec<f32>,
        in_dim:     usize,
        out_dim:    usize,
        activation: Activation,
    ) -> Self {
        let (weights, scales) = kernel::quantize_per_channel(weights, in_dim, out_dim);
        Self { in_dim, out_dim, weights, scales, bias, activation }
    }

    fn from_linear<B: Backend>(layer: &Linear<B>, activation: Activation) -> Result<Self> {
        let [in_dim, out_dim] = layer.weight.dims();
        let weights: Vec<f32> = layer
            .weight
            .val()
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read layer weights: {e:?}"))?;

        let bias = match &layer.bias {
            Some(b) => b
                .val()
                .into_data()
                .convert::<f32>()
                .to_vec()
                .map_err(|e| anyhow!("Cannot read layer bias: {e:?}"))?,
            None => vec![0.0; out_dim],
        };

        Ok(Self::from_float(&weights, bias, in_dim, out_dim, activation))
    }

    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut out = kernel::hybrid_dense(input, &self.weights, &self.scales, &self.bias, self.out_dim);
        match self.activation {
            Activation::Relu    => kernel::relu_in_place(&mut out),
            Activation::Softmax => kernel::softmax_in_place(&mut out),
        }
        out
    }

    /// Shapes of the stored vectors agree with the declared dims.
    pub fn check_shapes(&self) -> std::result::Result<(), String> {
        if self.weights.len() != self.in_dim * self.out_dim {
            return Err(format!(
                "{} weights for a {}x{} layer",
                self.weights.len(),
                self.in_dim,
                self.out_dim
            ));
        }
        if self.scales.len() != self.out_dim || self.bias.len() != self.out_dim {
            return Err(format!(
                "{} scales / {} biases for {} outputs",
                self.scales.len(),
                self.bias.len(),
                self.out_dim
            ));
        }
        Ok(())
    }
}

/// The exported int8 classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedClassifier {
    pub layers: Vec<QuantizedDense>,
}

impl QuantizedClassifier {
    /// Quantize every dense layer of a trained model.
    pub fn from_model<B: Backend>(model: &KeypointClassifier<B>) -> Result<Self> {
        let [dense_1, dense_2, output] = model.dense_layers();
        let layers = vec![
            QuantizedDense::from_linear(dense_1, Activation::Relu)?,
            QuantizedDense::from_linear(dense_2, Activation::Relu)?,
            QuantizedDense::from_linear(output, Activation::Softmax)?,
        ];

        let quantized = Self { layers };
        quantized.validate().map_err(|e| anyhow!("{e}"))?;
        tracing::info!(
            "Quantized {} dense layers ({} -> {} classes, {} params)",
            quantized.layers.len(),
            quantized.input_dim(),
            quantized.num_classes(),
            quantized.param_count()
        );
        Ok(quantized)
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, |l| l.in_dim)
    }

    pub fn num_classes(&self) -> usize {
        self.layers.last().map_or(0, |l| l.out_dim)
    }

    /// Number of stored weight and bias values
    pub fn param_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len() + l.bias.len()).sum()
    }

    /// Layer shapes chain and every layer is internally consistent.
    pub fn validate(&self) -> std::result::Result<(), QuantError> {
        if self.layers.is_empty() {
            return Err(QuantError::Shape { layer: 0, detail: "no layers".into() });
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer
                .check_shapes()
                .map_err(|detail| QuantError::Shape { layer: i, detail })?;
            if i > 0 && self.layers[i - 1].out_dim != layer.in_dim {
                return Err(QuantError::Shape {
                    layer:  i,
                    detail: format!(
                        "expects {} inputs but previous layer has {} outputs",
                        layer.in_dim,
                        self.layers[i - 1].out_dim
                    ),
                });
            }
        }
        Ok(())
    }

    /// Class probabilities for one feature row.
    pub fn predict(&self, features: &[f32]) -> Result<Vec<f32>> {
        ensure!(
            features.len() == self.input_dim(),
            "expected {} features, got {}",
            self.input_dim(),
            features.len()
        );

        let mut x = features.to_vec();
        for layer in &self.layers {
            x = layer.forward(&x);
        }
        Ok(x)
    }
}

impl GestureClassifier for QuantizedClassifier {
    fn probabilities(&self, features: &[f32]) -> Result<Vec<f32>> {
        self.predict(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::FEATURE_DIM;
    use crate::ml::{inferencer::Inferencer, model::ClassifierConfig, Device};
    use crate::test_support::synthetic_samples;

    #[test]
    fn test_from_model_shapes() {
        let device = Device::default();
        let model = ClassifierConfig::new(26).init::<crate::ml::InnerBackend>(&device);
        let q = QuantizedClassifier::from_model(&model).unwrap();

        assert_eq!(q.layers.len(), 3);
        assert_eq!(q.input_dim(), FEATURE_DIM);
        assert_eq!(q.num_classes(), 26);
        assert_eq!(q.param_count(), 1356);
        assert_eq!(q.layers[2].activation, Activation::Softmax);
    }

    #[test]
    fn test_quantized_close_to_float_model() {
        let device = Device::default();
        let model = ClassifierConfig::new(4).init::<crate::ml::InnerBackend>(&device);
        let q = QuantizedClassifier::from_model(&model).unwrap();
        let float = Inferencer::new(model, device);

        for sample in synthetic_samples(8, 4, 9) {
            let a = float.probabilities(&sample.features).unwrap();
            let b = q.probabilities(&sample.features).unwrap();
            let max_diff = a.iter().zip(&b).map(|(x, y)| (x - y).abs()).fold(0.0f32, f32::max);
            assert!(max_diff < 0.05, "max diff {max_diff}");
            assert!((b.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_validate_rejects_broken_chain() {
        let a = QuantizedDense::from_float(&[0.1; 6], vec![0.0; 3], 2, 3, Activation::Relu);
        let b = QuantizedDense::from_float(&[0.1; 8], vec![0.0; 2], 4, 2, Activation::Softmax);
        let q = QuantizedClassifier { layers: vec![a, b] };
        assert!(matches!(q.validate(), Err(QuantError::Shape { layer: 1, .. })));
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let layer = QuantizedDense::from_float(&[0.1; 6], vec![0.0; 3], 2, 3, Activation::Softmax);
        let q = QuantizedClassifier { layers: vec![layer] };
        assert!(q.predict(&[1.0]).is_err());
        assert_eq!(q.predict(&[1.0, 2.0]).unwrap().len(), 3);
    }
}
