use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{relu, softmax},
};

use crate::domain::sample::FEATURE_DIM;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally - do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub num_classes: usize,
    #[config(default = 42)]
    pub input_dim: usize,
    #[config(default = 20)]
    pub hidden_1: usize,
    #[config(default = 10)]
    pub hidden_2: usize,
    #[config(default = 0.2)]
    pub input_dropout: f64,
    #[config(default = 0.4)]
    pub hidden_dropout: f64,
}

impl ClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> KeypointClassifier<B> {
        debug_assert_eq!(self.input_dim, FEATURE_DIM);
        KeypointClassifier {
            input_dropout:  DropoutConfig::new(self.input_dropout).init(),
            dense_1:        LinearConfig::new(self.input_dim, self.hidden_1).init(device),
            hidden_dropout: DropoutConfig::new(self.hidden_dropout).init(),
            dense_2:        LinearConfig::new(self.hidden_1, self.hidden_2).init(device),
            output:         LinearConfig::new(self.hidden_2, self.num_classes).init(device),
        }
    }

    /// Human-readable layer table, like Keras' `model.summary()`.
    pub fn summary(&self) -> String {
        let rows = [
            ("input",     format!("[-1, {}]", self.input_dim), 0),
            ("dropout",   format!("[-1, {}]", self.input_dim), 0),
            ("dense_1",   format!("[-1, {}]", self.hidden_1),
                self.input_dim * self.hidden_1 + self.hidden_1),
            ("dropout_1", format!("[-1, {}]", self.hidden_1), 0),
            ("dense_2",   format!("[-1, {}]", self.hidden_2),
                self.hidden_1 * self.hidden_2 + self.hidden_2),
            ("output",    format!("[-1, {}]", self.num_classes),
                self.hidden_2 * self.num_classes + self.num_classes),
        ];

        let mut out = format!("{:<12}{:<14}{:>8}\n", "Layer", "Output", "Params");
        let mut total = 0;
        for (name, shape, params) in rows {
            out.push_str(&format!("{:<12}{:<14}{:>8}\n", name, shape, params));
            total += params;
        }
        out.push_str(&format!("Total params: {}", total));
        out
    }
}

#[derive(Module, Debug)]
pub struct KeypointClassifier<B: Backend> {
    pub input_dropout:  Dropout,
    pub dense_1:        Linear<B>,
    pub hidden_dropout: Dropout,
    pub dense_2:        Linear<B>,
    pub output:         Linear<B>,
}

impl<B: Backend> KeypointClassifier<B> {
    /// features: [batch, 42] → logits: [batch, num_classes]
    ///
    /// Dropout only fires on autodiff backends, so `model.valid()`
    /// and inference models run deterministically.
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.input_dropout.forward(features);
        let x = relu(self.dense_1.forward(x));
        let x = self.hidden_dropout.forward(x);
        let x = relu(self.dense_2.forward(x));
        self.output.forward(x)
    }

    /// Softmax class probabilities, [batch, num_classes]
    pub fn forward_probs(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.forward(features), 1)
    }

    /// Sparse categorical cross-entropy over integer class targets.
    /// Returns (mean loss, logits).
    pub fn forward_classification(
        &self,
        features: Tensor<B, 2>,
        targets:  Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(features);
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }

    /// Dense layers in forward order, for export.
    pub fn dense_layers(&self) -> [&Linear<B>; 3] {
        [&self.dense_1, &self.dense_2, &self.output]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn test_defaults_match_topology() {
        let cfg = ClassifierConfig::new(26);
        assert_eq!(cfg.input_dim, 42);
        assert_eq!(cfg.hidden_1, 20);
        assert_eq!(cfg.hidden_2, 10);
        assert_eq!(cfg.input_dropout, 0.2);
        assert_eq!(cfg.hidden_dropout, 0.4);
    }

    #[test]
    fn test_output_shape_and_probabilities() {
        let device = Default::default();
        let model: KeypointClassifier<B> = ClassifierConfig::new(5).init(&device);
        let x = Tensor::<B, 2>::ones([3, FEATURE_DIM], &device);

        assert_eq!(model.forward(x.clone()).dims(), [3, 5]);

        let probs: Vec<f32> = model.forward_probs(x).into_data().to_vec().unwrap();
        for row in probs.chunks(5) {
            assert_relative_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_loss_is_finite_scalar() {
        let device = Default::default();
        let model: KeypointClassifier<B> = ClassifierConfig::new(4).init(&device);
        let x = Tensor::<B, 2>::zeros([2, FEATURE_DIM], &device);
        let y = Tensor::<B, 1, Int>::from_ints([0, 3], &device);

        let (loss, logits) = model.forward_classification(x, y);
        assert_eq!(logits.dims(), [2, 4]);
        let loss: f32 = loss.into_scalar().elem();
        assert!(loss.is_finite() && loss > 0.0);
    }

    #[test]
    fn test_summary_counts_params() {
        let text = ClassifierConfig::new(26).summary();
        // 42*20+20 + 20*10+10 + 10*26+26
        assert!(text.ends_with("Total params: 1356"));
    }
}
