// ─── Float vs int8 parity ─────────────────────────────────────────────────────
use std::fmt;

use anyhow::Result;

use crate::domain::traits::{argmax, GestureClassifier};

/// Both models' answers for one feature row.
#[derive(Debug, Clone)]
pub struct ParityReport {
    pub float_probs:     Vec<f32>,
    pub quantized_probs: Vec<f32>,
    pub float_class:     usize,
    pub quantized_class: usize,
    pub max_abs_diff:    f32,
}

impl ParityReport {
    pub fn compare(
        float:     &dyn GestureClassifier,
        quantized: &dyn GestureClassifier,
        features:  &[f32],
    ) -> Result<Self> {
        let float_probs     = float.probabilities(features)?;
        let quantized_probs = quantized.probabilities(features)?;

        let max_abs_diff = float_probs
            .iter()
            .zip(&quantized_probs)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);

        Ok(Self {
            float_class:     argmax(&float_probs),
            quantized_class: argmax(&quantized_probs),
            float_probs,
            quantized_probs,
            max_abs_diff,
        })
    }

    pub fn agrees(&self) -> bool {
        self.float_class == self.quantized_class
    }
}

fn fmt_probs(probs: &[f32]) -> String {
    let items: Vec<String> = probs.iter().map(|p| format!("{p:.4}")).collect();
    format!("[{}]", items.join(", "))
}

impl fmt::Display for ParityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "float     {} -> {}", fmt_probs(&self.float_probs), self.float_class)?;
        writeln!(f, "quantized {} -> {}", fmt_probs(&self.quantized_probs), self.quantized_class)?;
        write!(
            f,
            "max |diff| = {:.6}, argmax {}",
            self.max_abs_diff,
            if self.agrees() { "matches" } else { "DIFFERS" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f32>);

    impl GestureClassifier for Fixed {
        fn probabilities(&self, _features: &[f32]) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_parity_reports_diff_and_agreement() {
        let a = Fixed(vec![0.1, 0.7, 0.2]);
        let b = Fixed(vec![0.15, 0.6, 0.25]);
        let report = ParityReport::compare(&a, &b, &[]).unwrap();

        assert!(report.agrees());
        assert_eq!(report.float_class, 1);
        assert!((report.max_abs_diff - 0.1).abs() < 1e-6);
        assert!(report.to_string().contains("matches"));
    }

    #[test]
    fn test_parity_flags_disagreement() {
        let report =
            ParityReport::compare(&Fixed(vec![0.6, 0.4]), &Fixed(vec![0.4, 0.6]), &[]).unwrap();
        assert!(!report.agrees());
        assert_eq!(report.quantized_class, 1);
    }
}
